//! Edit Session
//!
//! Drives one open editor: dispatches actions into the store and runs the
//! save round trip. A save is split into [`EditorSession::begin_save`] and
//! [`EditorSession::finish_save`] so edits can keep arriving while the
//! request is in flight.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::commands::ClientError;
use crate::models::{EditorModel, SaveRequest, SaveSuccess};
use crate::store::{reduce, EditAction, EditState};

/// Sends a save request to the server
#[async_trait]
pub trait SaveTransport: Send + Sync {
    async fn save(&self, save_uri: &str, request: &SaveRequest) -> Result<SaveSuccess, ClientError>;
}

/// A submitted save awaiting its answer
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub save_uri: String,
    pub request: SaveRequest,
}

pub struct EditorSession<T> {
    transport: T,
    state: EditState,
}

impl<T: SaveTransport> EditorSession<T> {
    pub fn new(transport: T, model: EditorModel) -> Self {
        Self {
            transport,
            state: EditState::from_model(model),
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn dispatch(&mut self, action: EditAction) {
        self.state = reduce(&self.state, action);
    }

    /// Snapshot the recipe for saving and mark the session as saving
    pub fn begin_save(&mut self) -> Result<PendingSave, ClientError> {
        if self.state.saving {
            return Err(ClientError::SaveInFlight);
        }

        if let Some(issue) = self.state.invalid_entries().first() {
            return Err(ClientError::Invalid(issue.to_string()));
        }
        self.dispatch(EditAction::BeginSave);

        Ok(PendingSave {
            save_uri: self.state.save_uri.clone(),
            request: SaveRequest {
                recipe: self.state.recipe.clone(),
                save_key: self.state.save_key.clone(),
            },
        })
    }

    /// Send a pending save
    pub async fn send(&self, pending: &PendingSave) -> Result<SaveSuccess, ClientError> {
        self.transport.save(&pending.save_uri, &pending.request).await
    }

    /// Fold the server's answer into the current state. A failure is
    /// recorded in the state and handed back.
    pub fn finish_save(
        &mut self,
        pending: PendingSave,
        result: Result<SaveSuccess, ClientError>,
    ) -> Result<(), ClientError> {
        match result {
            Ok(success) => {
                info!(
                    recipe_id = pending.request.recipe.id,
                    minted = success.mapped_ingredients.len() + success.mapped_directions.len(),
                    "recipe saved"
                );
                self.dispatch(EditAction::SaveSucceeded {
                    requested: pending.request.recipe,
                    success,
                });
                Ok(())
            }
            Err(e) => {
                warn!(recipe_id = pending.request.recipe.id, error = %e, "save failed");
                self.dispatch(EditAction::SaveFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Full round trip with no edits in between
    pub async fn save(&mut self) -> Result<(), ClientError> {
        let pending = self.begin_save()?;
        let result = self.send(&pending).await;
        self.finish_save(pending, result)
    }
}
