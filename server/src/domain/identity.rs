//! Identity
//!
//! Who is asking and what they may do. Authentication happens upstream; this
//! layer only resolves a user id against the configured user directory.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create recipes and edit your own
    EditRecipe,
    /// Create recipes and edit anyone's; overrides `EditRecipe`
    EditAnyRecipe,
    /// Bypass the per-owner recipe cap
    UnlimitedRecipes,
}

/// A configured user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

pub trait Identity: Send + Sync {
    fn current_user_id(&self) -> Option<i64>;

    fn is_logged_in(&self) -> bool {
        self.current_user_id().is_some()
    }

    fn user_has_capability(&self, capability: Capability) -> bool;

    fn username_for(&self, uid: i64) -> String;
}

pub fn can_create_recipe(identity: &dyn Identity) -> bool {
    identity.user_has_capability(Capability::EditRecipe)
        || identity.user_has_capability(Capability::EditAnyRecipe)
}

pub fn can_edit_recipe(identity: &dyn Identity, owner_uid: i64) -> bool {
    if identity.user_has_capability(Capability::EditAnyRecipe) {
        return true;
    }
    if !identity.user_has_capability(Capability::EditRecipe) {
        return false;
    }
    identity.current_user_id() == Some(owner_uid)
}

/// Known users by id
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<i64, User>,
}

impl UserDirectory {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }

    pub fn get(&self, uid: i64) -> Option<&User> {
        self.users.get(&uid)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Identity of one request
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    directory: Arc<UserDirectory>,
    uid: Option<i64>,
}

impl RequestIdentity {
    /// Resolve a claimed user id. Ids missing from the directory are anonymous.
    pub fn resolve(directory: Arc<UserDirectory>, claimed: Option<i64>) -> Self {
        let uid = claimed.filter(|id| directory.get(*id).is_some());
        Self { directory, uid }
    }

    pub fn anonymous(directory: Arc<UserDirectory>) -> Self {
        Self { directory, uid: None }
    }
}

impl Identity for RequestIdentity {
    fn current_user_id(&self) -> Option<i64> {
        self.uid
    }

    fn user_has_capability(&self, capability: Capability) -> bool {
        self.uid
            .and_then(|uid| self.directory.get(uid))
            .map(|user| user.capabilities.contains(&capability))
            .unwrap_or(false)
    }

    fn username_for(&self, uid: i64) -> String {
        match self.directory.get(uid) {
            Some(user) => user.name.clone(),
            None => format!("user #{}", uid),
        }
    }
}
