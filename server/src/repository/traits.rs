//! Repository Layer - Core Traits
//!
//! The narrow storage interface the recipe commands consume.
//! Implementations can use SQLite, in-memory, etc.

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::domain::{CommitOutcome, DomainResult, Recipe, SavePlan};

/// Held store-wide write lock; released on drop
pub struct StoreGuard {
    _guard: OwnedMutexGuard<()>,
}

impl StoreGuard {
    pub fn new(guard: OwnedMutexGuard<()>) -> Self {
        Self { _guard: guard }
    }
}

/// Recipe storage
///
/// Mutating commands hold the guard from [`RecipeStore::lock`] across their
/// whole load, validate and write sequence.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Create a recipe with defaults and one blank ingredient and direction
    async fn create_row(&self, owner_uid: i64) -> DomainResult<i64>;

    /// Load a recipe with its lists in display order
    async fn load_row(&self, id: i64) -> DomainResult<Option<Recipe>>;

    /// Rewrite scalar fields, token, and the values and order of existing
    /// list rows
    async fn save_row(&self, recipe: &Recipe) -> DomainResult<()>;

    /// Delete a recipe and its list rows
    async fn delete_row(&self, id: i64) -> DomainResult<()>;

    async fn list_rows_by_owner(&self, owner_uid: i64) -> DomainResult<Vec<Recipe>>;

    async fn list_published_rows(&self) -> DomainResult<Vec<Recipe>>;

    async fn count_rows_by_owner(&self, owner_uid: i64) -> DomainResult<usize>;

    /// Take the store-wide write lock, or `None` if it stays busy past the
    /// configured wait
    async fn lock(&self) -> Option<StoreGuard>;

    /// Apply a validated save atomically and report minted ids
    async fn commit_save(&self, plan: &SavePlan) -> DomainResult<CommitOutcome>;

    /// Replace the stored save token
    async fn store_token(&self, id: i64, token: &str) -> DomainResult<()>;
}
