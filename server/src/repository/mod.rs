//! Repository Layer
//!
//! Data access abstractions and implementations.

mod db;
mod recipe_repo;
mod traits;


pub use db::Database;
pub use recipe_repo::SqliteRecipeStore;
pub use traits::{RecipeStore, StoreGuard};
