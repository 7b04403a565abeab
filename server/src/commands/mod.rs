//! Commands Layer
//!
//! Request handlers as plain async functions over [`crate::AppState`] and
//! the caller's identity. The HTTP routes in [`crate::routes`] are thin
//! wrappers around them.

mod recipe_cmd;
mod save_cmd;


pub use recipe_cmd::*;
pub use save_cmd::*;
