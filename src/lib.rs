//! Recipe Editor Client
//!
//! - store: editor state and the reducer over it
//! - session: one open editor and its save round trip
//! - commands: HTTP bindings to the recipe server
//! - models: wire types shared with the server

pub mod commands;
pub mod models;
pub mod session;
pub mod store;

pub use commands::{ClientError, RecipeClient};
pub use session::{EditorSession, PendingSave, SaveTransport};
pub use store::{reduce, EditAction, EditState, ListField};
