//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! Storage and transport stay out of this layer.

mod course;
mod entity;
mod identity;
mod recipe;
mod save_token;

pub use course::{course_names, course_title, is_valid_course, COURSES};
pub use entity::{DomainError, DomainResult};
pub use identity::{
    can_create_recipe, can_edit_recipe, Capability, Identity, RequestIdentity, User, UserDirectory,
};
pub use recipe::{CommitOutcome, ListItem, ListPlan, PlannedItem, Recipe, SavePlan};
pub use save_token::{holder, try_reserve, SaveToken, TokenError};
