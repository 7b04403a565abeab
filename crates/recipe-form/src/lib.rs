//! Recipe Form
//!
//! Model shared by the recipe editor and the recipe server:
//! - field: text constraints and line normalization
//! - editable: the editable list model behind ingredients and directions
//! - reconcile: merging server-minted ids into a live editor list
//! - wire: request/response shapes

mod editable;
mod field;
mod reconcile;
mod wire;

pub use editable::{EditableArray, EditableElem, TempIds};
pub use field::{normalize_line, FieldSpec, RecipeFieldSpecs};
pub use reconcile::{reconcile, IdMap, Reconciled};
pub use wire::{
    EditableRecipe, EditorModel, ErrorBody, FieldIssue, MyRecipes, RecipeSummary, RecipeView,
    SaveRequest, SaveResponse, SaveSuccess,
};
