//! Client Models
//!
//! Data structures matching the server's wire format, shared through
//! `recipe-form`.

pub use recipe_form::{
    EditableArray, EditableElem, EditableRecipe, EditorModel, ErrorBody, FieldIssue, FieldSpec, IdMap,
    MyRecipes, RecipeFieldSpecs, RecipeSummary, RecipeView, SaveRequest, SaveResponse, SaveSuccess,
    TempIds,
};
