//! Recipe Entity
//!
//! A stored recipe with its ordered ingredient and direction lists, and the
//! validated plan a save commits.

use recipe_form::{EditableArray, EditableRecipe, IdMap, RecipeSummary, RecipeView, TempIds};
use serde::{Deserialize, Serialize};

use super::course::course_title;

/// One stored ingredient or direction. Order is the position in its list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: i64,
    pub value: String,
}

impl ListItem {
    pub fn new(id: i64, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub owner_uid: i64,
    pub title: String,
    pub is_vegan: bool,
    pub is_published: bool,
    /// 1-based course index
    pub course: i64,
    pub notes: Option<String>,
    pub courtesy_of: Option<String>,
    pub ingredients: Vec<ListItem>,
    pub directions: Vec<ListItem>,
    /// Encoded save token, empty until an editor is first opened
    pub save_token: String,
}

impl Recipe {
    pub const DEFAULT_TITLE: &'static str = "Untitled";

    /// Editable form handed to a freshly opened editor
    pub fn to_editable(&self, ids: &mut TempIds) -> EditableRecipe {
        EditableRecipe {
            id: self.id,
            title: self.title.clone(),
            is_vegan: self.is_vegan,
            is_published: self.is_published,
            course: self.course,
            notes: self.notes.clone().unwrap_or_default(),
            courtesy_of: self.courtesy_of.clone().unwrap_or_default(),
            ingredients: list_to_editable(&self.ingredients, ids),
            directions: list_to_editable(&self.directions, ids),
        }
    }

    pub fn to_summary(&self) -> RecipeSummary {
        RecipeSummary {
            id: self.id,
            title: self.title.clone(),
            is_published: self.is_published,
        }
    }

    pub fn to_view(&self, can_edit: bool) -> RecipeView {
        RecipeView {
            id: self.id,
            title: self.title.clone(),
            is_vegan: self.is_vegan,
            is_published: self.is_published,
            course: self.course,
            course_title: course_title(self.course).unwrap_or_default().to_string(),
            notes: self.notes.clone(),
            courtesy_of: self.courtesy_of.clone(),
            ingredients: self.ingredients.iter().map(|i| i.value.clone()).collect(),
            directions: self.directions.iter().map(|d| d.value.clone()).collect(),
            can_edit,
        }
    }
}

fn list_to_editable(items: &[ListItem], ids: &mut TempIds) -> EditableArray {
    EditableArray::from_saved(items.iter().map(|i| (i.id, i.value.clone())), ids)
}

/// One entry of a list as it will be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedItem {
    /// Existing row, value and position rewritten
    Keep { id: i64, value: String },
    /// New row; the minted id is reported against `temp_id`
    Create { temp_id: i64, value: String },
}

/// Final state of one list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListPlan {
    pub deleted_ids: Vec<i64>,
    /// Display order; positions are assigned 1-based from this order
    pub items: Vec<PlannedItem>,
}

/// Everything a validated save writes, in one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePlan {
    pub recipe_id: i64,
    pub title: String,
    pub is_vegan: bool,
    pub is_published: bool,
    pub course: i64,
    pub notes: Option<String>,
    pub courtesy_of: Option<String>,
    pub ingredients: ListPlan,
    pub directions: ListPlan,
    /// Encoded token replacing the stored one
    pub save_token: String,
}

/// Ids minted by a committed save
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitOutcome {
    pub mapped_ingredients: IdMap,
    pub mapped_directions: IdMap,
}
