//! Wire Types
//!
//! JSON shapes exchanged between the editor and the recipe server.
//! Request types reject unknown fields so a malformed body fails to decode
//! instead of being half-read.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::editable::EditableArray;
use crate::field::{normalize_line, RecipeFieldSpecs};
use crate::reconcile::IdMap;

/// Recipe as held by the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditableRecipe {
    pub id: i64,
    pub title: String,
    pub is_vegan: bool,
    pub is_published: bool,
    /// 1-based index into the course list
    pub course: i64,
    pub notes: String,
    pub courtesy_of: String,
    pub ingredients: EditableArray,
    pub directions: EditableArray,
}

impl EditableRecipe {
    /// Copy with every text field and list entry passed through
    /// [`normalize_line`]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.title = normalize_line(&self.title);
        out.notes = normalize_line(&self.notes);
        out.courtesy_of = normalize_line(&self.courtesy_of);
        for elem in out.ingredients.elems.iter_mut().chain(out.directions.elems.iter_mut()) {
            elem.value = normalize_line(&elem.value);
        }
        out
    }

    /// Same content as `other`, ignoring list selections
    pub fn same_content(&self, other: &EditableRecipe) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.is_vegan == other.is_vegan
            && self.is_published == other.is_published
            && self.course == other.course
            && self.notes == other.notes
            && self.courtesy_of == other.courtesy_of
            && self.ingredients.same_content(&other.ingredients)
            && self.directions.same_content(&other.directions)
    }
}

/// A field that failed its constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldIssue {
    Title,
    CourtesyOf,
    Notes,
    /// 0-based position in the ingredient list
    Ingredient(usize),
    /// 0-based position in the direction list
    Direction(usize),
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldIssue::Title => write!(f, "Bad title"),
            FieldIssue::CourtesyOf => write!(f, "Bad courtesy of"),
            FieldIssue::Notes => write!(f, "Bad notes"),
            FieldIssue::Ingredient(i) => write!(f, "Bad ingredient #{}", i + 1),
            FieldIssue::Direction(i) => write!(f, "Bad direction #{}", i + 1),
        }
    }
}

impl RecipeFieldSpecs {
    /// Every field of `recipe` that fails its spec, in form order.
    ///
    /// Values are checked as given; normalize first to check what a save
    /// would persist.
    pub fn issues(&self, recipe: &EditableRecipe) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        if !self.title.is_valid(&recipe.title) {
            issues.push(FieldIssue::Title);
        }
        if !self.courtesy_of.is_valid(&recipe.courtesy_of) {
            issues.push(FieldIssue::CourtesyOf);
        }
        if !self.notes.is_valid(&recipe.notes) {
            issues.push(FieldIssue::Notes);
        }

        issues.extend(
            recipe
                .ingredients
                .elems
                .iter()
                .enumerate()
                .filter(|(_, e)| !self.ingredient.is_valid(&e.value))
                .map(|(i, _)| FieldIssue::Ingredient(i)),
        );
        issues.extend(
            recipe
                .directions
                .elems
                .iter()
                .enumerate()
                .filter(|(_, e)| !self.direction.is_valid(&e.value))
                .map(|(i, _)| FieldIssue::Direction(i)),
        );

        issues
    }
}

/// Body of a save request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SaveRequest {
    pub recipe: EditableRecipe,
    /// Key of the save token the editor was issued
    pub save_key: String,
}

/// Body of a successful save
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSuccess {
    pub mapped_ingredients: IdMap,
    pub mapped_directions: IdMap,
    pub new_save_key: String,
}

/// Body of every failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Either outcome of a save, as seen by the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SaveResponse {
    Error(ErrorBody),
    Success(SaveSuccess),
}

impl<'de> Deserialize<'de> for SaveResponse {
    /// Bodies with an `error` key are failures, everything else must be a
    /// success. Id maps keep their string keys through the `Value`.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.get("error").is_some() {
            ErrorBody::deserialize(value)
                .map(SaveResponse::Error)
                .map_err(D::Error::custom)
        } else {
            SaveSuccess::deserialize(value)
                .map(SaveResponse::Success)
                .map_err(D::Error::custom)
        }
    }
}

/// Everything the editor needs to start editing one recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorModel {
    pub recipe: EditableRecipe,
    pub courses: Vec<String>,
    pub fields: RecipeFieldSpecs,
    pub max_list_len: usize,
    pub initial_save_key: String,
    pub save_uri: String,
    pub view_uri: String,
    pub delete_uri: String,
    pub publish_uri: String,
}

/// Row of a recipe listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub is_published: bool,
}

/// The caller's own recipes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyRecipes {
    pub can_create: bool,
    pub recipes: Vec<RecipeSummary>,
}

/// Read-only rendering of a stored recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeView {
    pub id: i64,
    pub title: String,
    pub is_vegan: bool,
    pub is_published: bool,
    pub course: i64,
    pub course_title: String,
    pub notes: Option<String>,
    pub courtesy_of: Option<String>,
    pub ingredients: Vec<String>,
    pub directions: Vec<String>,
    pub can_edit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editable::{EditableElem, TempIds};

    fn recipe() -> EditableRecipe {
        let mut ids = TempIds::new();
        EditableRecipe {
            id: 7,
            title: "  Bean   soup ".to_string(),
            is_vegan: true,
            is_published: false,
            course: 4,
            notes: String::new(),
            courtesy_of: "Gran".to_string(),
            ingredients: EditableArray::from_saved(vec![(1, "beans"), (2, " water\t")], &mut ids),
            directions: EditableArray::from_saved(vec![(3, "boil")], &mut ids),
        }
    }

    #[test]
    fn test_save_request_json_shape() {
        let request = SaveRequest {
            recipe: recipe(),
            save_key: "k1".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["saveKey"], "k1");
        assert_eq!(json["recipe"]["isVegan"], true);
        assert_eq!(json["recipe"]["courtesyOf"], "Gran");
        assert_eq!(json["recipe"]["ingredients"]["elems"][1]["value"], " water\t");
    }

    #[test]
    fn test_save_request_rejects_unknown_fields() {
        let mut json = serde_json::to_value(SaveRequest {
            recipe: recipe(),
            save_key: "k1".to_string(),
        })
        .unwrap();
        json["recipe"]["owner"] = serde_json::json!(3);

        assert!(serde_json::from_value::<SaveRequest>(json).is_err());
    }

    #[test]
    fn test_save_request_rejects_unknown_list_fields() {
        let request = serde_json::to_value(SaveRequest {
            recipe: recipe(),
            save_key: "k1".to_string(),
        })
        .unwrap();

        let mut in_entry = request.clone();
        in_entry["recipe"]["ingredients"]["elems"][0]["bogus"] = serde_json::json!(1);
        assert!(serde_json::from_value::<SaveRequest>(in_entry).is_err());

        let mut in_list = request.clone();
        in_list["recipe"]["directions"]["extra"] = serde_json::json!(true);
        assert!(serde_json::from_value::<SaveRequest>(in_list).is_err());

        assert!(serde_json::from_value::<SaveRequest>(request).is_ok());
    }

    #[test]
    fn test_save_request_rejects_missing_fields() {
        let json = serde_json::json!({ "recipe": { "id": 7 }, "saveKey": "k" });
        assert!(serde_json::from_value::<SaveRequest>(json).is_err());
    }

    #[test]
    fn test_save_success_maps_use_string_keys() {
        let success = SaveSuccess {
            mapped_ingredients: IdMap::from([(-5, 40)]),
            mapped_directions: IdMap::new(),
            new_save_key: "k2".to_string(),
        };
        let text = serde_json::to_string(&success).unwrap();
        assert!(text.contains(r#""mappedIngredients":{"-5":40}"#));

        let back: SaveResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(back, SaveResponse::Success(success));
    }

    #[test]
    fn test_save_response_reads_minted_ids() {
        let text = r#"{"mappedIngredients":{"-5":41,"-7":42},"mappedDirections":{"-6":43},"newSaveKey":"k3"}"#;
        match serde_json::from_str::<SaveResponse>(text).unwrap() {
            SaveResponse::Success(success) => {
                assert_eq!(success.mapped_ingredients, IdMap::from([(-5, 41), (-7, 42)]));
                assert_eq!(success.mapped_directions, IdMap::from([(-6, 43)]));
                assert_eq!(success.new_save_key, "k3");
            }
            other => panic!("expected success, got {:?}", other),
        }

        assert!(serde_json::from_str::<SaveResponse>(r#"{"newSaveKey":"k3"}"#).is_err());
    }

    #[test]
    fn test_save_response_error_variant() {
        let back: SaveResponse = serde_json::from_str(r#"{"error":"Bad course"}"#).unwrap();
        assert_eq!(
            back,
            SaveResponse::Error(ErrorBody {
                error: "Bad course".to_string()
            })
        );
    }

    #[test]
    fn test_normalized_and_issues() {
        let specs = RecipeFieldSpecs::default();
        let mut r = recipe();
        r.directions.elems[0].value = "x".repeat(513);

        let n = r.normalized();
        assert_eq!(n.title, "Bean soup");
        assert_eq!(n.ingredients.elems[1], EditableElem::saved(2, "water"));
        assert_eq!(specs.issues(&n), vec![FieldIssue::Direction(0)]);
        assert_eq!(FieldIssue::Direction(0).to_string(), "Bad direction #1");
    }

    #[test]
    fn test_same_content_ignores_selection() {
        let a = recipe();
        let mut b = a.clone();
        b.ingredients = b.ingredients.select(1);
        assert!(a.same_content(&b));

        b.title.push('!');
        assert!(!a.same_content(&b));
    }
}
