//! Save Command
//!
//! The recipe save transaction. Steps run in order and stop at the first
//! failure; nothing is written before the final commit:
//!
//! 1. decode the body
//! 2. take the store lock
//! 3. load the recipe
//! 4. authorize
//! 5. normalize and validate fields
//! 6. check every submitted id against the stored lists
//! 7. enforce list size caps
//! 8. reserve the save token with the supplied key
//! 9. commit in one transaction

use std::collections::HashSet;

use recipe_form::{EditableArray, EditableRecipe, SaveRequest, SaveSuccess};
use tracing::{info, warn};

use crate::domain::{
    can_edit_recipe, holder, is_valid_course, try_reserve, DomainError, DomainResult, Identity,
    ListItem, ListPlan, PlannedItem, Recipe, SavePlan,
};
use crate::AppState;

use super::recipe_cmd::lock_store;

#[derive(Debug, Clone, Copy)]
struct ListKind {
    singular: &'static str,
    plural: &'static str,
}

const INGREDIENTS: ListKind = ListKind {
    singular: "ingredient",
    plural: "ingredients",
};

const DIRECTIONS: ListKind = ListKind {
    singular: "direction",
    plural: "directions",
};

fn invalid(msg: impl Into<String>) -> DomainError {
    DomainError::InvalidInput(msg.into())
}

/// Run a save request body through the full transaction
pub async fn save_recipe(state: &AppState, who: &dyn Identity, body: &[u8]) -> DomainResult<SaveSuccess> {
    let result = run_save(state, who, body).await;

    match &result {
        Ok(success) => info!(
            uid = ?who.current_user_id(),
            minted = success.mapped_ingredients.len() + success.mapped_directions.len(),
            "recipe saved"
        ),
        Err(e) => warn!(
            uid = ?who.current_user_id(),
            status = e.status_code(),
            reason = %e,
            "save rejected"
        ),
    }
    result
}

async fn run_save(state: &AppState, who: &dyn Identity, body: &[u8]) -> DomainResult<SaveSuccess> {
    let request: SaveRequest = serde_json::from_slice(body)
        .map_err(|_| DomainError::Encoding("Bad recipe encoding".to_string()))?;

    let _guard = lock_store(state).await?;

    let existing = state
        .store
        .load_row(request.recipe.id)
        .await?
        .ok_or_else(DomainError::recipe_not_found)?;

    if !can_edit_recipe(who, existing.owner_uid) {
        return Err(DomainError::not_authorized());
    }
    let uid = who.current_user_id().ok_or_else(DomainError::not_authorized)?;

    let recipe = request.recipe.normalized();
    validate_fields(state, &recipe)?;

    check_references(INGREDIENTS, &recipe.ingredients, &existing.ingredients)?;
    check_references(DIRECTIONS, &recipe.directions, &existing.directions)?;

    check_size(INGREDIENTS, &recipe.ingredients, state.limits.max_list_len)?;
    check_size(DIRECTIONS, &recipe.directions, state.limits.max_list_len)?;

    let token = try_reserve(uid, &existing.save_token, Some(&request.save_key))
        .ok_or_else(|| conflict(who, &existing))?;

    let plan = SavePlan {
        recipe_id: existing.id,
        title: recipe.title.clone(),
        is_vegan: recipe.is_vegan,
        is_published: recipe.is_published,
        course: recipe.course,
        notes: non_empty(&recipe.notes),
        courtesy_of: non_empty(&recipe.courtesy_of),
        ingredients: to_list_plan(&recipe.ingredients),
        directions: to_list_plan(&recipe.directions),
        save_token: token.encode(),
    };

    let outcome = state.store.commit_save(&plan).await?;

    Ok(SaveSuccess {
        mapped_ingredients: outcome.mapped_ingredients,
        mapped_directions: outcome.mapped_directions,
        new_save_key: token.key,
    })
}

fn conflict(who: &dyn Identity, existing: &Recipe) -> DomainError {
    let name = holder(&existing.save_token)
        .map(|uid| who.username_for(uid))
        .unwrap_or_else(|| "another user".to_string());
    DomainError::Conflict(format!(
        "This recipe is being edited by {}. Reload to continue editing.",
        name
    ))
}

fn validate_fields(state: &AppState, recipe: &EditableRecipe) -> DomainResult<()> {
    if !is_valid_course(recipe.course) {
        return Err(invalid("Bad course"));
    }

    if let Some(issue) = state.fields.issues(recipe).first() {
        return Err(invalid(issue.to_string()));
    }
    Ok(())
}

/// Every kept id must be stored, every deleted id must be stored and not
/// kept, and no id may appear twice
fn check_references(kind: ListKind, list: &EditableArray, stored: &[ListItem]) -> DomainResult<()> {
    if list.elems.is_empty() {
        return Err(invalid(format!("Empty {} list", kind.singular)));
    }

    let stored: HashSet<i64> = stored.iter().map(|i| i.id).collect();

    let mut deleted = HashSet::new();
    for id in &list.deleted_ids {
        if !stored.contains(id) || !deleted.insert(*id) {
            return Err(invalid(format!("Bad deleted {} id", kind.singular)));
        }
    }

    let mut kept = HashSet::new();
    let mut temps = HashSet::new();
    for elem in &list.elems {
        if elem.is_temp {
            if elem.id >= 0 || !temps.insert(elem.id) {
                return Err(invalid(format!("Bad temporary {} id", kind.singular)));
            }
            continue;
        }

        if !stored.contains(&elem.id) {
            return Err(invalid(format!("Bad saved {} id", kind.singular)));
        }
        if !kept.insert(elem.id) {
            return Err(invalid(format!("Duplicate {} id", kind.singular)));
        }
        if deleted.contains(&elem.id) {
            return Err(invalid(format!("Bad deleted {} id", kind.singular)));
        }
    }
    Ok(())
}

fn check_size(kind: ListKind, list: &EditableArray, max: usize) -> DomainResult<()> {
    if list.len() > max {
        return Err(invalid(format!("Too many {} (max {})", kind.plural, max)));
    }
    Ok(())
}

fn to_list_plan(list: &EditableArray) -> ListPlan {
    ListPlan {
        deleted_ids: list.deleted_ids.clone(),
        items: list
            .elems
            .iter()
            .map(|e| {
                if e.is_temp {
                    PlannedItem::Create {
                        temp_id: e.id,
                        value: e.value.clone(),
                    }
                } else {
                    PlannedItem::Keep {
                        id: e.id,
                        value: e.value.clone(),
                    }
                }
            })
            .collect(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_form::EditableElem;

    fn stored(ids: &[i64]) -> Vec<ListItem> {
        ids.iter().map(|id| ListItem::new(*id, "x")).collect()
    }

    fn list(elems: Vec<EditableElem>, deleted_ids: Vec<i64>) -> EditableArray {
        EditableArray {
            elems,
            deleted_ids,
            selected_index: 0,
        }
    }

    fn message(result: DomainResult<()>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_references_accept_valid_list() {
        let l = list(
            vec![EditableElem::saved(1, "a"), EditableElem::temp(-3, "b")],
            vec![2],
        );
        assert!(check_references(INGREDIENTS, &l, &stored(&[1, 2])).is_ok());
    }

    #[test]
    fn test_references_reject_unknown_ids() {
        let deleted = list(vec![EditableElem::saved(1, "a")], vec![9]);
        assert_eq!(
            message(check_references(INGREDIENTS, &deleted, &stored(&[1]))),
            "Bad deleted ingredient id"
        );

        let saved = list(vec![EditableElem::saved(9, "a")], vec![]);
        assert_eq!(
            message(check_references(DIRECTIONS, &saved, &stored(&[1]))),
            "Bad saved direction id"
        );
    }

    #[test]
    fn test_references_reject_duplicates_and_conflicts() {
        let dup = list(vec![EditableElem::saved(1, "a"), EditableElem::saved(1, "b")], vec![]);
        assert_eq!(message(check_references(INGREDIENTS, &dup, &stored(&[1]))), "Duplicate ingredient id");

        let dup_temp = list(vec![EditableElem::temp(-1, "a"), EditableElem::temp(-1, "b")], vec![]);
        assert_eq!(
            message(check_references(INGREDIENTS, &dup_temp, &stored(&[]))),
            "Bad temporary ingredient id"
        );

        let kept_and_deleted = list(vec![EditableElem::saved(1, "a")], vec![1]);
        assert_eq!(
            message(check_references(INGREDIENTS, &kept_and_deleted, &stored(&[1]))),
            "Bad deleted ingredient id"
        );

        let twice_deleted = list(vec![EditableElem::saved(1, "a")], vec![2, 2]);
        assert!(check_references(INGREDIENTS, &twice_deleted, &stored(&[1, 2])).is_err());
    }

    #[test]
    fn test_references_reject_empty_list() {
        let empty = list(vec![], vec![]);
        assert_eq!(message(check_references(DIRECTIONS, &empty, &stored(&[]))), "Empty direction list");
    }

    #[test]
    fn test_size_cap() {
        let elems: Vec<EditableElem> = (1..=65).map(|i| EditableElem::temp(-i, "")).collect();
        let over = list(elems.clone(), vec![]);
        let at = list(elems[..64].to_vec(), vec![]);

        assert!(check_size(INGREDIENTS, &at, 64).is_ok());
        assert_eq!(message(check_size(INGREDIENTS, &over, 64)), "Too many ingredients (max 64)");
    }

    #[test]
    fn test_list_plan_keeps_order() {
        let l = list(
            vec![EditableElem::temp(-2, "b"), EditableElem::saved(5, "a")],
            vec![7],
        );
        let plan = to_list_plan(&l);
        assert_eq!(plan.deleted_ids, vec![7]);
        assert_eq!(
            plan.items,
            vec![
                PlannedItem::Create {
                    temp_id: -2,
                    value: "b".to_string()
                },
                PlannedItem::Keep {
                    id: 5,
                    value: "a".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("x"), Some("x".to_string()));
    }
}
