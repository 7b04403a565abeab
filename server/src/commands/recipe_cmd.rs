//! Recipe Commands
//!
//! Listing, creation, the open-editor lease, publish, delete and view.
//! Every mutating command holds the store lock for its whole
//! load-check-write sequence.

use recipe_form::{EditorModel, MyRecipes, RecipeSummary, RecipeView, TempIds};
use tracing::{info, warn};

use crate::domain::{
    can_create_recipe, can_edit_recipe, course_names, try_reserve, Capability, DomainError,
    DomainResult, Identity, Recipe,
};
use crate::repository::StoreGuard;
use crate::AppState;

pub(crate) async fn lock_store(state: &AppState) -> DomainResult<StoreGuard> {
    match state.store.lock().await {
        Some(guard) => Ok(guard),
        None => {
            warn!("store lock busy");
            Err(DomainError::busy())
        }
    }
}

/// Load a recipe the caller may edit
async fn load_editable(state: &AppState, who: &dyn Identity, id: i64) -> DomainResult<Recipe> {
    let recipe = state
        .store
        .load_row(id)
        .await?
        .ok_or_else(DomainError::recipe_not_found)?;

    if !can_edit_recipe(who, recipe.owner_uid) {
        return Err(DomainError::not_authorized());
    }
    Ok(recipe)
}

/// List published recipes
pub async fn list_published(state: &AppState) -> DomainResult<Vec<RecipeSummary>> {
    let rows = state.store.list_published_rows().await?;
    Ok(rows.iter().map(Recipe::to_summary).collect())
}

/// List the caller's own recipes
pub async fn my_recipes(state: &AppState, who: &dyn Identity) -> DomainResult<MyRecipes> {
    let uid = who.current_user_id().ok_or_else(DomainError::not_authorized)?;

    let can_create = can_create_recipe(who);
    let recipes = if can_create {
        state
            .store
            .list_rows_by_owner(uid)
            .await?
            .iter()
            .map(Recipe::to_summary)
            .collect()
    } else {
        Vec::new()
    };

    Ok(MyRecipes {
        can_create,
        recipes,
    })
}

/// Create a recipe owned by the caller
pub async fn create_recipe(state: &AppState, who: &dyn Identity) -> DomainResult<i64> {
    let uid = who.current_user_id().ok_or_else(DomainError::not_authorized)?;
    if !can_create_recipe(who) {
        return Err(DomainError::not_authorized());
    }

    let _guard = lock_store(state).await?;

    if !who.user_has_capability(Capability::UnlimitedRecipes) {
        let owned = state.store.count_rows_by_owner(uid).await?;
        if owned >= state.limits.max_recipes_per_owner {
            warn!(uid, owned, "recipe limit reached");
            return Err(DomainError::InvalidInput(format!(
                "Recipe limit of {} reached",
                state.limits.max_recipes_per_owner
            )));
        }
    }

    let id = state.store.create_row(uid).await?;
    info!(recipe_id = id, uid, "recipe created");
    Ok(id)
}

/// Open the editor: issue a fresh save token, superseding any other editor
pub async fn open_editor(state: &AppState, who: &dyn Identity, id: i64) -> DomainResult<EditorModel> {
    let _guard = lock_store(state).await?;

    let recipe = load_editable(state, who, id).await?;
    let uid = who.current_user_id().ok_or_else(DomainError::not_authorized)?;

    let token = try_reserve(uid, &recipe.save_token, None)
        .ok_or_else(|| DomainError::Internal("edit lease not issued".to_string()))?;
    state.store.store_token(id, &token.encode()).await?;
    info!(recipe_id = id, uid, "editor opened");

    let mut ids = TempIds::new();
    let base = &state.base_uri;
    Ok(EditorModel {
        recipe: recipe.to_editable(&mut ids),
        courses: course_names(),
        fields: state.fields.clone(),
        max_list_len: state.limits.max_list_len,
        initial_save_key: token.key,
        save_uri: format!("{}/save", base),
        view_uri: format!("{}/view?id={}", base, id),
        delete_uri: format!("{}/delete?id={}", base, id),
        publish_uri: format!("{}/publish?id={}", base, id),
    })
}

/// Publish or unpublish
pub async fn set_published(
    state: &AppState,
    who: &dyn Identity,
    id: i64,
    published: bool,
) -> DomainResult<RecipeSummary> {
    let _guard = lock_store(state).await?;

    let mut recipe = load_editable(state, who, id).await?;
    recipe.is_published = published;
    state.store.save_row(&recipe).await?;

    info!(recipe_id = id, published, "publish state changed");
    Ok(recipe.to_summary())
}

/// Delete a recipe and its lists
pub async fn delete_recipe(state: &AppState, who: &dyn Identity, id: i64) -> DomainResult<()> {
    let _guard = lock_store(state).await?;

    load_editable(state, who, id).await?;
    state.store.delete_row(id).await?;

    info!(recipe_id = id, "recipe deleted");
    Ok(())
}

/// Read-only view. Unpublished recipes are visible to editors only.
pub async fn view_recipe(state: &AppState, who: &dyn Identity, id: i64) -> DomainResult<RecipeView> {
    let recipe = state
        .store
        .load_row(id)
        .await?
        .ok_or_else(|| DomainError::NotFound("Not found".to_string()))?;

    let can_edit = can_edit_recipe(who, recipe.owner_uid);
    if !recipe.is_published && !can_edit {
        return Err(DomainError::NotFound("Not found".to_string()));
    }
    Ok(recipe.to_view(can_edit))
}
