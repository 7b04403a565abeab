//! Editor State Store
//!
//! The whole editor is one immutable [`EditState`] snapshot. User actions and
//! save completions are applied through [`reduce`], which never touches the
//! snapshot it is given.

use recipe_form::{
    reconcile, EditableArray, EditableRecipe, EditorModel, FieldIssue, RecipeFieldSpecs, SaveSuccess,
    TempIds,
};

/// Which list an action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Ingredients,
    Directions,
}

/// Everything the editor shows and submits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    /// Live recipe, edited by the user
    pub recipe: EditableRecipe,
    /// Recipe as last stored on the server
    pub saved_recipe: EditableRecipe,
    pub temp_ids: TempIds,
    /// Key of the save token this editor holds
    pub save_key: String,
    pub saving: bool,
    pub show_delete_dialog: bool,
    /// Message of the last failed save
    pub last_error: Option<String>,
    pub fields: RecipeFieldSpecs,
    pub courses: Vec<String>,
    pub max_list_len: usize,
    pub save_uri: String,
    pub view_uri: String,
    pub delete_uri: String,
    pub publish_uri: String,
}

impl EditState {
    pub fn from_model(model: EditorModel) -> Self {
        let temp_ids = TempIds::continuing([&model.recipe.ingredients, &model.recipe.directions]);
        Self {
            saved_recipe: model.recipe.clone(),
            recipe: model.recipe,
            temp_ids,
            save_key: model.initial_save_key,
            saving: false,
            show_delete_dialog: false,
            last_error: None,
            fields: model.fields,
            courses: model.courses,
            max_list_len: model.max_list_len,
            save_uri: model.save_uri,
            view_uri: model.view_uri,
            delete_uri: model.delete_uri,
            publish_uri: model.publish_uri,
        }
    }

    /// Whether the live recipe differs from the stored one
    pub fn has_change(&self) -> bool {
        !self.recipe.same_content(&self.saved_recipe)
    }

    /// Fields that would be rejected on save
    pub fn invalid_entries(&self) -> Vec<FieldIssue> {
        self.fields.issues(&self.recipe.normalized())
    }

    /// A save may start: none in flight and every field valid
    pub fn can_save(&self) -> bool {
        !self.saving && self.invalid_entries().is_empty()
    }

    pub fn list(&self, field: ListField) -> &EditableArray {
        match field {
            ListField::Ingredients => &self.recipe.ingredients,
            ListField::Directions => &self.recipe.directions,
        }
    }

    fn list_mut(&mut self, field: ListField) -> &mut EditableArray {
        match field {
            ListField::Ingredients => &mut self.recipe.ingredients,
            ListField::Directions => &mut self.recipe.directions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    SetTitle(String),
    SetVegan(bool),
    SetPublished(bool),
    SetCourse(i64),
    SetNotes(String),
    SetCourtesyOf(String),

    Select(ListField, usize),
    SelectNext(ListField),
    SelectPrevious(ListField),
    InsertAfterSelected(ListField),
    /// Replace the selected entry verbatim
    SetSelectedValue(ListField, String),
    /// Replace the selected entry, extra lines become new entries
    SetSelectedLines(ListField, String),
    RemoveSelected(ListField),
    Move(ListField, usize, usize),
    MoveUp(ListField),
    MoveDown(ListField),

    BeginSave,
    /// Server accepted `requested`
    SaveSucceeded {
        requested: EditableRecipe,
        success: SaveSuccess,
    },
    SaveFailed(String),

    ShowDeleteDialog(bool),
}

// ========================
// Reducer
// ========================

/// Apply one action to a snapshot
pub fn reduce(state: &EditState, action: EditAction) -> EditState {
    let mut next = state.clone();

    match action {
        EditAction::SetTitle(title) => next.recipe.title = title,
        EditAction::SetVegan(is_vegan) => next.recipe.is_vegan = is_vegan,
        EditAction::SetPublished(is_published) => next.recipe.is_published = is_published,
        EditAction::SetCourse(course) => next.recipe.course = course,
        EditAction::SetNotes(notes) => next.recipe.notes = notes,
        EditAction::SetCourtesyOf(courtesy_of) => next.recipe.courtesy_of = courtesy_of,

        EditAction::Select(field, index) => update_list(&mut next, field, |l, _| l.select(index)),
        EditAction::SelectNext(field) => update_list(&mut next, field, |l, _| l.select_next()),
        EditAction::SelectPrevious(field) => update_list(&mut next, field, |l, _| l.select_previous()),
        EditAction::InsertAfterSelected(field) => {
            if state.list(field).len() < state.max_list_len {
                update_list(&mut next, field, |l, ids| l.insert_after_selected(ids));
            }
        }
        EditAction::SetSelectedValue(field, value) => {
            update_list(&mut next, field, |l, _| l.set_selected_value(&value))
        }
        EditAction::SetSelectedLines(field, text) => {
            update_list(&mut next, field, |l, ids| l.set_selected_lines(&text, ids))
        }
        EditAction::RemoveSelected(field) => update_list(&mut next, field, |l, _| l.remove_selected()),
        EditAction::Move(field, from, to) => update_list(&mut next, field, |l, _| l.move_elem(from, to)),
        EditAction::MoveUp(field) => update_list(&mut next, field, |l, _| l.move_selected_up()),
        EditAction::MoveDown(field) => update_list(&mut next, field, |l, _| l.move_selected_down()),

        EditAction::BeginSave => {
            if state.can_save() {
                next.saving = true;
                next.last_error = None;
            }
        }
        EditAction::SaveSucceeded { requested, success } => {
            let ingredients = reconcile(
                &state.recipe.ingredients,
                &requested.ingredients,
                &success.mapped_ingredients,
            );
            let directions = reconcile(
                &state.recipe.directions,
                &requested.directions,
                &success.mapped_directions,
            );

            next.recipe.ingredients = ingredients.current;
            next.recipe.directions = directions.current;
            next.saved_recipe = EditableRecipe {
                ingredients: ingredients.saved,
                directions: directions.saved,
                ..requested
            };
            next.save_key = success.new_save_key;
            next.saving = false;
            next.last_error = None;
        }
        EditAction::SaveFailed(message) => {
            next.saving = false;
            next.last_error = Some(message);
        }

        EditAction::ShowDeleteDialog(show) => next.show_delete_dialog = show,
    }

    next
}

fn update_list(
    state: &mut EditState,
    field: ListField,
    op: impl FnOnce(&EditableArray, &mut TempIds) -> EditableArray,
) {
    let mut ids = state.temp_ids;
    let list = op(state.list(field), &mut ids);
    *state.list_mut(field) = list;
    state.temp_ids = ids;
}
