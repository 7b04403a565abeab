//! Recipe Repository Implementation
//!
//! SQLite-backed implementation of [`RecipeStore`].

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::{
    CommitOutcome, DomainError, DomainResult, ListItem, ListPlan, PlannedItem, Recipe, SavePlan,
};
use recipe_form::IdMap;

use super::db::db_err;
use super::traits::{RecipeStore, StoreGuard};

const RECIPE_COLUMNS: &str =
    "id, owner_uid, title, is_vegan, is_published, course, notes, courtesy_of, save_token";

#[derive(Debug, Clone, Copy)]
enum ListTable {
    Ingredients,
    Directions,
}

impl ListTable {
    fn name(self) -> &'static str {
        match self {
            ListTable::Ingredients => "ingredients",
            ListTable::Directions => "directions",
        }
    }
}

/// SQLite implementation of the recipe store
pub struct SqliteRecipeStore {
    conn: Arc<Mutex<Option<Connection>>>,
    write_lock: Arc<Mutex<()>>,
    lock_wait: Duration,
}

impl SqliteRecipeStore {
    pub fn new(
        conn: Arc<Mutex<Option<Connection>>>,
        write_lock: Arc<Mutex<()>>,
        lock_wait: Duration,
    ) -> Self {
        Self {
            conn,
            write_lock,
            lock_wait,
        }
    }
}

fn not_initialized() -> DomainError {
    DomainError::Internal("Database not initialized".to_string())
}

fn row_to_recipe(row: &Row) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: row.get(0)?,
        owner_uid: row.get(1)?,
        title: row.get(2)?,
        is_vegan: row.get::<_, i64>(3)? != 0,
        is_published: row.get::<_, i64>(4)? != 0,
        course: row.get(5)?,
        notes: row.get(6)?,
        courtesy_of: row.get(7)?,
        ingredients: Vec::new(),
        directions: Vec::new(),
        save_token: row.get(8)?,
    })
}

fn load_list(conn: &Connection, table: ListTable, recipe_id: i64) -> DomainResult<Vec<ListItem>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT id, value FROM {} WHERE recipe_id = ? ORDER BY position, id",
            table.name()
        ))
        .map_err(db_err)?;

    let items = stmt
        .query_map([recipe_id], |row| Ok(ListItem::new(row.get(0)?, row.get::<_, String>(1)?)))
        .map_err(db_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(items)
}

fn with_lists(conn: &Connection, mut recipe: Recipe) -> DomainResult<Recipe> {
    recipe.ingredients = load_list(conn, ListTable::Ingredients, recipe.id)?;
    recipe.directions = load_list(conn, ListTable::Directions, recipe.id)?;
    Ok(recipe)
}

fn query_recipes(conn: &Connection, filter: &str, arg: i64) -> DomainResult<Vec<Recipe>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM recipes WHERE {} ORDER BY title, id",
            RECIPE_COLUMNS, filter
        ))
        .map_err(db_err)?;

    let rows = stmt
        .query_map([arg], row_to_recipe)
        .map_err(db_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(db_err)?;

    rows.into_iter().map(|r| with_lists(conn, r)).collect()
}

fn insert_item(tx: &Transaction, table: ListTable, recipe_id: i64, position: i64, value: &str) -> DomainResult<i64> {
    tx.execute(
        &format!(
            "INSERT INTO {} (recipe_id, position, value) VALUES (?, ?, ?)",
            table.name()
        ),
        params![recipe_id, position, value],
    )
    .map_err(db_err)?;
    Ok(tx.last_insert_rowid())
}

/// Deletions first, then every entry in its final position
fn apply_list(tx: &Transaction, table: ListTable, recipe_id: i64, plan: &ListPlan) -> DomainResult<IdMap> {
    for id in &plan.deleted_ids {
        tx.execute(
            &format!("DELETE FROM {} WHERE id = ? AND recipe_id = ?", table.name()),
            params![id, recipe_id],
        )
        .map_err(db_err)?;
    }

    let mut mapped = IdMap::new();
    for (index, item) in plan.items.iter().enumerate() {
        let position = index as i64 + 1;
        match item {
            PlannedItem::Keep { id, value } => {
                tx.execute(
                    &format!(
                        "UPDATE {} SET position = ?, value = ? WHERE id = ? AND recipe_id = ?",
                        table.name()
                    ),
                    params![position, value, id, recipe_id],
                )
                .map_err(db_err)?;
            }
            PlannedItem::Create { temp_id, value } => {
                let id = insert_item(tx, table, recipe_id, position, value)?;
                mapped.insert(*temp_id, id);
            }
        }
    }
    Ok(mapped)
}

#[async_trait]
impl RecipeStore for SqliteRecipeStore {
    async fn create_row(&self, owner_uid: i64) -> DomainResult<i64> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        let tx = conn.transaction().map_err(db_err)?;
        tx.execute(
            "INSERT INTO recipes (owner_uid, title, is_vegan, is_published, course, save_token)
             VALUES (?, ?, 0, 0, 1, '')",
            params![owner_uid, Recipe::DEFAULT_TITLE],
        )
        .map_err(db_err)?;
        let id = tx.last_insert_rowid();

        insert_item(&tx, ListTable::Ingredients, id, 1, "")?;
        insert_item(&tx, ListTable::Directions, id, 1, "")?;
        tx.commit().map_err(db_err)?;

        Ok(id)
    }

    async fn load_row(&self, id: i64) -> DomainResult<Option<Recipe>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let recipe = conn
            .query_row(
                &format!("SELECT {} FROM recipes WHERE id = ?", RECIPE_COLUMNS),
                [id],
                row_to_recipe,
            )
            .optional()
            .map_err(db_err)?;

        match recipe {
            Some(recipe) => Ok(Some(with_lists(conn, recipe)?)),
            None => Ok(None),
        }
    }

    async fn save_row(&self, recipe: &Recipe) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        let tx = conn.transaction().map_err(db_err)?;
        let changed = tx
            .execute(
                "UPDATE recipes SET title = ?, is_vegan = ?, is_published = ?, course = ?,
                 notes = ?, courtesy_of = ?, save_token = ? WHERE id = ?",
                params![
                    recipe.title,
                    recipe.is_vegan as i64,
                    recipe.is_published as i64,
                    recipe.course,
                    recipe.notes,
                    recipe.courtesy_of,
                    recipe.save_token,
                    recipe.id
                ],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(DomainError::recipe_not_found());
        }

        for (table, items) in [
            (ListTable::Ingredients, &recipe.ingredients),
            (ListTable::Directions, &recipe.directions),
        ] {
            let plan = ListPlan {
                deleted_ids: Vec::new(),
                items: items
                    .iter()
                    .map(|i| PlannedItem::Keep {
                        id: i.id,
                        value: i.value.clone(),
                    })
                    .collect(),
            };
            apply_list(&tx, table, recipe.id, &plan)?;
        }

        tx.commit().map_err(db_err)?;
        Ok(())
    }

    async fn delete_row(&self, id: i64) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        let tx = conn.transaction().map_err(db_err)?;
        tx.execute("DELETE FROM ingredients WHERE recipe_id = ?", [id])
            .map_err(db_err)?;
        tx.execute("DELETE FROM directions WHERE recipe_id = ?", [id])
            .map_err(db_err)?;
        tx.execute("DELETE FROM recipes WHERE id = ?", [id])
            .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        Ok(())
    }

    async fn list_rows_by_owner(&self, owner_uid: i64) -> DomainResult<Vec<Recipe>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        query_recipes(conn, "owner_uid = ?", owner_uid)
    }

    async fn list_published_rows(&self) -> DomainResult<Vec<Recipe>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;
        query_recipes(conn, "is_published = ?", 1)
    }

    async fn count_rows_by_owner(&self, owner_uid: i64) -> DomainResult<usize> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM recipes WHERE owner_uid = ?",
                [owner_uid],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(count as usize)
    }

    async fn lock(&self) -> Option<StoreGuard> {
        tokio::time::timeout(self.lock_wait, self.write_lock.clone().lock_owned())
            .await
            .ok()
            .map(StoreGuard::new)
    }

    async fn commit_save(&self, plan: &SavePlan) -> DomainResult<CommitOutcome> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(not_initialized)?;

        let tx = conn.transaction().map_err(db_err)?;

        let changed = tx
            .execute(
                "UPDATE recipes SET title = ?, is_vegan = ?, is_published = ?, course = ?,
                 notes = ?, courtesy_of = ?, save_token = ? WHERE id = ?",
                params![
                    plan.title,
                    plan.is_vegan as i64,
                    plan.is_published as i64,
                    plan.course,
                    plan.notes,
                    plan.courtesy_of,
                    plan.save_token,
                    plan.recipe_id
                ],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(DomainError::recipe_not_found());
        }

        let mapped_ingredients = apply_list(&tx, ListTable::Ingredients, plan.recipe_id, &plan.ingredients)?;
        let mapped_directions = apply_list(&tx, ListTable::Directions, plan.recipe_id, &plan.directions)?;

        tx.commit().map_err(db_err)?;

        Ok(CommitOutcome {
            mapped_ingredients,
            mapped_directions,
        })
    }

    async fn store_token(&self, id: i64, token: &str) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let changed = conn
            .execute(
                "UPDATE recipes SET save_token = ? WHERE id = ?",
                params![token, id],
            )
            .map_err(db_err)?;

        if changed == 0 {
            return Err(DomainError::recipe_not_found());
        }
        Ok(())
    }
}
