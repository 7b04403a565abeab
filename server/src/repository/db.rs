//! Database Connection and Setup
//!
//! Opens the SQLite database, runs migrations, and owns the store-wide
//! write lock. The handle is opened once at start-up and closed explicitly
//! at shutdown; every store built from it fails after close.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};
use super::recipe_repo::SqliteRecipeStore;

pub(super) fn db_err(e: rusqlite::Error) -> DomainError {
    DomainError::Internal(e.to_string())
}

/// Database handle shared by every request
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Option<Connection>>>,
    write_lock: Arc<Mutex<()>>,
    lock_wait: Duration,
}

impl Database {
    /// Open (creating if needed) the database file at `path`
    pub fn open(path: &Path, lock_wait: Duration) -> DomainResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DomainError::Internal(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        Self::from_connection(conn, lock_wait)
    }

    pub fn open_in_memory(lock_wait: Duration) -> DomainResult<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::from_connection(conn, lock_wait)
    }

    fn from_connection(conn: Connection, lock_wait: Duration) -> DomainResult<Self> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            write_lock: Arc::new(Mutex::new(())),
            lock_wait,
        })
    }

    /// Recipe store over this connection
    pub fn recipe_store(&self) -> SqliteRecipeStore {
        SqliteRecipeStore::new(self.conn.clone(), self.write_lock.clone(), self.lock_wait)
    }

    /// Close the connection. Later operations fail with "Database not initialized".
    pub async fn close(&self) -> DomainResult<()> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, e)| db_err(e))?;
        }
        Ok(())
    }

    pub async fn is_open(&self) -> bool {
        self.conn.lock().await.is_some()
    }
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(db_err)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(db_err)?;

    for name in names {
        if name.map_err(db_err)? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_uid INTEGER NOT NULL,
            title TEXT NOT NULL,
            is_vegan INTEGER NOT NULL DEFAULT 0,
            is_published INTEGER NOT NULL DEFAULT 0,
            course INTEGER NOT NULL DEFAULT 1,
            notes TEXT,
            courtesy_of TEXT
        );

        CREATE TABLE IF NOT EXISTS ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            value TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS directions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            value TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_ingredients_recipe ON ingredients(recipe_id);
        CREATE INDEX IF NOT EXISTS idx_directions_recipe ON directions(recipe_id);
        CREATE INDEX IF NOT EXISTS idx_recipes_owner ON recipes(owner_uid);
        CREATE INDEX IF NOT EXISTS idx_recipes_published ON recipes(is_published);",
    )
    .map_err(db_err)?;

    // databases created before the edit lease existed have no token column
    if !column_exists(conn, "recipes", "save_token")? {
        conn.execute(
            "ALTER TABLE recipes ADD COLUMN save_token TEXT NOT NULL DEFAULT ''",
            [],
        )
        .map_err(db_err)?;
    }

    Ok(())
}
