//! `SQLite` backend.

use crate::{Repository, StoreError, Workspace};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

/// Stores the workspace document as a single row in a `SQLite` database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns error if database cannot be opened or initialized.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r"
            -- The whole workspace document, one row
            CREATE TABLE IF NOT EXISTS workspace_document (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                schema_version INTEGER NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }
}

impl Repository for SqliteStore {
    fn load(&self) -> Result<Workspace, StoreError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM workspace_document WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let Some(body) = body else {
            return Ok(Workspace::default());
        };

        let workspace: Workspace = serde_json::from_str(&body)?;
        workspace.check_version()?;
        Ok(workspace)
    }

    fn save(&self, workspace: &Workspace) -> Result<(), StoreError> {
        workspace.check_version()?;
        let body = serde_json::to_string(workspace)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r"
            INSERT OR REPLACE INTO workspace_document (id, schema_version, body, updated_at)
            VALUES (1, ?1, ?2, ?3)
            ",
            (workspace.schema_version, body, Utc::now().to_rfc3339()),
        )?;
        tx.commit()?;

        tracing::debug!(projects = workspace.projects.len(), "Saved workspace to sqlite");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Project;

    #[test]
    fn sqlite_store_basic_operations() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.load().unwrap(), Workspace::default());

        let mut ws = Workspace::default();
        let id = ws.insert_project(Project::new("Unit 1", "boiler house"));
        store.save(&ws).unwrap();

        // Second save replaces the row
        ws.project_mut(&id).unwrap().name = "Unit 2".to_string();
        store.save(&ws).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.project(&id).unwrap().name, "Unit 2");

        let rows: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM workspace_document", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
