//! Backend selection.

use crate::{JsonFileStore, MemoryStore, Repository, SqliteStore, StoreError, Workspace};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Storage backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON file
    Json,
    /// `SQLite` database
    Sqlite,
    /// Process memory
    Memory,
}

impl FromStr for StoreBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(StoreBackend::Json),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(StoreError::UnknownBackend(s.to_string())),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend kind
    pub backend: StoreBackend,
    /// File or database path (ignored by the memory backend)
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Json,
            path: PathBuf::from("./chanmap.json"),
        }
    }
}

/// Any of the built-in stores.
pub enum AnyStore {
    /// JSON file store
    Json(JsonFileStore),
    /// `SQLite` store
    Sqlite(SqliteStore),
    /// Memory store
    Memory(MemoryStore),
}

impl Repository for AnyStore {
    fn load(&self) -> Result<Workspace, StoreError> {
        match self {
            AnyStore::Json(store) => store.load(),
            AnyStore::Sqlite(store) => store.load(),
            AnyStore::Memory(store) => store.load(),
        }
    }

    fn save(&self, workspace: &Workspace) -> Result<(), StoreError> {
        match self {
            AnyStore::Json(store) => store.save(workspace),
            AnyStore::Sqlite(store) => store.save(workspace),
            AnyStore::Memory(store) => store.save(workspace),
        }
    }
}

/// Open the configured store.
///
/// # Errors
///
/// Returns error if the `SQLite` database cannot be opened.
pub fn open_store(config: &StoreConfig) -> Result<AnyStore, StoreError> {
    tracing::info!(backend = ?config.backend, path = %config.path.display(), "Opening store");
    Ok(match config.backend {
        StoreBackend::Json => AnyStore::Json(JsonFileStore::new(&config.path)),
        StoreBackend::Sqlite => AnyStore::Sqlite(SqliteStore::open(&config.path)?),
        StoreBackend::Memory => AnyStore::Memory(MemoryStore::new()),
    })
}
