//! Store error types.

use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File system failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be encoded or decoded
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database failure
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Document was written by an incompatible version
    #[error("unsupported schema_version: {0}")]
    UnsupportedSchemaVersion(u32),

    /// Backend name not recognized
    #[error("unknown store backend {0:?}, expected json, sqlite, or memory")]
    UnknownBackend(String),
}
