//! # Chanmap Store
//!
//! Persistence for the chanmap workspace document.
//!
//! Every project, its point catalog, and its assignment schemes live in one
//! [`Workspace`] document. Mutations go through [`Repository::transaction`],
//! which loads the whole document, applies the change, and writes the whole
//! document back.
//!
//! ## Single writer
//!
//! Stores do not lock and do not check for concurrent modification. Two
//! processes writing the same store can lose updates: the last save wins.
//! Run one writer per store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod error;
pub mod json;
pub mod memory;
pub mod repository;
pub mod sqlite;

pub use config::{open_store, AnyStore, StoreBackend, StoreConfig};
pub use document::{Project, Workspace, SCHEMA_VERSION};
pub use error::StoreError;
pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use repository::Repository;
pub use sqlite::SqliteStore;
