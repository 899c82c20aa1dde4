//! In-memory backend for tests and dry runs.

use crate::{Repository, StoreError, Workspace};
use std::cell::RefCell;

/// Keeps the workspace in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    workspace: RefCell<Workspace>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a workspace.
    #[must_use]
    pub fn with_workspace(workspace: Workspace) -> Self {
        Self {
            workspace: RefCell::new(workspace),
        }
    }
}

impl Repository for MemoryStore {
    fn load(&self) -> Result<Workspace, StoreError> {
        Ok(self.workspace.borrow().clone())
    }

    fn save(&self, workspace: &Workspace) -> Result<(), StoreError> {
        workspace.check_version()?;
        *self.workspace.borrow_mut() = workspace.clone();
        Ok(())
    }
}
