//! JSON file backend.

use crate::{Repository, StoreError, Workspace};
use std::path::{Path, PathBuf};

/// Stores the workspace as one pretty-printed JSON file.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Repository for JsonFileStore {
    fn load(&self) -> Result<Workspace, StoreError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No workspace file, starting empty");
            return Ok(Workspace::default());
        }

        let text = std::fs::read_to_string(&self.path)?;
        let workspace: Workspace = serde_json::from_str(&text)?;
        workspace.check_version()?;
        Ok(workspace)
    }

    fn save(&self, workspace: &Workspace) -> Result<(), StoreError> {
        workspace.check_version()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(workspace)?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            projects = workspace.projects.len(),
            "Saved workspace"
        );
        Ok(())
    }
}
