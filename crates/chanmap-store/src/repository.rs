//! The repository abstraction and its transaction boundary.

use crate::{StoreError, Workspace};

/// Whole-document storage.
pub trait Repository {
    /// Load the workspace. A store that has never been written yields an
    /// empty workspace.
    ///
    /// # Errors
    ///
    /// Returns error if the document cannot be read or decoded.
    fn load(&self) -> Result<Workspace, StoreError>;

    /// Replace the stored workspace.
    ///
    /// # Errors
    ///
    /// Returns error if the document cannot be written.
    fn save(&self, workspace: &Workspace) -> Result<(), StoreError>;

    /// Load, apply `f`, and save only if `f` succeeded.
    ///
    /// This is the one transaction boundary for mutations. If `f` returns
    /// `Err`, nothing is written.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or a store error converted into `E`.
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Workspace) -> Result<T, E>,
    {
        let mut workspace = self.load()?;
        let output = f(&mut workspace)?;
        self.save(&workspace)?;
        Ok(output)
    }
}

impl<R: Repository + ?Sized> Repository for &R {
    fn load(&self) -> Result<Workspace, StoreError> {
        (**self).load()
    }

    fn save(&self, workspace: &Workspace) -> Result<(), StoreError> {
        (**self).save(workspace)
    }
}
