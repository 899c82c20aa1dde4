//! The persisted workspace document.

use chanmap_core::{Point, PointCatalog, Scheme};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Current document schema version.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A project: its point catalog and its assignment schemes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project id (UUID v4)
    pub id: String,
    /// Project name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Point catalog as stored by the document parser
    #[serde(default)]
    pub points: Vec<Point>,
    /// Assignment schemes
    #[serde(default)]
    pub schemes: Vec<Scheme>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create an empty project with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            points: Vec::new(),
            schemes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Scheme by id.
    #[must_use]
    pub fn scheme(&self, scheme_id: &str) -> Option<&Scheme> {
        self.schemes.iter().find(|s| s.id == scheme_id)
    }

    /// Mutable scheme by id.
    pub fn scheme_mut(&mut self, scheme_id: &str) -> Option<&mut Scheme> {
        self.schemes.iter_mut().find(|s| s.id == scheme_id)
    }

    /// Scheme by name.
    #[must_use]
    pub fn scheme_by_name(&self, name: &str) -> Option<&Scheme> {
        self.schemes.iter().find(|s| s.name == name)
    }

    /// Bump `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl PointCatalog for Project {
    fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Everything a store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Document schema version
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Projects keyed by id
    #[serde(default)]
    pub projects: BTreeMap<String, Project>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            projects: BTreeMap::new(),
        }
    }
}

impl Workspace {
    /// Project by id.
    #[must_use]
    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.get(project_id)
    }

    /// Mutable project by id.
    pub fn project_mut(&mut self, project_id: &str) -> Option<&mut Project> {
        self.projects.get_mut(project_id)
    }

    /// Add a project, returning its id.
    pub fn insert_project(&mut self, project: Project) -> String {
        let id = project.id.clone();
        self.projects.insert(id.clone(), project);
        id
    }

    pub(crate) fn check_version(&self) -> Result<(), crate::StoreError> {
        if self.schema_version == SCHEMA_VERSION {
            Ok(())
        } else {
            Err(crate::StoreError::UnsupportedSchemaVersion(
                self.schema_version,
            ))
        }
    }
}
