//! Engine error types.

use chanmap_core::{ChannelIdError, PlanError};
use chanmap_store::StoreError;
use thiserror::Error;

/// Assignment engine errors.
#[derive(Debug, Error)]
pub enum AssignError {
    /// No project with this id
    #[error("project {0} not found")]
    ProjectNotFound(String),

    /// No scheme with this id in the project
    #[error("scheme {scheme_id} not found in project {project_id}")]
    SchemeNotFound {
        /// Project id
        project_id: String,
        /// Scheme id
        scheme_id: String,
    },

    /// No point with this id in the project's catalog
    #[error("point {point_id} not found in project {project_id}")]
    PointNotFound {
        /// Project id
        project_id: String,
        /// Point id
        point_id: String,
    },

    /// Channel id is malformed or not in the catalog
    #[error("invalid channel {channel_id}: {source}")]
    InvalidChannel {
        /// Channel id as given
        channel_id: String,
        /// Parse or lookup failure
        source: ChannelIdError,
    },

    /// Point signal type differs from the channel type
    #[error("type mismatch: point {instrument_tag} is {point_type} but channel {channel_id} is {channel_type}")]
    TypeMismatch {
        /// Point instrument tag
        instrument_tag: String,
        /// Point signal type
        point_type: String,
        /// Channel id
        channel_id: String,
        /// Channel type
        channel_type: String,
    },

    /// Channel is held by another point in the scheme
    #[error("channel {channel_id} is already assigned to point {holder}")]
    ChannelAlreadyAssigned {
        /// Channel id
        channel_id: String,
        /// Point holding the channel
        holder: String,
    },

    /// Scheme name already used in the project
    #[error("scheme {name:?} already exists in project {project_id}")]
    DuplicateSchemeName {
        /// Project id
        project_id: String,
        /// Scheme name
        name: String,
    },

    /// Imported catalog repeats a point id
    #[error("point id {0} appears more than once in the imported catalog")]
    DuplicatePointId(String),

    /// Address planning failed
    #[error(transparent)]
    Planning(#[from] PlanError),

    /// Store failure
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl AssignError {
    /// Stable error kind name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            AssignError::ProjectNotFound(_) => "ProjectNotFound",
            AssignError::SchemeNotFound { .. } => "SchemeNotFound",
            AssignError::PointNotFound { .. } => "PointNotFound",
            AssignError::InvalidChannel { source, .. } => match source {
                ChannelIdError::InvalidFormat(_) => "InvalidChannelIdFormat",
                ChannelIdError::UnknownChannelType(_) => "UnknownChannelType",
                ChannelIdError::IndexOutOfRange { .. } => "ChannelIndexOutOfRange",
            },
            AssignError::TypeMismatch { .. } => "TypeMismatch",
            AssignError::ChannelAlreadyAssigned { .. } => "ChannelAlreadyAssigned",
            AssignError::DuplicateSchemeName { .. } => "DuplicateSchemeName",
            AssignError::DuplicatePointId(_) => "DuplicatePointId",
            AssignError::Planning(_) => "PlanningError",
            AssignError::Persistence(_) => "PersistenceError",
        }
    }

    pub(crate) fn invalid_channel(channel_id: &str, source: ChannelIdError) -> Self {
        AssignError::InvalidChannel {
            channel_id: channel_id.to_string(),
            source,
        }
    }
}
