//! # Chanmap Engine
//!
//! Business operations over the chanmap workspace: projects and their point
//! catalogs, assignment schemes, manual and automatic point-to-channel
//! assignment, scheme validation, and address plan assembly for exporters.
//!
//! Every mutation runs inside one [`chanmap_store::Repository::transaction`],
//! so a failed operation leaves the stored document untouched.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod report;

pub use config::EngineConfig;
pub use engine::AssignmentEngine;
pub use error::AssignError;
pub use report::{
    AddressPlan, AssignmentFailure, AssignmentRecord, AssignmentStatistics, AutoAssignSummary,
    OptimalSuggestion, ProjectSummary, SchemeOverview, SchemeSummary, SkippedPoint,
    TypeBreakdown, ValidationReport,
};
