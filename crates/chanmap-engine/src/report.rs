//! Result records returned by engine operations.
//!
//! All records are plain data with serde derives so the CLI and exporters can
//! emit them as JSON.

use chanmap_core::{
    AddressState, AllocatedAddressSet, ChannelId, ChannelStats, ChannelSuggestion, SignalType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Project listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    /// Project id
    pub id: String,
    /// Project name
    pub name: String,
    /// Description
    pub description: String,
    /// Points in the catalog
    pub point_count: usize,
    /// Schemes in the project
    pub scheme_count: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

/// Scheme listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeSummary {
    /// Scheme id
    pub id: String,
    /// Scheme name
    pub name: String,
    /// Description
    pub description: String,
    /// Number of mappings
    pub assignment_count: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

/// One point placed by auto-assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Point id
    pub point_id: String,
    /// Point instrument tag
    pub point_tag: String,
    /// Channel the point was placed on
    pub channel_id: ChannelId,
}

/// One point auto-assignment could not place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentFailure {
    /// Point id
    pub point_id: String,
    /// Point instrument tag
    pub instrument_tag: String,
    /// Point signal type
    pub signal_type: SignalType,
    /// Why the point was not placed
    pub reason: String,
}

/// Outcome of an auto-assignment batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAssignSummary {
    /// Candidate points considered
    pub total_points: usize,
    /// Points placed
    pub assigned: usize,
    /// Points left unplaced
    pub failed: usize,
    /// Placements in processing order
    pub assignments: Vec<AssignmentRecord>,
    /// One entry per unplaced point
    pub failures: Vec<AssignmentFailure>,
    /// Per-type shortfall messages and per-point failure reasons
    pub errors: Vec<String>,
}

/// Points of one type and how many are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    /// Points of the type in the catalog
    pub total: usize,
    /// Of those, points with a mapping
    pub assigned: usize,
}

/// Progress summary of one scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeOverview {
    /// Project id
    pub project_id: String,
    /// Project name
    pub project_name: String,
    /// Scheme id
    pub scheme_id: String,
    /// Scheme name
    pub scheme_name: String,
    /// Points in the catalog
    pub total_points: usize,
    /// Catalog points with a mapping
    pub assigned_points: usize,
    /// Catalog points without a mapping
    pub unassigned_points: usize,
    /// `assigned_points / total_points`, 0 for an empty catalog
    pub coverage: f64,
    /// Per signal type breakdown
    pub points_by_type: BTreeMap<SignalType, TypeBreakdown>,
    /// Channel usage per configured type
    pub channel_statistics: Vec<ChannelStats>,
    /// Scheme creation time
    pub created_at: DateTime<Utc>,
    /// Scheme last mutation time
    pub updated_at: DateTime<Utc>,
}

/// Scheme validation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// No fatal errors
    pub valid: bool,
    /// Fatal conflicts
    pub errors: Vec<String>,
    /// Non-fatal findings
    pub warnings: Vec<String>,
    /// Mappings in the scheme
    pub total_assignments: usize,
    /// Points in the catalog
    pub total_points: usize,
    /// Share of catalog points with a mapping
    pub coverage: f64,
}

/// Channel suggestions for every unassigned point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimalSuggestion {
    /// Every type's unassigned points fit in its free channels
    pub feasible: bool,
    /// Unassigned points per type
    pub unassigned_by_type: BTreeMap<SignalType, usize>,
    /// Suggested channels per type
    pub suggestions: Vec<ChannelSuggestion>,
}

/// Assignment counts of one scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentStatistics {
    /// Scheme id
    pub scheme_id: String,
    /// Scheme name
    pub scheme_name: String,
    /// Mappings in the scheme
    pub total_assignments: usize,
    /// Mappings per channel type
    pub by_channel_type: BTreeMap<SignalType, usize>,
    /// Channels in use, in catalog order
    pub used_channels: Vec<ChannelId>,
    /// Scheme creation time
    pub created_at: DateTime<Utc>,
    /// Scheme last mutation time
    pub updated_at: DateTime<Utc>,
}

/// A mapping the address planner did not plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPoint {
    /// Point id
    pub point_id: String,
    /// Channel of the mapping
    pub channel_id: ChannelId,
    /// Why it was skipped
    pub reason: String,
}

/// Address plan of a whole scheme, ready for exporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPlan {
    /// Project id
    pub project_id: String,
    /// Scheme id
    pub scheme_id: String,
    /// Planned points in channel order
    pub points: Vec<AllocatedAddressSet>,
    /// Mappings that could not be planned
    pub skipped: Vec<SkippedPoint>,
    /// Allocator counters after the last point
    pub next_state: AddressState,
}
