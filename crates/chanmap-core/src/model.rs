//! Points, mappings, and assignment schemes.

use crate::channel::ChannelId;
use crate::signal::SignalType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// An instrument point as produced by the document parser.
///
/// Read-only to the assignment engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Point identifier, unique within a project
    pub id: String,
    /// Instrument tag (e.g. `PT-1001`)
    pub instrument_tag: String,
    /// Signal type
    pub signal_type: SignalType,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Engineering units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Measurement range as written in the source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_range: Option<String>,
}

impl Point {
    /// Create a point with no descriptive attributes.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        instrument_tag: impl Into<String>,
        signal_type: SignalType,
    ) -> Self {
        Self {
            id: id.into(),
            instrument_tag: instrument_tag.into(),
            signal_type,
            description: String::new(),
            units: None,
            data_range: None,
        }
    }
}

/// Read access to a project's point catalog.
pub trait PointCatalog {
    /// All points in catalog order.
    fn points(&self) -> &[Point];

    /// Look up a point by id.
    fn point(&self, point_id: &str) -> Option<&Point> {
        self.points().iter().find(|p| p.id == point_id)
    }
}

impl PointCatalog for [Point] {
    fn points(&self) -> &[Point] {
        self
    }
}

impl PointCatalog for Vec<Point> {
    fn points(&self) -> &[Point] {
        self
    }
}

/// One point-to-channel binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// Mapped point id
    pub point_id: String,
    /// Channel holding the point
    pub channel_id: ChannelId,
    /// Channel type recorded at assignment time
    pub channel_type: SignalType,
    /// Assignment time
    pub assigned_at: DateTime<Utc>,
}

impl Mapping {
    /// Create a mapping stamped with the current time.
    #[must_use]
    pub fn new(point_id: impl Into<String>, channel_id: ChannelId) -> Self {
        Self {
            point_id: point_id.into(),
            channel_type: channel_id.channel_type().clone(),
            channel_id,
            assigned_at: Utc::now(),
        }
    }
}

/// A named, independently mutable set of mappings within a project.
///
/// [`Scheme::upsert`] keeps channel and point ids unique as long as callers
/// check [`Scheme::channel_holder`] first. Documents loaded from disk are not
/// re-checked here; see the engine's scheme validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    /// Scheme id (UUID v4)
    pub id: String,
    /// Owning project id
    pub project_id: String,
    /// Scheme name, unique within the project
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Mappings in insertion order
    #[serde(rename = "assignments", default)]
    pub mappings: Vec<Mapping>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Scheme {
    /// Create an empty scheme with a fresh id.
    #[must_use]
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            name: name.into(),
            description: description.into(),
            mappings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Mapping of a point, if any.
    #[must_use]
    pub fn mapping_for(&self, point_id: &str) -> Option<&Mapping> {
        self.mappings.iter().find(|m| m.point_id == point_id)
    }

    /// Point id currently holding a channel.
    #[must_use]
    pub fn channel_holder(&self, channel_id: &ChannelId) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| &m.channel_id == channel_id)
            .map(|m| m.point_id.as_str())
    }

    /// Channels in use.
    #[must_use]
    pub fn used_channels(&self) -> HashSet<ChannelId> {
        self.mappings.iter().map(|m| m.channel_id.clone()).collect()
    }

    /// Points that have a mapping.
    #[must_use]
    pub fn assigned_point_ids(&self) -> HashSet<&str> {
        self.mappings.iter().map(|m| m.point_id.as_str()).collect()
    }

    /// Insert a mapping, replacing any prior mapping of the same point.
    pub fn upsert(&mut self, mapping: Mapping) {
        self.mappings.retain(|m| m.point_id != mapping.point_id);
        self.mappings.push(mapping);
        self.touch();
    }

    /// Remove a point's mapping. Returns whether one was removed.
    pub fn remove(&mut self, point_id: &str) -> bool {
        let before = self.mappings.len();
        self.mappings.retain(|m| m.point_id != point_id);
        let removed = self.mappings.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Remove every mapping. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.mappings.len();
        self.mappings.clear();
        self.touch();
        removed
    }

    /// Number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether the scheme has no mappings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Bump `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(raw: &str) -> ChannelId {
        raw.parse().unwrap()
    }

    #[test]
    fn upsert_replaces_prior_mapping_of_point() {
        let mut scheme = Scheme::new("p1", "Main", "");
        scheme.upsert(Mapping::new("pt-1", ch("AI-01")));
        scheme.upsert(Mapping::new("pt-1", ch("AI-02")));

        assert_eq!(scheme.len(), 1);
        assert_eq!(scheme.mapping_for("pt-1").unwrap().channel_id, ch("AI-02"));
        assert_eq!(scheme.channel_holder(&ch("AI-01")), None);
        assert_eq!(scheme.channel_holder(&ch("AI-02")), Some("pt-1"));
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut scheme = Scheme::new("p1", "Main", "");
        scheme.upsert(Mapping::new("pt-1", ch("DI-01")));
        let stamp = scheme.updated_at;

        assert!(!scheme.remove("pt-9"));
        assert_eq!(scheme.updated_at, stamp);
        assert!(scheme.remove("pt-1"));
        assert!(scheme.is_empty());
    }

    #[test]
    fn mapping_records_channel_type() {
        let mapping = Mapping::new("pt-1", ch("do-3"));
        assert_eq!(mapping.channel_type, SignalType::Do);
        assert_eq!(mapping.channel_id.to_string(), "DO-03");
    }

    #[test]
    fn scheme_document_shape() {
        let mut scheme = Scheme::new("p1", "Main", "first pass");
        scheme.upsert(Mapping::new("pt-1", ch("AI-01")));

        let json = serde_json::to_value(&scheme).unwrap();
        assert_eq!(json["assignments"][0]["channel_id"], "AI-01");
        assert_eq!(json["assignments"][0]["channel_type"], "AI");
        assert!(json["created_at"].as_str().unwrap().contains('T'));

        let back: Scheme = serde_json::from_value(json).unwrap();
        assert_eq!(back, scheme);
    }

    #[test]
    fn point_catalog_lookup() {
        let points = vec![
            Point::new("a", "PT-1", SignalType::Ai),
            Point::new("b", "XV-1", SignalType::Do),
        ];
        assert_eq!(points.point("b").unwrap().instrument_tag, "XV-1");
        assert!(points.point("c").is_none());
    }
}
