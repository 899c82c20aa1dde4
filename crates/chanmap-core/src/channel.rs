//! PLC channel identifiers and the configured channel catalog.
//!
//! Channel ids are rendered `<TYPE>-<NN>` with a 1-based index zero-padded to
//! two digits (e.g. `AI-01`, `DI-15`). External consumers rely on this format.

use crate::signal::SignalType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Identifier of one channel: a type code and a 1-based index.
///
/// Ordering is by type (canonical order) and then index, which is also the
/// catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId {
    channel_type: SignalType,
    index: u32,
}

impl ChannelId {
    /// Create a channel id.
    #[must_use]
    pub fn new(channel_type: SignalType, index: u32) -> Self {
        Self {
            channel_type,
            index,
        }
    }

    /// Channel type.
    #[must_use]
    pub fn channel_type(&self) -> &SignalType {
        &self.channel_type
    }

    /// 1-based channel index.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.channel_type, self.index)
    }
}

impl FromStr for ChannelId {
    type Err = ChannelIdError;

    /// Parse `<TYPE>-<NN>`, splitting at the last `-`. Only the format is
    /// checked here; whether the type is configured and the index in range is
    /// the catalog's concern.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ChannelIdError::InvalidFormat(s.to_string());

        let (type_code, index) = s.trim().rsplit_once('-').ok_or_else(invalid)?;
        if type_code.is_empty()
            || type_code.chars().any(char::is_whitespace)
            || index.is_empty()
            || !index.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let index = index.parse::<u32>().map_err(|_| ChannelIdError::IndexOutOfRange {
            channel_type: type_code.to_string(),
            index: index.parse::<u64>().unwrap_or(u64::MAX),
            max: u32::MAX,
        })?;

        Ok(Self::new(SignalType::from(type_code), index))
    }
}

impl TryFrom<String> for ChannelId {
    type Error = ChannelIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.to_string()
    }
}

/// Errors from parsing or resolving a channel id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelIdError {
    /// Separator or numeric suffix is malformed
    #[error("invalid channel id format {0:?}, expected <TYPE>-<NN>")]
    InvalidFormat(String),
    /// Type code is not configured in the catalog
    #[error("unknown channel type {0}")]
    UnknownChannelType(String),
    /// Index is zero or above the configured count
    #[error("channel index {index} out of range for {channel_type} (1..={max})")]
    IndexOutOfRange {
        /// Channel type code
        channel_type: String,
        /// Requested index
        index: u64,
        /// Configured channel count
        max: u32,
    },
}

/// One channel as presented to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel id
    pub id: ChannelId,
    /// Channel type
    pub channel_type: SignalType,
    /// 1-based index
    pub index: u32,
    /// Human-readable description
    pub description: String,
    /// Whether the channel is free relative to the used set it was computed against
    pub is_available: bool,
}

impl ChannelInfo {
    fn new(id: ChannelId, is_available: bool) -> Self {
        Self {
            channel_type: id.channel_type().clone(),
            index: id.index(),
            description: format!("{} Channel {}", id.channel_type(), id.index()),
            id,
            is_available,
        }
    }
}

/// Channel count configured for one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTypeConfig {
    /// Channel type
    pub channel_type: SignalType,
    /// Number of channels, indices `1..=count`
    pub count: u32,
}

/// Ordered set of channel types and their counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ChannelTypeConfig>", into = "Vec<ChannelTypeConfig>")]
pub struct CatalogConfig {
    types: Vec<ChannelTypeConfig>,
}

/// Errors from building a [`CatalogConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogConfigError {
    /// The same type appears twice
    #[error("channel type {0} configured more than once")]
    DuplicateType(String),
    /// A type has no channels
    #[error("channel type {0} must have at least one channel")]
    ZeroCount(String),
    /// A `TYPE=COUNT` entry could not be parsed
    #[error("invalid channel count entry {0:?}, expected TYPE=COUNT")]
    InvalidEntry(String),
    /// A type code is empty or contains `-` or whitespace
    #[error("invalid channel type code {0:?}")]
    InvalidTypeCode(String),
}

impl CatalogConfig {
    /// Build a catalog configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a type code is empty or contains `-` or whitespace,
    /// or a type is repeated or has a zero count.
    pub fn new(types: Vec<ChannelTypeConfig>) -> Result<Self, CatalogConfigError> {
        let mut seen = HashSet::new();
        for entry in &types {
            let code = entry.channel_type.code();
            if code.is_empty() || code.chars().any(|c| c == '-' || c.is_whitespace()) {
                return Err(CatalogConfigError::InvalidTypeCode(code.to_string()));
            }
            if !seen.insert(&entry.channel_type) {
                return Err(CatalogConfigError::DuplicateType(
                    entry.channel_type.to_string(),
                ));
            }
            if entry.count == 0 {
                return Err(CatalogConfigError::ZeroCount(entry.channel_type.to_string()));
            }
        }
        Ok(Self { types })
    }

    /// Parse a `AI=32,DI=64` style list.
    ///
    /// # Errors
    ///
    /// Returns error on a malformed entry, a repeated type, or a zero count.
    pub fn parse_counts(raw: &str) -> Result<Self, CatalogConfigError> {
        let mut types = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let invalid = || CatalogConfigError::InvalidEntry(entry.to_string());
            let (code, count) = entry.split_once('=').ok_or_else(invalid)?;
            let count = count.trim().parse::<u32>().map_err(|_| invalid())?;
            if code.trim().is_empty() {
                return Err(invalid());
            }
            types.push(ChannelTypeConfig {
                channel_type: SignalType::from(code),
                count,
            });
        }
        Self::new(types)
    }

    /// Configured count for a type.
    #[must_use]
    pub fn count(&self, channel_type: &SignalType) -> Option<u32> {
        self.types
            .iter()
            .find(|entry| &entry.channel_type == channel_type)
            .map(|entry| entry.count)
    }

    /// Configured types in configuration order.
    pub fn types(&self) -> impl Iterator<Item = &SignalType> {
        self.types.iter().map(|entry| &entry.channel_type)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            types: vec![
                ChannelTypeConfig {
                    channel_type: SignalType::Ai,
                    count: 32,
                },
                ChannelTypeConfig {
                    channel_type: SignalType::Di,
                    count: 64,
                },
                ChannelTypeConfig {
                    channel_type: SignalType::Ao,
                    count: 16,
                },
                ChannelTypeConfig {
                    channel_type: SignalType::Do,
                    count: 32,
                },
            ],
        }
    }
}

impl TryFrom<Vec<ChannelTypeConfig>> for CatalogConfig {
    type Error = CatalogConfigError;

    fn try_from(types: Vec<ChannelTypeConfig>) -> Result<Self, Self::Error> {
        Self::new(types)
    }
}

impl From<CatalogConfig> for Vec<ChannelTypeConfig> {
    fn from(config: CatalogConfig) -> Self {
        config.types
    }
}

/// Usage figures for one channel type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Channel type
    pub channel_type: SignalType,
    /// Configured channels
    pub total: u32,
    /// Channels in the used set
    pub used: u32,
    /// `total - used`
    pub available: u32,
    /// `used / total`
    pub usage_rate: f64,
}

/// Suggested channels for one requested type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSuggestion {
    /// Channel type
    pub channel_type: SignalType,
    /// Number of channels asked for
    pub requested: usize,
    /// First free channels, at most `requested`
    pub channels: Vec<ChannelId>,
}

impl ChannelSuggestion {
    /// Whether every requested channel could be suggested.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.channels.len() >= self.requested
    }
}

/// Enumerates channels for the configured types.
#[derive(Debug, Clone, Default)]
pub struct ChannelCatalog {
    config: CatalogConfig,
}

impl ChannelCatalog {
    /// Create a catalog over the given configuration.
    #[must_use]
    pub fn new(config: CatalogConfig) -> Self {
        tracing::info!(
            types = ?config.types().map(SignalType::code).collect::<Vec<_>>(),
            "Channel catalog initialized"
        );
        Self { config }
    }

    /// All channels of a type in index order, flagged against `used`.
    ///
    /// Unknown types yield an empty list.
    #[must_use]
    pub fn get_channels(
        &self,
        channel_type: &SignalType,
        used: &HashSet<ChannelId>,
    ) -> Vec<ChannelInfo> {
        let Some(count) = self.config.count(channel_type) else {
            tracing::warn!(%channel_type, "Unknown channel type");
            return Vec::new();
        };

        (1..=count)
            .map(|index| {
                let id = ChannelId::new(channel_type.clone(), index);
                let is_available = !used.contains(&id);
                ChannelInfo::new(id, is_available)
            })
            .collect()
    }

    /// Channels of every configured type, in configuration order.
    #[must_use]
    pub fn get_all_channels(&self, used: &HashSet<ChannelId>) -> Vec<(SignalType, Vec<ChannelInfo>)> {
        self.config
            .types()
            .map(|channel_type| (channel_type.clone(), self.get_channels(channel_type, used)))
            .collect()
    }

    /// Parse and resolve a channel id string against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelIdError::InvalidFormat`] for a malformed id,
    /// [`ChannelIdError::UnknownChannelType`] for an unconfigured type, and
    /// [`ChannelIdError::IndexOutOfRange`] for an index outside `1..=count`.
    pub fn get_channel_info(&self, channel_id: &str) -> Result<ChannelInfo, ChannelIdError> {
        let id: ChannelId = match channel_id.parse() {
            Ok(id) => id,
            Err(ChannelIdError::IndexOutOfRange {
                channel_type,
                index,
                ..
            }) => {
                let max = self
                    .config
                    .count(&SignalType::from(channel_type.as_str()))
                    .ok_or_else(|| ChannelIdError::UnknownChannelType(channel_type.clone()))?;
                return Err(ChannelIdError::IndexOutOfRange {
                    channel_type,
                    index,
                    max,
                });
            }
            Err(err) => return Err(err),
        };
        self.resolve(&id)
    }

    /// Resolve an already parsed channel id against the catalog.
    ///
    /// # Errors
    ///
    /// Returns error if the type is not configured or the index is out of range.
    pub fn resolve(&self, id: &ChannelId) -> Result<ChannelInfo, ChannelIdError> {
        let count = self.config.count(id.channel_type()).ok_or_else(|| {
            ChannelIdError::UnknownChannelType(id.channel_type().to_string())
        })?;

        if id.index() == 0 || id.index() > count {
            return Err(ChannelIdError::IndexOutOfRange {
                channel_type: id.channel_type().to_string(),
                index: u64::from(id.index()),
                max: count,
            });
        }

        Ok(ChannelInfo::new(id.clone(), true))
    }

    /// Whether `channel_id` is a valid channel, optionally of `expected_type`.
    #[must_use]
    pub fn validate(&self, channel_id: &str, expected_type: Option<&SignalType>) -> bool {
        match self.get_channel_info(channel_id) {
            Ok(info) => expected_type.map_or(true, |expected| &info.channel_type == expected),
            Err(err) => {
                tracing::debug!(channel_id, error = %err, "Channel id rejected");
                false
            }
        }
    }

    /// First free channel of a type.
    #[must_use]
    pub fn next_available(
        &self,
        channel_type: &SignalType,
        used: &HashSet<ChannelId>,
    ) -> Option<ChannelInfo> {
        let next = self
            .get_channels(channel_type, used)
            .into_iter()
            .find(|channel| channel.is_available);
        if next.is_none() {
            tracing::warn!(%channel_type, "No available channels");
        }
        next
    }

    /// Per-type usage figures for every configured type.
    #[must_use]
    pub fn statistics(&self, used: &HashSet<ChannelId>) -> Vec<ChannelStats> {
        self.config
            .types
            .iter()
            .map(|entry| {
                let used_count = used
                    .iter()
                    .filter(|id| id.channel_type() == &entry.channel_type)
                    .filter(|id| id.index() >= 1 && id.index() <= entry.count)
                    .count();
                let used_count = u32::try_from(used_count).unwrap_or(u32::MAX);
                ChannelStats {
                    channel_type: entry.channel_type.clone(),
                    total: entry.count,
                    used: used_count,
                    available: entry.count.saturating_sub(used_count),
                    usage_rate: f64::from(used_count) / f64::from(entry.count),
                }
            })
            .collect()
    }

    /// Suggest the first free channels for each requested type.
    ///
    /// Suggested ids are added to `used` as they are picked, so later types
    /// never see them as free. The result is a plan, not a reservation.
    /// Unknown types are skipped.
    #[must_use]
    pub fn suggest_channels(
        &self,
        counts_by_type: &[(SignalType, usize)],
        used: &mut HashSet<ChannelId>,
    ) -> Vec<ChannelSuggestion> {
        let mut suggestions = Vec::with_capacity(counts_by_type.len());

        for (channel_type, requested) in counts_by_type {
            if self.config.count(channel_type).is_none() {
                tracing::warn!(%channel_type, "Unknown signal type, no channels suggested");
                continue;
            }

            let channels: Vec<ChannelId> = self
                .get_channels(channel_type, used)
                .into_iter()
                .filter(|channel| channel.is_available)
                .take(*requested)
                .map(|channel| channel.id)
                .collect();

            if channels.len() < *requested {
                tracing::warn!(
                    %channel_type,
                    need = requested,
                    available = channels.len(),
                    "Not enough available channels"
                );
            }

            used.extend(channels.iter().cloned());
            suggestions.push(ChannelSuggestion {
                channel_type: channel_type.clone(),
                requested: *requested,
                channels,
            });
        }

        suggestions
    }
}
