//! Per-point address planning driven by a declarative rule table.
//!
//! Every point gets one primary address of its channel's value kind. The
//! [`RuleTable`] then lists, per channel type, the auxiliary roles to allocate
//! after it. Adding a policy for a new channel type is a table entry.

use crate::address::{AddressAllocator, AddressError, AddressTranslator, AllocatorConfig};
use crate::address::{AddressState, TranslatorConfig};
use crate::channel::ChannelId;
use crate::model::Point;
use crate::signal::{SignalType, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Auxiliary address roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxRole {
    /// Low-low setpoint
    SllSetpoint,
    /// Low setpoint
    SlSetpoint,
    /// High setpoint
    ShSetpoint,
    /// High-high setpoint
    ShhSetpoint,
    /// Low-low alarm flag
    LlAlarm,
    /// Low alarm flag
    LAlarm,
    /// High alarm flag
    HAlarm,
    /// High-high alarm flag
    HhAlarm,
    /// Maintenance value
    MaintenanceValue,
    /// Maintenance enable flag
    MaintenanceEnable,
}

impl AuxRole {
    /// Full analog input policy in allocation order.
    pub const ANALOG_INPUT: [AuxRole; 10] = [
        AuxRole::SllSetpoint,
        AuxRole::SlSetpoint,
        AuxRole::ShSetpoint,
        AuxRole::ShhSetpoint,
        AuxRole::LlAlarm,
        AuxRole::LAlarm,
        AuxRole::HAlarm,
        AuxRole::HhAlarm,
        AuxRole::MaintenanceValue,
        AuxRole::MaintenanceEnable,
    ];

    /// Value kind of the role's address.
    #[must_use]
    pub fn value_kind(self) -> ValueKind {
        match self {
            AuxRole::SllSetpoint
            | AuxRole::SlSetpoint
            | AuxRole::ShSetpoint
            | AuxRole::ShhSetpoint
            | AuxRole::MaintenanceValue => ValueKind::Real,
            AuxRole::LlAlarm
            | AuxRole::LAlarm
            | AuxRole::HAlarm
            | AuxRole::HhAlarm
            | AuxRole::MaintenanceEnable => ValueKind::Bool,
        }
    }

    /// Role name as exported.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AuxRole::SllSetpoint => "sll_setpoint",
            AuxRole::SlSetpoint => "sl_setpoint",
            AuxRole::ShSetpoint => "sh_setpoint",
            AuxRole::ShhSetpoint => "shh_setpoint",
            AuxRole::LlAlarm => "ll_alarm",
            AuxRole::LAlarm => "l_alarm",
            AuxRole::HAlarm => "h_alarm",
            AuxRole::HhAlarm => "hh_alarm",
            AuxRole::MaintenanceValue => "maintenance_value",
            AuxRole::MaintenanceEnable => "maintenance_enable",
        }
    }
}

impl std::fmt::Display for AuxRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered auxiliary roles per channel type.
///
/// Serialized as a JSON object keyed by type code, e.g.
/// `{"AI": ["sll_setpoint", "maintenance_enable"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: BTreeMap<SignalType, Vec<AuxRole>>,
}

impl RuleTable {
    /// Table with no auxiliary roles.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Default policy: analog inputs get the ten setpoint, alarm, and
    /// maintenance roles; other types get none.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.set(SignalType::Ai, AuxRole::ANALOG_INPUT.to_vec());
        table
    }

    /// Standard policy plus maintenance value/enable on analog outputs.
    #[must_use]
    pub fn with_output_maintenance() -> Self {
        let mut table = Self::standard();
        table.set(
            SignalType::Ao,
            vec![AuxRole::MaintenanceValue, AuxRole::MaintenanceEnable],
        );
        table
    }

    /// Replace the roles of one channel type.
    pub fn set(&mut self, channel_type: SignalType, roles: Vec<AuxRole>) {
        self.rules.insert(channel_type, roles);
    }

    /// Roles for a channel type, empty if none are configured.
    #[must_use]
    pub fn rules_for(&self, channel_type: &SignalType) -> &[AuxRole] {
        self.rules.get(channel_type).map_or(&[][..], Vec::as_slice)
    }
}

/// An internal address with its external bus address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAddress {
    /// Internal token, e.g. `%MD320`
    pub internal: String,
    /// External bus address, empty if the address has none
    pub external: String,
}

/// One auxiliary address of a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryAddress {
    /// Role
    pub role: AuxRole,
    /// Internal token
    pub internal: String,
    /// External bus address
    pub external: String,
}

/// Full address plan of one point, as handed to exporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedAddressSet {
    /// Point id
    pub point_id: String,
    /// Instrument tag
    pub instrument_tag: String,
    /// Channel id
    pub channel_id: ChannelId,
    /// Channel type
    pub channel_type: SignalType,
    /// Primary address
    pub primary: PlannedAddress,
    /// Auxiliary addresses in rule table order
    pub auxiliaries: Vec<AuxiliaryAddress>,
}

impl AllocatedAddressSet {
    /// Primary plus auxiliary entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        1 + self.auxiliaries.len()
    }
}

/// Planning errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// Channel type has no value kind, so no primary address exists
    #[error("point {point_id} on {channel_type} channel has no addressable value kind")]
    NoValueKind {
        /// Point id
        point_id: String,
        /// Channel type
        channel_type: String,
    },
    /// Allocation failed
    #[error("address allocation failed: {0}")]
    Address(#[from] AddressError),
}

/// Plans addresses for points in processing order from one shared allocator.
#[derive(Debug)]
pub struct ModuleAddressPlanner {
    allocator: AddressAllocator,
    translator: AddressTranslator,
    rules: RuleTable,
}

impl ModuleAddressPlanner {
    /// Create a planner with a fresh allocator.
    #[must_use]
    pub fn new(allocator: &AllocatorConfig, translator: TranslatorConfig, rules: RuleTable) -> Self {
        Self {
            allocator: AddressAllocator::new(allocator),
            translator: AddressTranslator::new(translator),
            rules,
        }
    }

    /// Plan the primary and auxiliary addresses of a point on `channel_id`.
    ///
    /// The value kind comes from the channel type.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::NoValueKind`] for channel types without a value
    /// kind, and [`PlanError::Address`] if an address space is exhausted.
    pub fn plan_point(
        &mut self,
        point: &Point,
        channel_id: &ChannelId,
    ) -> Result<AllocatedAddressSet, PlanError> {
        let channel_type = channel_id.channel_type();
        let kind = channel_type
            .value_kind()
            .ok_or_else(|| PlanError::NoValueKind {
                point_id: point.id.clone(),
                channel_type: channel_type.to_string(),
            })?;

        let primary = self.allocate(kind)?;

        let roles = self.rules.rules_for(channel_type).to_vec();
        let mut auxiliaries = Vec::with_capacity(roles.len());
        for role in roles {
            let planned = self.allocate(role.value_kind())?;
            auxiliaries.push(AuxiliaryAddress {
                role,
                internal: planned.internal,
                external: planned.external,
            });
        }

        tracing::debug!(
            point_id = %point.id,
            channel_id = %channel_id,
            primary = %primary.internal,
            auxiliaries = auxiliaries.len(),
            "Planned point addresses"
        );

        Ok(AllocatedAddressSet {
            point_id: point.id.clone(),
            instrument_tag: point.instrument_tag.clone(),
            channel_id: channel_id.clone(),
            channel_type: channel_type.clone(),
            primary,
            auxiliaries,
        })
    }

    fn allocate(&mut self, kind: ValueKind) -> Result<PlannedAddress, PlanError> {
        let address = self.allocator.allocate(kind)?;
        Ok(PlannedAddress {
            internal: address.to_string(),
            external: self
                .translator
                .translate_address(&address)
                .map(|external| external.to_string())
                .unwrap_or_default(),
        })
    }

    /// Allocator counters after the points planned so far.
    #[must_use]
    pub fn allocator_state(&self) -> AddressState {
        self.allocator.state()
    }
}
