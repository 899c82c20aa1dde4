//! # Chanmap Core
//!
//! Domain model and pure algorithms for mapping instrument points onto PLC
//! I/O channels and planning their memory addresses.
//!
//! This crate provides:
//! - Signal/channel type vocabulary and the `<TYPE>-<NN>` channel id parser
//! - Channel catalog with availability, statistics, and suggestions
//! - Point, mapping, and scheme model with per-scheme uniqueness
//! - Sequential `%MD`/`%MX` address allocation and bus address translation
//! - Declarative auxiliary-address rule table and per-point address planner

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod channel;
pub mod model;
pub mod planner;
pub mod signal;

pub use address::{
    Address, AddressAllocator, AddressError, AddressState, AddressTranslator, AllocatorConfig,
    TranslatorConfig,
};
pub use channel::{
    CatalogConfig, CatalogConfigError, ChannelCatalog, ChannelId, ChannelIdError, ChannelInfo,
    ChannelStats, ChannelSuggestion, ChannelTypeConfig,
};
pub use model::{Mapping, Point, PointCatalog, Scheme};
pub use planner::{
    AllocatedAddressSet, AuxRole, AuxiliaryAddress, ModuleAddressPlanner, PlanError,
    PlannedAddress, RuleTable,
};
pub use signal::{SignalType, ValueKind};
