//! Engine configuration.

use anyhow::{Context, Result};
use chanmap_core::{
    AllocatorConfig, CatalogConfig, ChannelCatalog, ModuleAddressPlanner, RuleTable,
    TranslatorConfig,
};
use chanmap_store::{StoreBackend, StoreConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything needed to build an engine and an address planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Persistence configuration
    pub store: StoreConfig,

    /// Channel types and counts
    pub catalog: CatalogConfig,

    /// Address allocator bases
    pub allocator: AllocatorConfig,

    /// External bus numbering
    pub translator: TranslatorConfig,

    /// Auxiliary address rules per channel type
    pub rules: RuleTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            catalog: CatalogConfig::default(),
            allocator: AllocatorConfig::legacy(),
            translator: TranslatorConfig::default(),
            rules: RuleTable::standard(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables on top of the defaults.
    ///
    /// # Environment Variables
    ///
    /// - `CHANMAP_STORE`: "json", "sqlite", or "memory"
    /// - `CHANMAP_DB_PATH`: Store file path
    /// - `CHANMAP_CHANNEL_COUNTS`: Channel counts, e.g. `AI=32,DI=64,AO=16,DO=32`
    /// - `CHANMAP_REAL_BASE`: First `%MD` offset
    /// - `CHANMAP_BOOL_BASE`: First `%MX` address as `byte.bit`
    /// - `CHANMAP_RULES`: Auxiliary rule table as JSON
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a JSON file, then apply environment overrides.
    ///
    /// Missing sections keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or an environment
    /// variable is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `CHANMAP_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns error if a value is invalid.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("CHANMAP_STORE") {
            self.store.backend = backend
                .parse::<StoreBackend>()
                .context("Invalid CHANMAP_STORE")?;
        }

        if let Some(path) = lookup("CHANMAP_DB_PATH") {
            self.store.path = PathBuf::from(path);
        }

        if let Some(counts) = lookup("CHANMAP_CHANNEL_COUNTS") {
            self.catalog =
                CatalogConfig::parse_counts(&counts).context("Invalid CHANMAP_CHANNEL_COUNTS")?;
        }

        if let Some(base) = lookup("CHANMAP_REAL_BASE") {
            let base = base
                .trim()
                .parse::<u32>()
                .context("Invalid CHANMAP_REAL_BASE")?;
            self.allocator = self
                .allocator
                .with_real_base(base)
                .context("Invalid CHANMAP_REAL_BASE")?;
        }

        if let Some(base) = lookup("CHANMAP_BOOL_BASE") {
            self.allocator = self
                .allocator
                .with_bool_base(&base)
                .context("Invalid CHANMAP_BOOL_BASE")?;
        }

        if let Some(rules) = lookup("CHANMAP_RULES") {
            self.rules = serde_json::from_str(&rules).context("Invalid CHANMAP_RULES JSON")?;
        }

        Ok(())
    }

    /// Channel catalog for this configuration.
    #[must_use]
    pub fn channel_catalog(&self) -> ChannelCatalog {
        ChannelCatalog::new(self.catalog.clone())
    }

    /// Fresh address planner for one export pass.
    #[must_use]
    pub fn planner(&self) -> ModuleAddressPlanner {
        ModuleAddressPlanner::new(&self.allocator, self.translator, self.rules.clone())
    }
}
