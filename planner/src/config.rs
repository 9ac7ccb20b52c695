use crate::error::{PlannerError, Result};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the optional config file inside the data directory
pub const CONFIG_FILE: &str = "planner.yaml";

/// Storage entry the document lives under
pub const DEFAULT_STORAGE_KEY: &str = "influencerPlanner";

/// When edits reach durable storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Every `set` writes the whole document through
    #[default]
    Immediate,
    /// Edits stay in memory until `flush` is called
    Deferred,
}

/// Planner configuration, read from `planner.yaml` when present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub storage_key: String,
    pub backend: StorageBackend,
    pub flush: FlushPolicy,
    /// Delay before a debounced field edit is saved
    pub debounce_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            backend: StorageBackend::File,
            flush: FlushPolicy::Immediate,
            debounce_ms: 300,
        }
    }
}

impl PlannerConfig {
    /// Load `planner.yaml` from `data_dir`, falling back to defaults when it doesn't exist.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE} in {}, using defaults", data_dir.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse_str(&content)
    }

    /// Parse a YAML config string
    pub fn parse_str(content: &str) -> Result<Self> {
        let config: PlannerConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(PlannerError::Config("storage_key must not be empty".into()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
