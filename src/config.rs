//! Workbench configuration.
//!
//! The core carries very little configuration of its own: the hover
//! synchronization policy is the only tunable behavior. Hosts either build a
//! [`WorkbenchConfig`] in code or load one from a TOML file shipped with the
//! application.

use crate::error::{Result, WorkbenchError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for the workbench core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    /// Hover synchronization settings.
    pub hover: HoverConfig,
}

impl WorkbenchConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| WorkbenchError::Config(format!("Failed to parse workbench config: {}", e)))
    }

    /// Load a configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WorkbenchError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load a configuration file, returning defaults if any error occurs.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

/// Hover synchronization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverConfig {
    /// Width of the throttle window in milliseconds. At most one throttled
    /// update per topic is published per window (trailing edge).
    pub throttle_window_ms: u64,

    /// Whether the instance currently hovering reads the immediate value
    /// tier. When false, every instance reads the throttled tier.
    pub immediate_for_hovering_instance: bool,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            throttle_window_ms: 100,
            immediate_for_hovering_instance: true,
        }
    }
}

impl HoverConfig {
    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_window_ms)
    }
}
