//! Engine configuration.

use resource_rules::RoundingMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tuning for the resource engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rounding for percent changes that do not name one.
    pub default_rounding: RoundingMode,

    /// Append group-parent re-aggregation deltas to the gain log.
    /// Off by default: the children's own deltas are already logged.
    pub log_aggregate_changes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_rounding: RoundingMode::Nearest,
            log_aggregate_changes: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
