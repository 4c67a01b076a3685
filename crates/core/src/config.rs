//! Debounce configuration block
//!
//! Embedded in the CLI's system config as the `[debounce]` table.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default quiescence window (search-as-you-type)
pub const DEFAULT_DELAY_MS: u64 = 500;

/// Valid range for `delay_ms`
pub const MIN_DELAY_MS: u64 = 1;
pub const MAX_DELAY_MS: u64 = 60_000;

/// Errors from validating a config block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("delay_ms must be between {min} and {max}, got {value}")]
    DelayOutOfRange { value: u64, min: u64, max: u64 },

    #[error("failed to parse debounce config: {0}")]
    Parse(String),
}

/// Delay settings for a debounced value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Quiescence window in milliseconds (default: 500)
    pub delay_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl DebounceConfig {
    /// Parse a standalone TOML document (`delay_ms = ...`)
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Quiescence window as a `Duration`
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Check values are within their valid ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_DELAY_MS..=MAX_DELAY_MS).contains(&self.delay_ms) {
            return Err(ConfigError::DelayOutOfRange {
                value: self.delay_ms,
                min: MIN_DELAY_MS,
                max: MAX_DELAY_MS,
            });
        }
        Ok(())
    }
}
