//! System configuration file
//!
//! Stored as TOML at `$QUIESCE_CONFIG`, or `<config dir>/quiesce/config.toml`
//! when the variable is unset. A missing file means defaults.

use anyhow::{Context, Result};
use quiesce_core::DebounceConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "QUIESCE_CONFIG";

/// Accepted values for `log.level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub debounce: DebounceConfig,
    pub log: LogConfig,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Maximum level written to stderr (default: warn)
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl SystemConfig {
    /// Check all values are within their valid ranges
    pub fn validate(&self) -> Result<()> {
        self.debounce.validate()?;
        self.log_level()?;
        Ok(())
    }

    /// Parsed `log.level`
    pub fn log_level(&self) -> Result<tracing::Level> {
        parse_log_level(&self.log.level)
    }
}

/// Parse a log level name
pub fn parse_log_level(level: &str) -> Result<tracing::Level> {
    if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        anyhow::bail!(
            "Invalid log level '{}': expected one of {}",
            level,
            LOG_LEVELS.join(", ")
        );
    }
    tracing::Level::from_str(level).map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", level, e))
}

/// Location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("quiesce").join("config.toml"))
}

/// Load the config file, falling back to defaults when it does not exist
pub fn load() -> Result<SystemConfig> {
    match config_file_path() {
        Some(path) => load_from(&path),
        None => Ok(SystemConfig::default()),
    }
}

/// Load from an explicit path
pub fn load_from(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;

    Ok(config)
}

/// Save to the default location
pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    save_to(&path, config)
}

/// Save to an explicit path, creating parent directories
pub fn save_to(path: &Path, config: &SystemConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;

    Ok(())
}

/// Write a default config file if none exists yet
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        save_to(&path, &SystemConfig::default())?;
    }
    Ok(path)
}

/// Annotated example configuration
pub fn example_config() -> String {
    r#"# quiesce configuration

[debounce]
# Quiescence window in milliseconds (1-60000)
delay_ms = 500

[log]
# One of: trace, debug, info, warn, error
level = "warn"
"#
    .to_string()
}
