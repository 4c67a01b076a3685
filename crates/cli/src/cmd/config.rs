//! Configuration management command
//!
//! Provides CLI interface to view and edit the config file.

use anyhow::{Context, Result};
use cli_lib::system_config::{self, LOG_LEVELS};
use owo_colors::OwoColorize;
use quiesce_core::config::{MAX_DELAY_MS, MIN_DELAY_MS};

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = system_config::load()?;
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    println!("{}", "Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[debounce]".yellow());
    println!(
        "  {} = {} {}",
        "delay_ms".cyan(),
        config.debounce.delay_ms,
        format!("({:?})", config.debounce.delay()).dimmed()
    );

    println!("\n{}", "[log]".yellow());
    println!("  {} = {}", "level".cyan(), config.log.level);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  delay_ms: {}-{}", MIN_DELAY_MS, MAX_DELAY_MS);
    println!("  level: {}", LOG_LEVELS.join(", "));

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = system_config::load()?;

    let value = match key {
        "debounce.delay_ms" => config.debounce.delay_ms.to_string(),
        "log.level" => config.log.level,
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'quiesce config list' to see available keys.",
            key
        ),
    };

    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load()?;

    match key {
        "debounce.delay_ms" => {
            let val: u64 = value.parse()
                .context("Invalid value: must be a positive integer")?;
            config.debounce.delay_ms = val;
        }
        "log.level" => {
            config.log.level = value.to_ascii_lowercase();
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'quiesce config list' to see available keys.",
            key
        ),
    }

    // Validate before saving
    config.validate()
        .context("Invalid configuration value")?;

    system_config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path = system_config::config_file_path()
        .context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
        return Ok(());
    }

    println!("{}", config_path.display());
    if !config_path.exists() {
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}
