//! Quiesce CLI - quiesce command

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli_lib::system_config;

mod cmd;

/// Quiesce - emit a value only once it stops changing
#[derive(Parser)]
#[command(name = "quiesce")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level for stderr output (overrides log.level)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Debounce lines from stdin and print each settled value
    Run {
        /// Quiescence window in milliseconds (default: debounce.delay_ms)
        #[arg(short, long)]
        delay_ms: Option<u64>,
        /// Held value before the first line settles
        #[arg(long, default_value = "")]
        initial: String,
        /// Prefix each value with milliseconds since start
        #[arg(short, long)]
        timestamps: bool,
        /// Apply empty lines immediately instead of waiting out the window
        #[arg(long)]
        clear_immediately: bool,
    },
    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Get a configuration value
    Get {
        /// Key, e.g. debounce.delay_ms
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Key, e.g. debounce.delay_ms
        key: String,
        /// New value
        value: String,
    },
    /// Show the config file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an annotated example config
    Example,
}

/// Initialize tracing on stderr so stdout only carries values
fn init_tracing(cli_level: Option<&str>) -> Result<()> {
    let level = match cli_level {
        Some(level) => system_config::parse_log_level(level)?,
        // A broken config file is reported by the command itself
        None => system_config::load()
            .and_then(|config| config.log_level())
            .unwrap_or(tracing::Level::WARN),
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Run { delay_ms, initial, timestamps, clear_immediately } => {
            cmd::run::run(cmd::run::RunOptions {
                delay_ms,
                initial,
                timestamps,
                clear_immediately,
            })
            .await
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::List => cmd::config::run_list().await,
            ConfigCommands::Get { key } => cmd::config::run_get(&key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
