//! Debounce lines read from stdin
//!
//! Every line is an observation. Each value that survives its quiescence
//! window is printed on stdout; logs go to stderr.

use anyhow::{Context, Result};
use cli_lib::system_config;
use owo_colors::{OwoColorize, Stream};
use quiesce_core::Debounced;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

/// Options for `quiesce run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Override for `debounce.delay_ms`
    pub delay_ms: Option<u64>,
    /// Held value before the first commit (never printed)
    pub initial: String,
    /// Prefix output with milliseconds since start
    pub timestamps: bool,
    /// Apply empty lines immediately instead of debouncing them
    pub clear_immediately: bool,
}

/// Counters reported at the end of a run
#[derive(Debug, Default)]
struct RunStats {
    observed: usize,
    emitted: usize,
    cleared: usize,
}

/// Writes settled values, skipping repeats of the last printed one
struct Emitter<W> {
    out: W,
    start: Instant,
    timestamps: bool,
    last: Option<String>,
}

impl<W: Write> Emitter<W> {
    fn emit(&mut self, value: String, stats: &mut RunStats) -> Result<()> {
        if self.last.as_deref() == Some(value.as_str()) {
            return Ok(());
        }

        let written = if self.timestamps {
            // Styled only on a terminal; pipes get plain text
            let prefix = format!("{:>6}ms", self.start.elapsed().as_millis());
            writeln!(
                self.out,
                "{} {}",
                prefix.if_supports_color(Stream::Stdout, |t| t.dimmed()),
                value
            )
        } else {
            writeln!(self.out, "{}", value)
        };
        written.context("Failed to write to stdout")?;
        self.out.flush().context("Failed to flush stdout")?;

        stats.emitted += 1;
        self.last = Some(value);
        Ok(())
    }

    /// Print a commit the select loop has not handled yet
    fn drain(&mut self, settled_rx: &mut watch::Receiver<String>, stats: &mut RunStats) -> Result<()> {
        if settled_rx.has_changed().unwrap_or(false) {
            let value = settled_rx.borrow_and_update().clone();
            self.emit(value, stats)?;
        }
        Ok(())
    }
}

pub async fn run(options: RunOptions) -> Result<()> {
    let config = system_config::load()?;

    let mut debounce = config.debounce;
    if let Some(delay_ms) = options.delay_ms {
        debounce.delay_ms = delay_ms;
    }
    debounce.validate().context("Invalid --delay-ms")?;

    info!("Debouncing stdin (delay: {:?})", debounce.delay());

    let holder = Debounced::new(options.initial.clone());
    let mut settled_rx = holder.subscribe()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut stats = RunStats::default();
    let mut emitter = Emitter {
        out: std::io::stdout(),
        start: Instant::now(),
        timestamps: options.timestamps,
        last: Some(options.initial),
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let interrupted = loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    emitter.drain(&mut settled_rx, &mut stats)?;
                    break false;
                };
                stats.observed += 1;

                if options.clear_immediately && line.is_empty() {
                    // Replace the pending input too, so it cannot resurface
                    holder.observe_with(String::new(), &debounce)?;
                    holder.override_value(String::new())?;
                    stats.cleared += 1;
                } else {
                    holder.observe_with(line, &debounce)?;
                }
            }
            changed = settled_rx.changed() => {
                changed.context("Debounced value closed")?;
                let value = settled_rx.borrow_and_update().clone();
                emitter.emit(value, &mut stats)?;
            }
            _ = &mut ctrl_c => {
                info!("Interrupted, discarding pending input");
                break true;
            }
        }
    };

    if !interrupted {
        // Let the last line serve out its window
        let value = holder.settled().await?;
        debug!("Input closed, final value settled");
        emitter.emit(value, &mut stats)?;
    }

    holder.dispose()?;

    info!(
        observed = stats.observed,
        emitted = stats.emitted,
        cleared = stats.cleared,
        elapsed_ms = emitter.start.elapsed().as_millis() as u64,
        "Run finished"
    );

    Ok(())
}
