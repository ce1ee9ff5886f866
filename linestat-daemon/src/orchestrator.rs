//! Daemon assembly and lifecycle management.
//!
//! The [`Orchestrator`] owns the validated configuration and the line
//! input. [`Orchestrator::run`] builds the [`LinePipeline`], pumps lines
//! through it until the input ends or a shutdown signal arrives, then
//! drains the StatsD send queues.
//!
//! # Startup Order
//!
//! 1. Prometheus recorder (if enabled), so per-parser counters bind to it
//! 2. Line pipeline (processors first, then parsers and routes)
//! 3. Line source
//!
//! # Shutdown Triggers
//!
//! - EOF on stdin or a non-followed file
//! - `SIGTERM` or `SIGINT`

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use linestat_core::config::LinestatConfig;
use linestat_log_pipeline::{LinePipeline, ParserKind, ProcessorKind};

use crate::cli::DaemonCli;
use crate::metrics_server;
use crate::source::{self, DEFAULT_POLL_INTERVAL, LineInput};

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: LinestatConfig,
    /// Where lines are read from.
    input: LineInput,
    /// Poll interval while following a file.
    poll_interval: Duration,
}

impl Orchestrator {
    /// Build the orchestrator from an already validated configuration.
    pub fn new(config: LinestatConfig, input: LineInput) -> Self {
        Self {
            config,
            input,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the poll interval used in follow mode.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &LinestatConfig {
        &self.config
    }

    /// Build the pipeline and process lines until the input ends or a
    /// shutdown signal is received.
    ///
    /// Returns the number of lines read.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics recorder cannot be installed, the
    /// pipeline cannot be built, or the input cannot be read.
    pub async fn run(self) -> Result<u64> {
        if self.config.metrics.enabled {
            metrics_server::install_metrics_recorder(&self.config.metrics)?;
        }

        let pipeline = LinePipeline::builder(&self.config)
            .build()
            .await
            .map_err(|e| anyhow::anyhow!("failed to build line pipeline: {}", e))?;

        tracing::info!(
            parsers = pipeline.parser_count(),
            input = ?self.input,
            "linestat running"
        );

        let started = Instant::now();
        let pump = source::pump(&self.input, self.poll_interval, |line| {
            pipeline.process_line(line);
        });

        let outcome = tokio::select! {
            read = pump => read,
            signal = wait_for_shutdown_signal() => {
                let signal = signal?;
                tracing::info!(signal, "shutdown signal received");
                Ok(pipeline.lines_processed())
            }
        };

        let elapsed = started.elapsed();
        tracing::info!(
            lines = pipeline.lines_processed(),
            elapsed_ms = elapsed.as_millis() as u64,
            "input finished, draining"
        );
        pipeline.shutdown().await;

        outcome
    }
}

/// Load the configuration file and apply overrides.
///
/// Precedence: CLI flags, then `LINESTAT_*` environment variables, then
/// the file, then defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the
/// resulting configuration fails validation.
pub async fn load_config(cli: &DaemonCli) -> Result<LinestatConfig> {
    let mut config = LinestatConfig::from_file(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
    config.apply_env_overrides();
    apply_cli_overrides(&mut config, cli);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config: {}", e))?;
    Ok(config)
}

/// Apply `--log-level` and `--log-format` on top of the loaded configuration.
pub fn apply_cli_overrides(config: &mut LinestatConfig, cli: &DaemonCli) {
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format = format.clone();
    }
}

/// Check that every module section validates and the pipeline can be
/// assembled, without connecting to any StatsD collector.
///
/// # Errors
///
/// Returns the first schema or assembly error, path-qualified.
pub async fn validate_config(config: &LinestatConfig) -> Result<()> {
    let pipeline = LinePipeline::builder(config)
        .dry_run(true)
        .build()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    tracing::debug!(parsers = pipeline.parser_count(), "configuration assembled");
    pipeline.shutdown().await;
    Ok(())
}

/// Render the `--list-modules` listing.
pub fn list_modules() -> String {
    let mut out = String::from("parsers:\n");
    for kind in ParserKind::ALL {
        out.push_str(&format!("  {:<10} {}\n", kind.name(), kind.description()));
    }
    out.push_str("processors:\n");
    for kind in ProcessorKind::ALL {
        out.push_str(&format!("  {:<10} {}\n", kind.name(), kind.description()));
    }
    out
}

/// Print a short confirmation for `--validate`.
pub fn validation_summary(path: &Path, config: &LinestatConfig) -> String {
    format!(
        "{}: OK ({} parsers, {} processors)",
        path.display(),
        config.parsers.len(),
        config.processors.len()
    )
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("failed to install Ctrl-C handler: {}", e))?;
    Ok("ctrl-c")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn list_modules_names_every_kind() {
        let listing = list_modules();
        for name in ["regex", "json", "passthru", "statsd", "noop"] {
            assert!(listing.contains(name), "missing {name} in:\n{listing}");
        }
        assert!(listing.starts_with("parsers:\n"));
    }

    #[test]
    fn cli_overrides_win() {
        let mut config = LinestatConfig::default();
        let cli = DaemonCli::parse_from(["linestat", "--log-level", "debug", "--log-format", "pretty"]);
        apply_cli_overrides(&mut config, &cli);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.log_format, "pretty");
    }

    #[test]
    fn absent_cli_flags_keep_config() {
        let mut config = LinestatConfig::default();
        config.general.log_level = "warn".to_owned();
        let cli = DaemonCli::parse_from(["linestat"]);
        apply_cli_overrides(&mut config, &cli);
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.log_format, "json");
    }
}
