//! Tracing setup from the `[general]` section.
//!
//! Everything goes to stderr; stdout is reserved for `--list-modules`
//! and `--validate` output.

use anyhow::{Result, anyhow};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use linestat_core::config::GeneralConfig;

type FmtLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let fmt_layer = fmt_layer(&config.log_format)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing subscriber: {e}"))
}

fn fmt_layer(format: &str) -> Result<FmtLayer> {
    match format {
        "json" => Ok(fmt::layer().json().with_writer(std::io::stderr).boxed()),
        "pretty" => Ok(fmt::layer().pretty().with_writer(std::io::stderr).boxed()),
        other => Err(anyhow!(
            "unknown log format '{other}', expected 'json' or 'pretty'"
        )),
    }
}
