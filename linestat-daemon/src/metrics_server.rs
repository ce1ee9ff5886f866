//! Prometheus scrape endpoint for linestat's own counters.

use std::net::SocketAddr;

use anyhow::{Result, anyhow};
use linestat_core::config::MetricsConfig;
use linestat_core::metrics as m;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

/// Install the global recorder and start its HTTP listener.
///
/// Call before the pipeline is built so per-parser counters bind here.
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    let addr = listen_addr(config)?;
    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces"
        );
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(m::LINE_PROCESSING_DURATION_SECONDS.to_owned()),
            &m::LINE_PROCESSING_DURATION_BUCKETS,
        )
        .map_err(|e| anyhow!("invalid histogram buckets: {e}"))?
        .install()
        .map_err(|e| anyhow!("failed to install metrics recorder: {e}"))?;

    m::describe_all();
    tracing::info!(listen_addr = %addr, "metrics endpoint active");
    Ok(())
}

fn listen_addr(config: &MetricsConfig) -> Result<SocketAddr> {
    format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .map_err(|e| anyhow!("invalid metrics listen address '{}': {e}", config.listen_addr))
}
