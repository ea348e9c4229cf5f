//! Prometheus metrics setup.
//!
//! The retry driver and gateway record `provider_calls_total`,
//! `provider_retries_total`, and `provider_failures_total`, labeled by
//! provider and operation.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with an HTTP scrape listener.
///
/// # Errors
///
/// Propagates exporter installation failures (port in use, recorder
/// already set).
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}
