//! Prometheus exporter setup and trigger metrics.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::info;

/// Installs the global recorder with a scrape endpoint on `addr` and
/// describes the engine metrics. Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    mirror_git::register_sync_metrics();
    metrics::describe_counter!(
        "mirror_triggers_total",
        "Trigger messages read, whether or not they named a repository"
    );
    info!("Metrics endpoint listening on http://{}/metrics", addr);
    Ok(())
}

/// Counts one trigger message.
pub fn record_trigger(keys: usize) {
    let named = if keys == 0 { "none" } else { "some" };
    metrics::counter!("mirror_triggers_total", "repositories" => named).increment(1);
}
