//! Metrics collection and exposition.
//!
//! # Metrics
//! - `aggregator_messages_total` (counter): messages sent, by provider
//! - `aggregator_provider_failures_total` (counter): failures, by provider and stage

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Count one message emitted by `provider`.
pub fn record_message(provider: &str) {
    metrics::counter!("aggregator_messages_total", "provider" => provider.to_string()).increment(1);
}

/// Count one provider failure at `stage` ("init" or "provide").
pub fn record_provider_failure(provider: &str, stage: &'static str) {
    metrics::counter!(
        "aggregator_provider_failures_total",
        "provider" => provider.to_string(),
        "stage" => stage
    )
    .increment(1);
}
