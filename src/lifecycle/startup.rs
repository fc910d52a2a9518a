//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Build providers from static configuration
//! - Start draining the sink before any provider runs
//! - Run the aggregator, then hold until shutdown
//!
//! # Design Decisions
//! - Fail fast: a privileged provider failure is fatal
//! - Degraded general providers never stop startup
//! - Stopping the pool drops every sender, which ends the consumer

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::StaticConfig;
use crate::dynamic::Message;
use crate::lifecycle::pool::Pool;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::provider::{AggregatorError, ProviderAggregator};

/// Errors that stop the process.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
}

/// Run until SIGINT/SIGTERM.
pub async fn run(config: StaticConfig) -> Result<usize, StartupError> {
    run_until(config, shutdown_signal()).await
}

/// Run until `shutdown` resolves. Returns how many messages were consumed.
pub async fn run_until<F>(config: StaticConfig, shutdown: F) -> Result<usize, StartupError>
where
    F: Future<Output = ()>,
{
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let aggregator = ProviderAggregator::from_config(&config.providers);
    tracing::info!(providers = ?aggregator.provider_names(), "Providers configured");

    let pool = Arc::new(Pool::new());
    let (sink, messages) = mpsc::channel(config.aggregator.channel_capacity);
    let consumer = tokio::spawn(consume(messages));

    tokio::pin!(shutdown);
    let provided = tokio::select! {
        res = aggregator.provide(sink, pool.clone()) => Some(res),
        _ = &mut shutdown => None,
    };

    match provided {
        Some(Ok(())) => {
            tracing::info!(tasks = pool.len(), "Aggregator running");
            shutdown.await;
        }
        Some(Err(e)) => {
            pool.stop().await;
            consumer.abort();
            return Err(e.into());
        }
        None => tracing::warn!("Shutdown requested before providers finished starting"),
    }

    tracing::info!("Stopping providers");
    pool.stop().await;
    let consumed = consumer.await.unwrap_or_default();
    tracing::info!(consumed, "Shutdown complete");
    Ok(consumed)
}

/// Stand-in for the router builder: drains the sink and logs each message.
async fn consume(mut messages: mpsc::Receiver<Message>) -> usize {
    let mut consumed = 0;
    while let Some(msg) = messages.recv().await {
        consumed += 1;
        tracing::info!(
            provider = %msg.provider_name,
            routes = msg.configuration.routes.len(),
            backends = msg.configuration.backends.len(),
            "Configuration received"
        );
    }
    consumed
}
