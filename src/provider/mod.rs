//! Configuration providers and the aggregation engine.
//!
//! # Data Flow
//! ```text
//! ProviderAggregator::provide(sink, pool)
//!     → init() every provider (failures isolated, see failure.rs)
//!     → internal.provide()  ┐ synchronous, in this order,
//!     → file.provide()      ┘ on the caller's task
//!     → pool.go(general.provide()) for each remaining provider
//!
//! Every provider:
//!     → emit(sink, Message { provider_name, configuration })
//! ```
//!
//! # Design Decisions
//! - Privileged providers live in named fields, never in the general list
//! - Ownership enforces a single `provide` per engine and per provider
//! - The sink is never closed by the engine; providers may run forever

pub mod aggregator;
pub mod failure;
pub mod file;
pub mod http;
pub mod internal;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::dynamic::{Configuration, Message, ValidationError};
use crate::lifecycle::pool::TaskPool;
use crate::observability::metrics;

pub use aggregator::{AggregatorError, ProviderAggregator};
pub use failure::{FailureStage, ProviderFailure};
pub use file::FileProvider;
pub use http::HttpProvider;
pub use internal::InternalProvider;

/// Errors a provider can report from `init` or `provide`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("configuration sink closed")]
    SinkClosed,

    #[error("provider used before init")]
    NotInitialized,

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode configuration from {origin}: {reason}")]
    Decode { origin: String, reason: String },

    #[error("invalid configuration from {origin}: {}", join(.errors))]
    Invalid {
        origin: String,
        errors: Vec<ValidationError>,
    },

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("provider task panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Role a provider plays inside the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderRole {
    Internal,
    File,
    General,
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderRole::Internal => write!(f, "internal"),
            ProviderRole::File => write!(f, "file"),
            ProviderRole::General => write!(f, "general"),
        }
    }
}

/// A configuration discovery backend.
///
/// `init` runs once before `provide`; `provide` runs at most once. Watch-style
/// providers keep sending from `provide` until the pool's token is cancelled.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Identity stamped on every message this provider sends.
    fn name(&self) -> &str;

    /// One-time setup. Must not send messages.
    async fn init(&mut self) -> Result<(), ProviderError>;

    /// Send configuration messages on `sink`.
    async fn provide(
        &self,
        sink: mpsc::Sender<Message>,
        pool: Arc<dyn TaskPool>,
    ) -> Result<(), ProviderError>;

    /// Provider settings, logged at debug level on launch.
    fn describe(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Send one configuration on behalf of `provider`.
///
/// Waits while the sink is full, so a stalled consumer stalls the caller.
pub async fn emit(
    sink: &mpsc::Sender<Message>,
    provider: &str,
    configuration: Configuration,
) -> Result<(), ProviderError> {
    sink.send(Message::new(provider, configuration))
        .await
        .map_err(|_| ProviderError::SinkClosed)?;
    metrics::record_message(provider);
    tracing::debug!(provider = %provider, "Configuration sent");
    Ok(())
}

/// Check a decoded configuration, labelling errors with where it came from.
pub(crate) fn check(configuration: &Configuration, origin: &str) -> Result<(), ProviderError> {
    crate::dynamic::validate(configuration).map_err(|errors| ProviderError::Invalid {
        origin: origin.to_string(),
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_tags_message_with_provider() {
        let (tx, mut rx) = mpsc::channel(1);
        emit(&tx, "salad", Configuration::default()).await.unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.provider_name, "salad");
        assert!(msg.configuration.is_empty());
    }

    #[tokio::test]
    async fn test_emit_on_closed_sink() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = emit(&tx, "salad", Configuration::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::SinkClosed));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(ProviderRole::Internal.to_string(), "internal");
        assert_eq!(ProviderRole::General.to_string(), "general");
    }
}
