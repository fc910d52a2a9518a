//! The aggregation engine.
//!
//! # Responsibilities
//! - Initialize every provider, isolating general-provider failures
//! - Run the internal then the file provider on the caller's task
//! - Launch every general provider as an independent pool task
//!
//! # Ordering
//! ```text
//! internal messages → file messages → { general messages, any order }
//! ```
//!
//! # Backpressure
//! Sends on the sink wait for capacity. With a small sink and no active
//! consumer, the internal and file providers stall `provide` itself, so the
//! consumer must be draining before `provide` is awaited.
//!
//! # Design Decisions
//! - Only a privileged provider's failure is returned to the caller
//! - A privileged provider failing `init` is fatal, like a failed `provide`
//! - General failures, including panics, go to the failure reporter
//! - No timeouts: a hung privileged provider hangs `provide`

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::ProvidersConfig;
use crate::dynamic::Message;
use crate::lifecycle::pool::TaskPool;
use crate::provider::failure::{FailureReporter, FailureStage, ProviderFailure};
use crate::provider::{
    FileProvider, HttpProvider, InternalProvider, Provider, ProviderError, ProviderRole,
};

/// Failures that abort [`ProviderAggregator::provide`].
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("{role} provider {name:?} failed to initialize: {source}")]
    Init {
        role: ProviderRole,
        name: String,
        #[source]
        source: ProviderError,
    },

    #[error("{role} provider {name:?} failed: {source}")]
    Provide {
        role: ProviderRole,
        name: String,
        #[source]
        source: ProviderError,
    },
}

/// Fans the output of every provider into one ordered stream.
#[derive(Default)]
pub struct ProviderAggregator {
    internal: Option<Box<dyn Provider>>,
    file: Option<Box<dyn Provider>>,
    providers: Vec<Box<dyn Provider>>,
    failures: Option<mpsc::UnboundedSender<ProviderFailure>>,
}

impl ProviderAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the in-tree providers described by the static configuration.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let mut aggregator = Self::new();

        if config.internal.enabled {
            aggregator = aggregator.with_internal(InternalProvider::new(config.internal.clone()));
        }
        if let Some(file) = &config.file {
            aggregator = aggregator.with_file(FileProvider::new(file.clone()));
        }
        for http in &config.http {
            aggregator = aggregator.with_provider(HttpProvider::new(http.clone()));
        }

        aggregator
    }

    /// Set the provider whose messages are always delivered first.
    pub fn with_internal<P: Provider + 'static>(mut self, provider: P) -> Self {
        self.internal = Some(Box::new(provider));
        self
    }

    /// Set the provider whose messages are delivered right after the internal one.
    pub fn with_file<P: Provider + 'static>(mut self, provider: P) -> Self {
        self.file = Some(Box::new(provider));
        self
    }

    /// Append a general provider.
    pub fn with_provider<P: Provider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Deliver non-fatal provider failures on `failures` as well as logging them.
    pub fn with_failure_reports(mut self, failures: mpsc::UnboundedSender<ProviderFailure>) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Names of every configured provider, privileged ones first.
    pub fn provider_names(&self) -> Vec<&str> {
        self.internal
            .iter()
            .chain(self.file.iter())
            .chain(self.providers.iter())
            .map(|p| p.name())
            .collect()
    }

    /// Initialize and start every provider.
    ///
    /// Returns once the privileged providers have finished and every general
    /// provider has been launched on `pool`. The sink is never closed here.
    pub async fn provide(
        self,
        sink: mpsc::Sender<Message>,
        pool: Arc<dyn TaskPool>,
    ) -> Result<(), AggregatorError> {
        let Self {
            internal,
            file,
            providers,
            failures,
        } = self;
        let reporter = FailureReporter::new(failures);

        let internal = init_privileged(ProviderRole::Internal, internal).await;
        let file = init_privileged(ProviderRole::File, file).await;
        let general = init_general(providers, &reporter).await;

        let privileged = [(ProviderRole::Internal, internal?), (ProviderRole::File, file?)];
        for (role, provider) in privileged {
            if let Some(provider) = provider {
                run_privileged(role, provider, &sink, &pool).await?;
            }
        }

        let launched = general.len();
        for provider in general {
            log_launch(ProviderRole::General, provider.as_ref());
            let task = run_general(provider, sink.clone(), pool.clone(), reporter.clone());
            pool.go(Box::pin(task));
        }

        tracing::info!(launched, "Providers launched");
        Ok(())
    }
}

async fn init_privileged(
    role: ProviderRole,
    provider: Option<Box<dyn Provider>>,
) -> Result<Option<Box<dyn Provider>>, AggregatorError> {
    let Some(mut provider) = provider else {
        tracing::debug!(role = %role, "No provider configured for role");
        return Ok(None);
    };

    match provider.init().await {
        Ok(()) => Ok(Some(provider)),
        Err(source) => {
            tracing::error!(provider = %provider.name(), role = %role, error = %source, "Provider failed to initialize");
            Err(AggregatorError::Init {
                role,
                name: provider.name().to_string(),
                source,
            })
        }
    }
}

async fn init_general(
    providers: Vec<Box<dyn Provider>>,
    reporter: &FailureReporter,
) -> Vec<Box<dyn Provider>> {
    let mut ready = Vec::with_capacity(providers.len());

    for mut provider in providers {
        let outcome = AssertUnwindSafe(provider.init()).catch_unwind().await;
        match outcome {
            Ok(Ok(())) => ready.push(provider),
            Ok(Err(err)) => reporter.report(provider.name(), FailureStage::Init, &err),
            Err(panic) => reporter.report(
                provider.name(),
                FailureStage::Init,
                &ProviderError::Panicked(panic_message(&*panic)),
            ),
        }
    }

    ready
}

async fn run_privileged(
    role: ProviderRole,
    provider: Box<dyn Provider>,
    sink: &mpsc::Sender<Message>,
    pool: &Arc<dyn TaskPool>,
) -> Result<(), AggregatorError> {
    log_launch(role, provider.as_ref());

    match provider.provide(sink.clone(), pool.clone()).await {
        Ok(()) => Ok(()),
        Err(source) => {
            tracing::error!(provider = %provider.name(), role = %role, error = %source, "Provider failed");
            Err(AggregatorError::Provide {
                role,
                name: provider.name().to_string(),
                source,
            })
        }
    }
}

async fn run_general(
    provider: Box<dyn Provider>,
    sink: mpsc::Sender<Message>,
    pool: Arc<dyn TaskPool>,
    reporter: FailureReporter,
) {
    let outcome = AssertUnwindSafe(provider.provide(sink, pool))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => tracing::debug!(provider = %provider.name(), "Provider finished"),
        Ok(Err(err)) => reporter.report(provider.name(), FailureStage::Provide, &err),
        Err(panic) => reporter.report(
            provider.name(),
            FailureStage::Provide,
            &ProviderError::Panicked(panic_message(&*panic)),
        ),
    }
}

fn log_launch(role: ProviderRole, provider: &dyn Provider) {
    tracing::info!(provider = %provider.name(), role = %role, "Starting provider");
    tracing::debug!(provider = %provider.name(), config = %provider.describe(), "Provider configuration");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
