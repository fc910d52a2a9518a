//! Reporting of non-fatal provider failures.
//!
//! A general provider that fails `init` or `provide` never aborts the
//! aggregator. Its failure is logged, counted, and, when the caller asked
//! for it, delivered on a failure channel.

use std::fmt;

use tokio::sync::mpsc;

use crate::observability::metrics;
use crate::provider::ProviderError;

/// Lifecycle step at which a provider failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    Init,
    Provide,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Init => "init",
            FailureStage::Provide => "provide",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A degraded-but-continuing provider failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: String,
    pub stage: FailureStage,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FailureReporter {
    failures: Option<mpsc::UnboundedSender<ProviderFailure>>,
}

impl FailureReporter {
    pub(crate) fn new(failures: Option<mpsc::UnboundedSender<ProviderFailure>>) -> Self {
        Self { failures }
    }

    pub(crate) fn report(&self, provider: &str, stage: FailureStage, error: &ProviderError) {
        tracing::error!(
            provider = %provider,
            stage = %stage,
            error = %error,
            "Provider failed, continuing without it"
        );
        metrics::record_provider_failure(provider, stage.as_str());

        if let Some(tx) = &self.failures {
            let _ = tx.send(ProviderFailure {
                provider: provider.to_string(),
                stage,
                error: error.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_reaches_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = FailureReporter::new(Some(tx));
        reporter.report("onion", FailureStage::Init, &ProviderError::Other("boom".into()));

        let failure = rx.try_recv().unwrap();
        assert_eq!(
            failure,
            ProviderFailure {
                provider: "onion".into(),
                stage: FailureStage::Init,
                error: "boom".into(),
            }
        );
    }

    #[test]
    fn test_report_without_channel_or_receiver() {
        FailureReporter::default().report("onion", FailureStage::Provide, &ProviderError::SinkClosed);

        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        FailureReporter::new(Some(tx)).report("onion", FailureStage::Provide, &ProviderError::SinkClosed);
    }
}
