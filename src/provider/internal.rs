//! Internal provider: the proxy's own baseline configuration.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::InternalProviderConfig;
use crate::dynamic::{Configuration, Message};
use crate::lifecycle::pool::TaskPool;
use crate::provider::{check, emit, Provider, ProviderError};

/// Emits statically supplied routes and backends once.
#[derive(Debug, Clone)]
pub struct InternalProvider {
    configuration: Configuration,
}

impl InternalProvider {
    pub const NAME: &'static str = "internal";

    pub fn new(config: InternalProviderConfig) -> Self {
        Self {
            configuration: Configuration {
                routes: config.routes,
                backends: config.backends,
            },
        }
    }
}

#[async_trait]
impl Provider for InternalProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn init(&mut self) -> Result<(), ProviderError> {
        check(&self.configuration, "static configuration")
    }

    async fn provide(
        &self,
        sink: mpsc::Sender<Message>,
        _pool: Arc<dyn TaskPool>,
    ) -> Result<(), ProviderError> {
        emit(&sink, Self::NAME, self.configuration.clone()).await
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "routes": self.configuration.routes.len(),
            "backends": self.configuration.backends.len(),
        })
    }
}
