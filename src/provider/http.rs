//! HTTP provider: polls an endpoint serving JSON dynamic configuration.
//!
//! # Design Decisions
//! - Polls until the pool is cancelled; `provide` only returns on shutdown
//!   or when the sink is gone
//! - Sends only when the decoded configuration differs from the last one
//! - Failed polls keep the last configuration and back off with jitter

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use crate::config::HttpProviderConfig;
use crate::dynamic::{Configuration, Message};
use crate::lifecycle::pool::TaskPool;
use crate::provider::{check, emit, Provider, ProviderError};
use crate::resilience::backoff::Backoff;

pub struct HttpProvider {
    config: HttpProviderConfig,
    client: Option<reqwest::Client>,
    endpoint: Option<Url>,
}

impl HttpProvider {
    pub fn new(config: HttpProviderConfig) -> Self {
        Self {
            config,
            client: None,
            endpoint: None,
        }
    }

    async fn fetch(
        &self,
        client: &reqwest::Client,
        endpoint: &Url,
    ) -> Result<Configuration, ProviderError> {
        let response = client
            .get(endpoint.clone())
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| ProviderError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let configuration: Configuration =
            serde_json::from_slice(&body).map_err(|e| ProviderError::Decode {
                origin: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        check(&configuration, endpoint.as_str())?;
        Ok(configuration)
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn init(&mut self) -> Result<(), ProviderError> {
        let endpoint = Url::parse(&self.config.endpoint).map_err(|e| {
            ProviderError::Other(format!("invalid endpoint {:?}: {}", self.config.endpoint, e))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ProviderError::Other(format!(
                "unsupported endpoint scheme {:?}",
                endpoint.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.poll_timeout_secs))
            .build()
            .map_err(|source| ProviderError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

        self.endpoint = Some(endpoint);
        self.client = Some(client);
        Ok(())
    }

    async fn provide(
        &self,
        sink: mpsc::Sender<Message>,
        pool: Arc<dyn TaskPool>,
    ) -> Result<(), ProviderError> {
        let (Some(client), Some(endpoint)) = (&self.client, &self.endpoint) else {
            return Err(ProviderError::NotInitialized);
        };

        let token = pool.token();
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        let mut backoff = Backoff::new(self.config.retry_base_delay_ms, self.config.retry_max_delay_ms);
        let mut current: Option<Configuration> = None;

        loop {
            let delay = match self.fetch(client, endpoint).await {
                Ok(configuration) => {
                    backoff.reset();
                    if current.as_ref() != Some(&configuration) {
                        emit(&sink, &self.config.name, configuration.clone()).await?;
                        current = Some(configuration);
                    }
                    interval
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        provider = %self.config.name,
                        attempt = backoff.attempt(),
                        delay = ?delay,
                        error = %e,
                        "Poll failed, keeping current configuration"
                    );
                    delay
                }
            };

            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(provider = %self.config.name, "Poller stopped");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "endpoint": self.config.endpoint,
            "poll_interval_secs": self.config.poll_interval_secs,
            "poll_timeout_secs": self.config.poll_timeout_secs,
        })
    }
}
