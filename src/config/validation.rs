//! Static configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacity, intervals, timeouts)
//! - Enforce unique provider identities
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StaticConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Dynamic routes/backends inside the internal provider are checked by
//!   the provider's own init, not here

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{HttpProviderConfig, StaticConfig};
use crate::provider::{FileProvider, InternalProvider};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem found in the static configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("aggregator.channel_capacity must be at least 1")]
    ZeroChannelCapacity,

    #[error("unknown log level {0:?}")]
    UnknownLogLevel(String),

    #[error("invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),

    #[error("providers.file.path is empty")]
    EmptyFilePath,

    #[error("http provider #{index} has an empty name")]
    EmptyProviderName { index: usize },

    #[error("provider name {0:?} is reserved")]
    ReservedProviderName(String),

    #[error("duplicate provider name {0:?}")]
    DuplicateProviderName(String),

    #[error("provider {name:?} has an invalid endpoint {endpoint:?}")]
    InvalidEndpoint { name: String, endpoint: String },

    #[error("provider {name:?}: {field} must be greater than zero")]
    ZeroDuration { name: String, field: &'static str },

    #[error("provider {0:?}: retry_base_delay_ms exceeds retry_max_delay_ms")]
    InvertedBackoff(String),
}

/// Validate a static configuration.
pub fn validate_config(config: &StaticConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.aggregator.channel_capacity == 0 {
        errors.push(ValidationError::ZeroChannelCapacity);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if let Some(file) = &config.providers.file {
        if file.path.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyFilePath);
        }
    }

    let mut names = HashSet::new();
    for (index, provider) in config.providers.http.iter().enumerate() {
        if provider.name.is_empty() {
            errors.push(ValidationError::EmptyProviderName { index });
        } else if provider.name == InternalProvider::NAME || provider.name == FileProvider::NAME {
            errors.push(ValidationError::ReservedProviderName(provider.name.clone()));
        } else if !names.insert(provider.name.as_str()) {
            errors.push(ValidationError::DuplicateProviderName(provider.name.clone()));
        }
        validate_http_provider(provider, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_http_provider(provider: &HttpProviderConfig, errors: &mut Vec<ValidationError>) {
    let scheme_ok = Url::parse(&provider.endpoint)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !scheme_ok {
        errors.push(ValidationError::InvalidEndpoint {
            name: provider.name.clone(),
            endpoint: provider.endpoint.clone(),
        });
    }

    for (field, value) in [
        ("poll_interval_secs", provider.poll_interval_secs),
        ("poll_timeout_secs", provider.poll_timeout_secs),
        ("retry_base_delay_ms", provider.retry_base_delay_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration {
                name: provider.name.clone(),
                field,
            });
        }
    }

    if provider.retry_base_delay_ms > provider.retry_max_delay_ms {
        errors.push(ValidationError::InvertedBackoff(provider.name.clone()));
    }
}
