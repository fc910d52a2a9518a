//! Static configuration schema.
//!
//! This module defines the process-level configuration: which providers run,
//! how the aggregated stream is sized, and how the process is observed.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dynamic::{BackendConfig, RouteConfig};

/// Root configuration for the aggregator process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StaticConfig {
    /// Aggregated stream settings.
    pub aggregator: AggregatorConfig,

    /// Provider definitions.
    pub providers: ProvidersConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Settings for the aggregated message stream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Capacity of the shared sink. Providers block once it is full.
    pub channel_capacity: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1,
        }
    }
}

/// Every configured provider, grouped by role.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Statically supplied baseline configuration.
    pub internal: InternalProviderConfig,

    /// File-based configuration (optional).
    pub file: Option<FileProviderConfig>,

    /// HTTP polling discovery backends.
    pub http: Vec<HttpProviderConfig>,
}

/// Internal provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InternalProviderConfig {
    /// Run the internal provider.
    pub enabled: bool,

    /// Routes always present in the proxy.
    pub routes: Vec<RouteConfig>,

    /// Backends always present in the proxy.
    pub backends: Vec<BackendConfig>,
}

impl Default for InternalProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            routes: Vec::new(),
            backends: Vec::new(),
        }
    }
}

/// File provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileProviderConfig {
    /// Path to the dynamic configuration file (TOML, or JSON by extension).
    pub path: PathBuf,

    /// Reload the file when it changes.
    #[serde(default = "default_watch")]
    pub watch: bool,
}

fn default_watch() -> bool {
    true
}

/// HTTP provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpProviderConfig {
    /// Provider name, stamped on every message it produces.
    pub name: String,

    /// Endpoint returning a JSON dynamic configuration.
    pub endpoint: String,

    /// Polling interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Base delay for exponential backoff after a failed poll.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Maximum delay for exponential backoff after a failed poll.
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_ms: u64,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_poll_timeout() -> u64 {
    5
}

fn default_retry_base_delay() -> u64 {
    500
}

fn default_retry_max_delay() -> u64 {
    30_000
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
