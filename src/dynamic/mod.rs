//! Dynamic configuration model.
//!
//! # Data Flow
//! ```text
//! provider backend (file, HTTP endpoint, static defaults)
//!     → decode into Configuration
//!     → validation.rs (semantic checks)
//!     → Message { provider_name, configuration }
//!     → shared sink → configuration consumer
//! ```
//!
//! # Design Decisions
//! - A Message is immutable once built; ownership moves into the sink on send
//! - Configuration is compared by value so providers can skip no-op updates

pub mod schema;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use schema::{BackendConfig, RouteConfig};
pub use validation::{validate, ValidationError};

/// Routing configuration reported by a single provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Configuration {
    /// Route definitions mapping requests to backend groups.
    pub routes: Vec<RouteConfig>,

    /// Backend server definitions.
    pub backends: Vec<BackendConfig>,
}

impl Configuration {
    /// True when the configuration carries no routes and no backends.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.backends.is_empty()
    }
}

/// One unit of configuration output, tagged with its producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Name of the provider that produced this configuration.
    pub provider_name: String,

    /// The configuration payload.
    pub configuration: Configuration,
}

impl Message {
    pub fn new(provider_name: impl Into<String>, configuration: Configuration) -> Self {
        Self {
            provider_name: provider_name.into(),
            configuration,
        }
    }
}
