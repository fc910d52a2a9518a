//! Static configuration subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → StaticConfig (validated, immutable)
//!     → providers built from StaticConfig.providers
//! ```
//!
//! # Design Decisions
//! - Static config is read once at startup; dynamic config flows from providers
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::StaticConfig;
pub use schema::AggregatorConfig;
pub use schema::ProvidersConfig;
pub use schema::InternalProviderConfig;
pub use schema::FileProviderConfig;
pub use schema::HttpProviderConfig;
pub use schema::ObservabilityConfig;
pub use schema::LogFormat;
