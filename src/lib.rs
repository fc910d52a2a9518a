//! Configuration aggregation core of a reverse-proxy control plane.

pub mod config;
pub mod dynamic;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod resilience;

pub use config::StaticConfig;
pub use dynamic::{Configuration, Message};
pub use lifecycle::{Pool, TaskPool};
pub use provider::{Provider, ProviderAggregator};
