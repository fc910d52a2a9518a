//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Aggregator and providers produce:
//!     → logging.rs (structured log events, including provider failures)
//!     → metrics.rs (message and failure counters)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Every non-fatal provider failure is logged and counted
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
