//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Static config → Build providers → Start consumer → Aggregator::provide
//!
//! Pool (pool.rs):
//!     General providers and watch loops run as pool tasks
//!
//! Shutdown:
//!     SIGTERM/SIGINT (signals.rs) → Pool::stop → tasks end → consumer ends
//! ```
//!
//! # Design Decisions
//! - Ordered startup: consumer first, privileged providers, then the rest
//! - The pool is passed explicitly, never a process-wide singleton

pub mod pool;
pub mod signals;
pub mod startup;

pub use pool::{Pool, TaskPool};
