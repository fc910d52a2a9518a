//! Resilience primitives for providers talking to remote backends.
//!
//! # Design Decisions
//! - Jittered backoff prevents thundering herd against a recovering backend
//! - Backoff resets after the first successful poll

pub mod backoff;
