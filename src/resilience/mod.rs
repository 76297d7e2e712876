//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to document service / AI service:
//!     → timeouts.rs (enforce per-call deadline)
//!     → On failure: typed ProxyError, surfaced once, never retried
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: creates and deletes are not idempotent upstream

pub mod timeouts;

pub use timeouts::with_timeout;
