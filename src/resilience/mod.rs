//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Provider call:
//!     → timeouts.rs (every external call has a deadline)
//!     → On broadcast failure: backoff.rs (fixed interval, cancellable)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; a hung provider must not stall the caller
//! - Backoff is a fixed interval, not exponential: broadcast retries are few
//! - Waits observe the process `Shutdown` token

pub mod backoff;
pub mod timeouts;
