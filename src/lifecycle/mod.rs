//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every cancellable wait returns early
//!
//! Signals (signals.rs):
//!     SIGINT/ctrl-c → Shutdown::trigger
//! ```
//!
//! # Design Decisions
//! - One token per process, cloned into the orchestrator and secret manager
//! - Cancellation is cooperative: in-flight provider calls finish or time out

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
