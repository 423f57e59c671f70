//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stderr (fmt layer)
//!     → whatever `metrics` recorder the embedding binary installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (`provider`, `network`, `attempt`, `txid`) on every event
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
