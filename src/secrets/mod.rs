//! Lifecycle-gated key material.
//!
//! # Data Flow
//! ```text
//! SigningSession::open
//!     → SecretManager::start (safe mode: wait until offline with key media attached)
//!     → key read from media into memory
//!     → session.sign_message / sign_transaction
//! SigningSession::close (or Drop)
//!     → secret cleared
//!     → SecretManager::stop (safe mode: wait until online with key media removed)
//! ```
//!
//! # Security Constraints
//! - The key exists in memory only between start and stop
//! - Secret bytes are overwritten when cleared and never logged
//! - Safe-mode waits are bounded and cancellable, never silently skipped

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::signer::SignerError;

pub mod manager;
pub mod probe;
pub mod session;

pub use manager::{Secret, SecretManager};
pub use probe::{ConnectivityProbe, HttpConnectivityProbe, MediaProbe, PathMediaProbe};
pub use session::{with_signing_session, SigningSession};

#[derive(Debug, Error)]
pub enum SecretError {
    /// Signing was requested outside a started session.
    #[error("Secret is not loaded; start the secret manager first")]
    NotLoaded,

    #[error("Secret manager is already started")]
    AlreadyStarted,

    /// The configured chain has no signer (mock chain).
    #[error("No signer is available for this chain")]
    NoSigner,

    #[error("Secret file {0} is empty")]
    EmptySecret(PathBuf),

    #[error("Failed to read secret file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Safe-mode conditions were not met in time.
    #[error("Gave up after {waited:?} waiting until {phase}")]
    WaitTimeout { phase: &'static str, waited: Duration },

    #[error("Waiting for safe-mode conditions was cancelled")]
    Cancelled,

    #[error(transparent)]
    Signer(#[from] SignerError),
}
