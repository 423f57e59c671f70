//! Secret manager: loads the key on start, forgets it on stop.
//!
//! # Responsibilities
//! - Enforce the safe-mode (air-gap) protocol around key loading
//! - Hold the key text between start and stop, and only then, zeroized when dropped
//! - Delegate signing to the chain's signer with the loaded key
//!
//! # Design Decisions
//! - Probes are injected so the protocol is testable without a network
//! - The secret lock is a short-lived sync mutex, never held across `.await`
//! - An async session lock serializes whole start..stop sessions

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use zeroize::Zeroizing;

use crate::blockchain::transaction::{SignedTransaction, UnsignedTransaction};
use crate::config::schema::SecretsConfig;
use crate::lifecycle::Shutdown;
use crate::resilience::backoff::{cancellable_sleep, SleepOutcome};
use crate::secrets::probe::{ConnectivityProbe, HttpConnectivityProbe, MediaProbe, PathMediaProbe};
use crate::secrets::SecretError;
use crate::signer::Signer;

/// Key text read from the secret file.
///
/// Zeroized on drop; `Debug` never shows it.
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// First line of the secret file, trimmed.
fn read_secret(path: &Path) -> Result<Secret, SecretError> {
    let content = Zeroizing::new(std::fs::read_to_string(path).map_err(|source| SecretError::Io {
        path: path.to_path_buf(),
        source,
    })?);
    let secret = Secret::new(content.lines().next().unwrap_or_default().trim().to_string());

    if secret.expose().is_empty() {
        return Err(SecretError::EmptySecret(path.to_path_buf()));
    }
    Ok(secret)
}

/// Safe-mode state the manager waits for.
#[derive(Debug, Clone, Copy)]
struct Condition {
    online: bool,
    media_present: bool,
    phase: &'static str,
}

const LOAD_CONDITION: Condition = Condition {
    online: false,
    media_present: true,
    phase: "the machine is offline with the key media attached",
};

const RELEASE_CONDITION: Condition = Condition {
    online: true,
    media_present: false,
    phase: "the machine is online with the key media removed",
};

/// Holder of key material for one chain's signer.
///
/// The key is loaded and used only through a [`SigningSession`], which holds
/// the manager's session lock for its whole lifetime.
///
/// [`SigningSession`]: crate::secrets::SigningSession
pub struct SecretManager {
    signer: Option<Arc<dyn Signer>>,
    secret_path: PathBuf,
    safe_mode: bool,
    poll_interval: Duration,
    max_wait: Option<Duration>,
    connectivity: Arc<dyn ConnectivityProbe>,
    media: Arc<dyn MediaProbe>,
    shutdown: Shutdown,
    secret: Mutex<Option<Secret>>,
    /// Held by an open `SigningSession`.
    pub(crate) session: tokio::sync::Mutex<()>,
}

impl SecretManager {
    /// Manager using the HTTP connectivity probe and the key file as media probe.
    pub fn new(signer: Option<Arc<dyn Signer>>, config: &SecretsConfig, shutdown: Shutdown) -> Self {
        let secret_path = config.secret_path();
        Self {
            signer,
            connectivity: Arc::new(HttpConnectivityProbe::new(
                &config.connectivity_url,
                config.connectivity_timeout(),
            )),
            media: Arc::new(PathMediaProbe::new(&secret_path)),
            secret_path,
            safe_mode: config.safe_mode,
            poll_interval: config.poll_interval(),
            max_wait: config.max_wait(),
            shutdown,
            secret: Mutex::new(None),
            session: tokio::sync::Mutex::new(()),
        }
    }

    /// Replace the safe-mode probes.
    pub fn with_probes(
        mut self,
        connectivity: Arc<dyn ConnectivityProbe>,
        media: Arc<dyn MediaProbe>,
    ) -> Self {
        self.connectivity = connectivity;
        self.media = media;
        self
    }

    fn secret_slot(&self) -> MutexGuard<'_, Option<Secret>> {
        self.secret.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_loaded(&self) -> bool {
        self.secret_slot().is_some()
    }

    /// Load the key, after waiting for safe-mode conditions if enabled.
    pub(crate) async fn start(&self) -> Result<(), SecretError> {
        if self.is_loaded() {
            return Err(SecretError::AlreadyStarted);
        }

        if self.safe_mode {
            self.wait_for(LOAD_CONDITION).await?;
        } else {
            tracing::warn!(
                "Safe mode is disabled: the key is loaded without checking that the machine is offline"
            );
        }

        let secret = read_secret(&self.secret_path)?;
        let mut slot = self.secret_slot();
        if slot.is_some() {
            return Err(SecretError::AlreadyStarted);
        }
        *slot = Some(secret);

        tracing::info!(path = %self.secret_path.display(), "Secret loaded");
        Ok(())
    }

    /// Forget the key, then wait for safe-mode release conditions if enabled.
    pub(crate) async fn stop(&self) -> Result<(), SecretError> {
        self.clear_secret();

        if self.safe_mode {
            self.wait_for(RELEASE_CONDITION).await
        } else {
            tracing::warn!("Safe mode is disabled: remember to detach the key media");
            Ok(())
        }
    }

    /// Drop the key immediately without any safe-mode check.
    pub(crate) fn clear_secret(&self) {
        if self.secret_slot().take().is_some() {
            tracing::info!("Secret cleared");
        }
    }

    pub(crate) fn sign_message(&self, message: &str) -> Result<String, SecretError> {
        let slot = self.secret_slot();
        let secret = slot.as_ref().ok_or(SecretError::NotLoaded)?;
        let signer = self.signer.as_ref().ok_or(SecretError::NoSigner)?;
        Ok(signer.sign_message(secret.expose(), message)?)
    }

    pub(crate) fn sign_transaction(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, SecretError> {
        let slot = self.secret_slot();
        let secret = slot.as_ref().ok_or(SecretError::NotLoaded)?;
        let signer = self.signer.as_ref().ok_or(SecretError::NoSigner)?;
        Ok(signer.sign_transaction(secret.expose(), tx)?)
    }

    /// Poll the probes until `condition` holds.
    async fn wait_for(&self, condition: Condition) -> Result<(), SecretError> {
        let started = Instant::now();

        loop {
            let online = self.connectivity.is_online().await;
            let media_present = self.media.is_present();
            if online == condition.online && media_present == condition.media_present {
                tracing::info!(phase = condition.phase, "Safe-mode condition met");
                return Ok(());
            }

            if let Some(max_wait) = self.max_wait {
                if started.elapsed() >= max_wait {
                    return Err(SecretError::WaitTimeout {
                        phase: condition.phase,
                        waited: max_wait,
                    });
                }
            }

            tracing::warn!(
                online,
                media_present,
                "Waiting until {}",
                condition.phase
            );
            if cancellable_sleep(self.poll_interval, &self.shutdown).await == SleepOutcome::Cancelled {
                return Err(SecretError::Cancelled);
            }
        }
    }
}

impl fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretManager")
            .field("signer", &self.signer)
            .field("secret_path", &self.secret_path)
            .field("safe_mode", &self.safe_mode)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}
