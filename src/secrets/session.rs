//! Scoped signing: the key is loaded for exactly the lifetime of a session.

use futures_util::future::BoxFuture;

use crate::blockchain::transaction::{SignedTransaction, UnsignedTransaction};
use crate::secrets::manager::SecretManager;
use crate::secrets::SecretError;

/// An open start..stop window on a [`SecretManager`].
///
/// Only one session per manager exists at a time. `close` runs the full stop
/// protocol; dropping an unclosed session still clears the key, but cannot
/// wait for the safe-mode release conditions.
#[derive(Debug)]
pub struct SigningSession<'a> {
    manager: &'a SecretManager,
    _exclusive: tokio::sync::MutexGuard<'a, ()>,
    closed: bool,
}

impl<'a> SigningSession<'a> {
    /// Take the manager's session lock and start it.
    pub async fn open(manager: &'a SecretManager) -> Result<Self, SecretError> {
        let exclusive = manager.session.lock().await;
        tracing::info!("Starting signing session");
        manager.start().await?;

        Ok(Self {
            manager,
            _exclusive: exclusive,
            closed: false,
        })
    }

    pub fn sign_message(&self, message: &str) -> Result<String, SecretError> {
        self.manager.sign_message(message)
    }

    pub fn sign_transaction(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, SecretError> {
        self.manager.sign_transaction(tx)
    }

    /// Stop the manager and release the session.
    pub async fn close(mut self) -> Result<(), SecretError> {
        self.closed = true;
        tracing::info!("Stopping signing session");
        self.manager.stop().await
    }
}

impl Drop for SigningSession<'_> {
    fn drop(&mut self) {
        if !self.closed {
            self.manager.clear_secret();
            tracing::warn!("Signing session dropped without close; secret cleared, safe-mode release check skipped");
        }
    }
}

/// Run `f` inside a signing session that is closed on every exit path.
///
/// An error from `f` wins over an error closing the session. When `f`
/// succeeds and only the close fails, its value is still returned: the key is
/// cleared before the release wait starts, and the value may be a transaction
/// that is already published.
pub async fn with_signing_session<'a, T, E, F>(manager: &'a SecretManager, f: F) -> Result<T, E>
where
    F: for<'s> FnOnce(&'s SigningSession<'a>) -> BoxFuture<'s, Result<T, E>>,
    E: From<SecretError>,
{
    let session = SigningSession::open(manager).await?;
    let result = f(&session).await;
    let closed = session.close().await;

    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(value), Err(close_err)) => {
            tracing::error!(
                error = %close_err,
                "Signing session work completed but the safe-mode release check failed; detach the key media"
            );
            Ok(value)
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            tracing::warn!(error = %close_err, "Closing signing session also failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::Network;
    use crate::config::schema::SecretsConfig;
    use crate::lifecycle::Shutdown;
    use crate::signer::signer_for_network;
    use crate::secrets::probe::{ConnectivityProbe, MediaProbe};
    use async_trait::async_trait;
    use futures_util::FutureExt;
    use std::sync::Arc;
    use std::time::Duration;

    /// Probes stuck in one state.
    #[derive(Debug)]
    struct Stuck {
        online: bool,
        media_present: bool,
    }

    #[async_trait]
    impl ConnectivityProbe for Stuck {
        async fn is_online(&self) -> bool {
            self.online
        }
    }

    impl MediaProbe for Stuck {
        fn is_present(&self) -> bool {
            self.media_present
        }
    }

    fn manager_with(dir: &tempfile::TempDir, safe_mode: bool) -> SecretManager {
        let secret = bitcoin::secp256k1::SecretKey::from_slice(&[1u8; 32]).unwrap();
        let wif = bitcoin::PrivateKey::new(secret, bitcoin::Network::Testnet).to_wif();
        std::fs::write(dir.path().join("pk_issuer.txt"), wif).unwrap();

        let config = SecretsConfig {
            usb_name: dir.path().to_path_buf(),
            safe_mode,
            max_wait_secs: Some(60),
            ..SecretsConfig::default()
        };
        SecretManager::new(signer_for_network(Network::BitcoinTestnet), &config, Shutdown::new())
    }

    fn manager(dir: &tempfile::TempDir) -> SecretManager {
        manager_with(dir, false)
    }

    #[tokio::test]
    async fn test_session_signs_then_unloads() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);

        let signature = with_signing_session(&manager, |session| {
            async move { session.sign_message("abc123") }.boxed()
        })
        .await
        .unwrap();

        assert!(!signature.is_empty());
        assert!(!manager.is_loaded());
    }

    #[tokio::test]
    async fn test_session_closes_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);

        let result: Result<(), SecretError> = with_signing_session(&manager, |_session| {
            async move { Err(SecretError::NoSigner) }.boxed()
        })
        .await;

        assert!(matches!(result, Err(SecretError::NoSigner)));
        assert!(!manager.is_loaded());
    }

    #[tokio::test]
    async fn test_dropped_session_clears_secret() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);

        {
            let session = SigningSession::open(&manager).await.unwrap();
            assert!(manager.is_loaded());
            session.sign_message("abc123").unwrap();
        }

        assert!(!manager.is_loaded());
        assert!(matches!(manager.sign_message("abc123"), Err(SecretError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_failed_start_leaves_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(&dir);
        std::fs::remove_file(dir.path().join("pk_issuer.txt")).unwrap();

        assert!(matches!(
            SigningSession::open(&manager).await,
            Err(SecretError::Io { .. })
        ));
        // Session lock was released
        std::fs::write(dir.path().join("pk_issuer.txt"), "key").unwrap();
        let session = SigningSession::open(&manager).await.unwrap();
        session.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_survives_failed_release_check() {
        let dir = tempfile::tempdir().unwrap();
        // Offline with media attached: loading proceeds, release never does
        let stuck = Arc::new(Stuck {
            online: false,
            media_present: true,
        });
        let manager = manager_with(&dir, true).with_probes(stuck.clone(), stuck);

        let result: Result<String, SecretError> = with_signing_session(&manager, |session| {
            async move {
                session.sign_message("abc123")?;
                Ok("published-txid".to_string())
            }
            .boxed()
        })
        .await;

        assert_eq!(result.unwrap(), "published-txid");
        assert!(!manager.is_loaded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_work_error_wins_over_release_failure() {
        let dir = tempfile::tempdir().unwrap();
        let stuck = Arc::new(Stuck {
            online: false,
            media_present: true,
        });
        let manager = manager_with(&dir, true).with_probes(stuck.clone(), stuck);

        let result: Result<(), SecretError> = with_signing_session(&manager, |_session| {
            async move { Err(SecretError::NoSigner) }.boxed()
        })
        .await;

        assert!(matches!(result, Err(SecretError::NoSigner)));
    }

    #[tokio::test]
    async fn test_second_session_waits_for_first() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(manager(&dir));
        let first = SigningSession::open(&manager).await.unwrap();

        let (opened_tx, mut opened_rx) = tokio::sync::oneshot::channel();
        let second = tokio::spawn({
            let manager = manager.clone();
            async move {
                let session = SigningSession::open(&manager).await.unwrap();
                let _ = opened_tx.send(());
                let signature = session.sign_message("second").unwrap();
                session.close().await.unwrap();
                signature
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(opened_rx.try_recv().is_err());
        assert!(!second.is_finished());
        // The first session still owns the key
        first.sign_message("first").unwrap();

        first.close().await.unwrap();
        assert!(!second.await.unwrap().is_empty());
        assert!(!manager.is_loaded());
    }
}
