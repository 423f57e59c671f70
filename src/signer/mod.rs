//! Chain-specific signing of messages and transactions.
//!
//! # Data Flow
//! ```text
//! SecretManager (holds the key text between start and stop)
//!     → Signer::sign_message / sign_transaction (key parsed per call)
//!     → SignedTransaction → BroadcastOrchestrator
//! ```
//!
//! # Security Constraints
//! - Signers never store key material; the secret is borrowed per call
//! - Key text and parsed keys are never logged
//! - Any failure is an error value; nothing error-shaped is returned as a signature

use std::sync::Arc;

use thiserror::Error;

use crate::blockchain::transaction::{SignedTransaction, UnsignedTransaction};
use crate::blockchain::types::{ChainFamily, Network, UnknownChainError};

pub mod bitcoin;
pub mod ethereum;
pub mod verify;

pub use self::bitcoin::BitcoinSigner;
pub use self::ethereum::EthereumSigner;
pub use self::verify::{verify_message, verify_signature, VerificationError};

/// Signing failed. Never retried.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The transaction could not be fully signed with this key.
    #[error("Unable to sign transaction: {0}")]
    UnableToSignTx(String),

    /// The secret is not a valid key for this chain.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Message signing is not supported on {0} chains")]
    MessageSigningUnsupported(&'static str),

    #[error(transparent)]
    UnknownChain(#[from] UnknownChainError),
}

/// Signs with a key supplied per call.
pub trait Signer: Send + Sync + std::fmt::Debug {
    /// Sign `message`, returning the chain's textual signature encoding.
    fn sign_message(&self, secret: &str, message: &str) -> Result<String, SignerError>;

    /// Sign a prepared transaction.
    fn sign_transaction(
        &self,
        secret: &str,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, SignerError>;
}

/// Signer for `network`, or `None` for the mock chain.
pub fn signer_for_network(network: Network) -> Option<Arc<dyn Signer>> {
    match network.family() {
        ChainFamily::Bitcoin => network
            .bitcoin_network()
            .map(|n| Arc::new(BitcoinSigner::new(n)) as Arc<dyn Signer>),
        ChainFamily::Ethereum => Some(Arc::new(EthereumSigner::new(network.ethereum_chain_id()))),
        ChainFamily::Mock => None,
    }
}

/// Signer for a network given by name.
pub fn signer_for_chain(name: &str) -> Result<Option<Arc<dyn Signer>>, SignerError> {
    let network: Network = name.parse()?;
    Ok(signer_for_network(network))
}
