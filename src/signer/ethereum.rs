//! Ethereum legacy transaction signing with hex keys.
//!
//! # Security
//! - The key is parsed from the secret on every call and dropped afterwards
//! - Keys are never logged or serialized

use alloy::consensus::{SignableTransaction, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::transaction::{SignedTransaction, UnsignedTransaction};
use crate::blockchain::types::ChainId;
use crate::signer::{Signer, SignerError};

/// Signs legacy transactions, binding the network's chain id when it has one.
#[derive(Debug, Clone, Copy)]
pub struct EthereumSigner {
    /// EIP-155 chain id written into every transaction.
    chain_id: Option<ChainId>,
}

impl EthereumSigner {
    pub fn new(chain_id: Option<ChainId>) -> Self {
        Self { chain_id }
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.chain_id
    }

    /// Parse a hex key (with or without 0x prefix).
    fn key(&self, secret: &str) -> Result<PrivateKeySigner, SignerError> {
        let secret = secret.trim();
        let key_hex = secret.strip_prefix("0x").unwrap_or(secret);

        key_hex
            .parse()
            .map_err(|e| SignerError::InvalidKey(format!("Invalid private key format: {}", e)))
    }
}

impl Signer for EthereumSigner {
    fn sign_message(&self, _secret: &str, _message: &str) -> Result<String, SignerError> {
        Err(SignerError::MessageSigningUnsupported("ethereum"))
    }

    fn sign_transaction(
        &self,
        secret: &str,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, SignerError> {
        let UnsignedTransaction::Ethereum(unsigned) = tx else {
            return Err(SignerError::UnableToSignTx(format!(
                "expected an ethereum transaction, got {}",
                tx.kind()
            )));
        };

        let signer = self.key(secret)?;

        // The chain id must be set before the signature hash is computed
        let mut tx = unsigned.clone();
        tx.chain_id = self.chain_id.map(u64::from);

        let signature = signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| SignerError::UnableToSignTx(e.to_string()))?;

        let envelope = TxEnvelope::from(tx.into_signed(signature));
        Ok(SignedTransaction::Ethereum(envelope.encoded_2718()))
    }
}
