//! Transactions handed to signers and broadcasters.
//!
//! # Responsibilities
//! - Carry an unsigned transaction plus whatever the signer needs to sign it
//! - Serialize signed transactions to the hex form providers accept
//! - Parse externally signed transactions for broadcast

use alloy::consensus::TxLegacy;
use bitcoin::consensus::encode;
use bitcoin::{Transaction, TxOut};
use thiserror::Error;

use crate::blockchain::types::{ChainFamily, Network};

/// Errors decoding a signed transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Invalid transaction hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Invalid bitcoin transaction: {0}")]
    Decode(#[from] encode::Error),

    #[error("Network {0} does not accept transactions")]
    Unsupported(Network),
}

/// A bitcoin transaction together with the outputs its inputs spend.
///
/// `spent_outputs[i]` is the output consumed by `tx.input[i]`. Legacy and
/// segwit sighashes both need the locking script, segwit also needs the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcoinTransaction {
    pub tx: Transaction,
    pub spent_outputs: Vec<TxOut>,
}

impl BitcoinTransaction {
    pub fn new(tx: Transaction, spent_outputs: Vec<TxOut>) -> Self {
        Self { tx, spent_outputs }
    }
}

/// A prepared transaction waiting for a signature.
#[derive(Debug, Clone, PartialEq)]
pub enum UnsignedTransaction {
    Bitcoin(BitcoinTransaction),
    Ethereum(TxLegacy),
}

impl UnsignedTransaction {
    /// Short label for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            UnsignedTransaction::Bitcoin(_) => "bitcoin",
            UnsignedTransaction::Ethereum(_) => "ethereum",
        }
    }
}

/// A fully signed transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq)]
pub enum SignedTransaction {
    Bitcoin(Transaction),
    /// RLP-encoded signed transaction.
    Ethereum(Vec<u8>),
}

impl SignedTransaction {
    /// Hex serialization sent to providers.
    ///
    /// Ethereum payloads carry a `0x` prefix as JSON-RPC expects.
    pub fn to_hex(&self) -> String {
        match self {
            SignedTransaction::Bitcoin(tx) => encode::serialize_hex(tx),
            SignedTransaction::Ethereum(raw) => format!("0x{}", hex::encode(raw)),
        }
    }

    /// Parse a signed transaction produced elsewhere.
    pub fn from_hex(network: Network, tx_hex: &str) -> Result<Self, TransactionError> {
        let trimmed = tx_hex.trim();
        match network.family() {
            ChainFamily::Bitcoin => {
                let bytes = hex::decode(trimmed)?;
                Ok(SignedTransaction::Bitcoin(encode::deserialize(&bytes)?))
            }
            ChainFamily::Ethereum => {
                let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
                Ok(SignedTransaction::Ethereum(hex::decode(stripped)?))
            }
            ChainFamily::Mock => Err(TransactionError::Unsupported(network)),
        }
    }

    /// Locally computed id for bitcoin transactions.
    pub fn local_txid(&self) -> Option<String> {
        match self {
            SignedTransaction::Bitcoin(tx) => Some(tx.compute_txid().to_string()),
            SignedTransaction::Ethereum(_) => None,
        }
    }
}
