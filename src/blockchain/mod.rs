//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! IssuerConfig.chain
//!     → types.rs (network, chain family, chain id)
//!     → client.rs (balance, nonce, unspent outputs with failover)
//!     → transaction.rs (unsigned → signed, hex encoding)
//!     → broadcast.rs (publication with retries and consensus check)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or sensitive data
//! - All provider calls have configurable timeouts
//! - Graceful degradation for reads, hard failure for broadcasts

pub mod broadcast;
pub mod client;
pub mod transaction;
pub mod types;

pub use broadcast::{BroadcastError, BroadcastOrchestrator};
pub use client::BlockchainClient;
pub use transaction::{BitcoinTransaction, SignedTransaction, TransactionError, UnsignedTransaction};
pub use types::{ChainFamily, ChainId, Network, Spendable, UnknownChainError};
