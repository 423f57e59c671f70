//! Signing and broadcast core of a blockchain certificate issuer.

pub mod blockchain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod providers;
pub mod resilience;
pub mod secrets;
pub mod signer;

pub use blockchain::{BlockchainClient, BroadcastOrchestrator, Network};
pub use config::schema::IssuerConfig;
pub use lifecycle::Shutdown;
pub use providers::ProviderRegistry;
pub use secrets::{with_signing_session, SecretManager, SigningSession};
