//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → IssuerConfig (validated, immutable)
//!     → registry, orchestrator and secret manager built from its sections
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BroadcastConfig, EndpointConfig, EndpointKind, IssuerConfig, LocalNodeConfig,
    NetworkProvidersConfig, ObservabilityConfig, ProvidersConfig, SecretsConfig,
};
pub use validation::{validate_config, ValidationError};
