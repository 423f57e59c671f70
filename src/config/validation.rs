//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts >= 1, timeouts > 0)
//! - Check that URLs parse and endpoints match their network's family
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: IssuerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::blockchain::types::ChainFamily;
use crate::config::schema::{EndpointKind, IssuerConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if let Err(e) = url::Url::parse(value) {
        errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &IssuerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.broadcast.max_attempts == 0 {
        errors.push(ValidationError::new("broadcast.max_attempts", "must be at least 1"));
    }
    if config.broadcast.provider_timeout_secs == 0 {
        errors.push(ValidationError::new("broadcast.provider_timeout_secs", "must be greater than 0"));
    }

    let secrets = &config.secrets;
    if secrets.poll_interval_secs == 0 {
        errors.push(ValidationError::new("secrets.poll_interval_secs", "must be greater than 0"));
    }
    if secrets.connectivity_timeout_secs == 0 {
        errors.push(ValidationError::new("secrets.connectivity_timeout_secs", "must be greater than 0"));
    }
    if secrets.safe_mode {
        check_url(&mut errors, "secrets.connectivity_url", &secrets.connectivity_url);
    }
    if config.chain.family() != ChainFamily::Mock && secrets.key_file.trim().is_empty() {
        errors.push(ValidationError::new(
            "secrets.key_file",
            format!("required to sign on {}", config.chain),
        ));
    }

    // Both nodes are constructed at startup, whichever chain is selected
    let local = &config.providers.local_node;
    check_url(&mut errors, "providers.local_node.bitcoind_url", &local.bitcoind_url);
    check_url(&mut errors, "providers.local_node.ethereum_rpc_url", &local.ethereum_rpc_url);

    let has_global_token = config.api_token.as_deref().is_some_and(|t| !t.is_empty());
    for (i, entry) in config.providers.remote.iter().enumerate() {
        for (j, endpoint) in entry.endpoints.iter().enumerate() {
            let field = format!("providers.remote[{}].endpoints[{}]", i, j);

            if endpoint.kind.family() != entry.network.family() {
                errors.push(ValidationError::new(
                    &field,
                    format!("{:?} endpoint cannot serve {}", endpoint.kind, entry.network),
                ));
            }
            if endpoint.kind != EndpointKind::Mock {
                check_url(&mut errors, &format!("{}.base_url", field), &endpoint.base_url);
            }

            let has_token = endpoint.api_token.as_deref().is_some_and(|t| !t.is_empty());
            if endpoint.kind.requires_token() && !has_token && !has_global_token {
                errors.push(ValidationError::new(
                    format!("{}.api_token", field),
                    format!("{:?} requires an API token", endpoint.kind),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::Network;
    use crate::config::schema::{EndpointConfig, NetworkProvidersConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&IssuerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = IssuerConfig::default();
        config.broadcast.max_attempts = 0;
        config.broadcast.provider_timeout_secs = 0;
        config.secrets.poll_interval_secs = 0;
        config.secrets.key_file = String::new();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "broadcast.max_attempts",
                "broadcast.provider_timeout_secs",
                "secrets.poll_interval_secs",
                "secrets.key_file",
            ]
        );
    }

    #[test]
    fn test_mockchain_needs_no_key_file() {
        let mut config = IssuerConfig::default();
        config.chain = Network::Mockchain;
        config.secrets.key_file = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_endpoint_family_mismatch() {
        let mut config = IssuerConfig::default();
        config.providers.remote.push(NetworkProvidersConfig {
            network: Network::EthereumMainnet,
            endpoints: vec![EndpointConfig::new(EndpointKind::Esplora, "https://blockstream.info/api")],
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "providers.remote[0].endpoints[0]");
    }

    #[test]
    fn test_blockcypher_token() {
        let mut config = IssuerConfig::default();
        config.providers.remote.push(NetworkProvidersConfig {
            network: Network::BitcoinMainnet,
            endpoints: vec![EndpointConfig::new(
                EndpointKind::Blockcypher,
                "https://api.blockcypher.com/v1/btc/main",
            )],
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].field.ends_with("api_token"));

        config.api_token = Some("token".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_local_node_url() {
        let mut config = IssuerConfig::default();
        config.providers.local_node.bitcoind_url = "localhost".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "providers.local_node.bitcoind_url");
    }
}
