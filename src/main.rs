//! cert-anchor operator CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!     config.toml ──▶ IssuerConfig ──┬──▶ ProviderRegistry ──┬──▶ BlockchainClient (reads)
//!                                    │                       └──▶ BroadcastOrchestrator
//!                                    │
//!                                    └──▶ SecretManager ──▶ SigningSession ──▶ Signer
//!
//!     ctrl-c ──▶ Shutdown ──▶ cancels backoff sleeps and safe-mode waits
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures_util::FutureExt;

use cert_anchor::blockchain::{BlockchainClient, BroadcastOrchestrator};
use cert_anchor::config::{load_config, validate_config, ConfigError, IssuerConfig};
use cert_anchor::lifecycle::{signals::spawn_ctrl_c_handler, Shutdown};
use cert_anchor::observability::logging::init_logging;
use cert_anchor::providers::{ProviderError, ProviderRegistry};
use cert_anchor::secrets::{with_signing_session, SecretManager};
use cert_anchor::signer::{signer_for_network, verify_signature};

#[derive(Parser)]
#[command(name = "cert-anchor")]
#[command(about = "Sign and broadcast certificate anchoring transactions", long_about = None)]
struct Cli {
    /// Issuer configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Balance of an address in the chain's base unit
    Balance { address: String },
    /// Next transaction nonce of an ethereum address
    Nonce { address: String },
    /// Unspent outputs of a bitcoin address, smallest first
    Utxos { address: String },
    /// Publish a signed transaction given as hex
    Broadcast { tx_hex: String },
    /// Sign a message with the issuer key
    SignMessage { message: String },
    /// Verify the signature of a signed certificate
    Verify {
        uid: String,
        certificate: PathBuf,
        issuing_address: String,
    },
}

fn resolve_config(path: Option<&PathBuf>) -> Result<IssuerConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = IssuerConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

fn build_registry(config: &IssuerConfig) -> Result<Arc<ProviderRegistry>, ProviderError> {
    let registry = ProviderRegistry::from_config(
        &config.providers,
        config.api_token.as_deref(),
        config.broadcast.provider_timeout(),
    )?;
    Ok(Arc::new(registry))
}

fn blockchain_client(config: &IssuerConfig, registry: Arc<ProviderRegistry>) -> BlockchainClient {
    BlockchainClient::new(
        registry,
        config.chain,
        config.use_local_node,
        config.broadcast.provider_timeout(),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_ref())?;

    init_logging(&config.observability);

    tracing::info!(
        chain = %config.chain,
        use_local_node = config.use_local_node,
        safe_mode = config.secrets.safe_mode,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    spawn_ctrl_c_handler(shutdown.clone());

    match cli.command {
        Commands::Balance { address } => {
            let client = blockchain_client(&config, build_registry(&config)?);
            println!("{}", client.get_balance(&address).await);
        }
        Commands::Nonce { address } => {
            let client = blockchain_client(&config, build_registry(&config)?);
            println!("{}", client.get_nonce(&address).await);
        }
        Commands::Utxos { address } => {
            let client = blockchain_client(&config, build_registry(&config)?);
            for output in client.get_unspent_outputs(&address).await {
                println!("{}:{} {} {}", output.txid, output.vout, output.value, output.script_pubkey);
            }
        }
        Commands::Broadcast { tx_hex } => {
            let orchestrator =
                BroadcastOrchestrator::new(build_registry(&config)?, config.broadcast.clone(), shutdown);
            let txid = orchestrator
                .broadcast_raw(config.chain, config.use_local_node, &tx_hex)
                .await?;
            println!("{}", txid);
        }
        Commands::SignMessage { message } => {
            let manager = SecretManager::new(signer_for_network(config.chain), &config.secrets, shutdown);
            let signature = with_signing_session(&manager, move |session| {
                async move { session.sign_message(&message) }.boxed()
            })
            .await?;
            println!("{}", signature);
        }
        Commands::Verify {
            uid,
            certificate,
            issuing_address,
        } => {
            verify_signature(&uid, &certificate, &issuing_address)?;
            println!("verified");
        }
    }

    Ok(())
}
