//! Verification of bitcoin message signatures on issued certificates.

use std::path::Path;
use std::str::FromStr;

use bitcoin::secp256k1::Secp256k1;
use bitcoin::sign_message::{signed_msg_hash, MessageSignature, MessageSignatureError};
use bitcoin::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    /// The certificate signature does not match the issuing address.
    #[error("There was a problem with the signature for certificate uid={uid}")]
    Unverified { uid: String },

    #[error("Failed to read signed certificate: {0}")]
    Io(#[from] std::io::Error),

    #[error("Signed certificate is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Signed certificate has no signature")]
    MissingSignature,

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    /// Only P2PKH addresses can verify message signatures.
    #[error("Address type cannot verify message signatures: {0}")]
    UnsupportedAddress(String),
}

/// Whether `signature` (base64) signs `message` for `address`.
///
/// Malformed signatures and signatures by another key are `Ok(false)`.
pub fn verify_message(address: &str, message: &str, signature: &str) -> Result<bool, VerificationError> {
    let address = Address::from_str(address)
        .map_err(|e| VerificationError::InvalidAddress(format!("{}: {}", address, e)))?
        .assume_checked();

    let Ok(signature) = MessageSignature::from_base64(signature) else {
        return Ok(false);
    };

    let secp = Secp256k1::verification_only();
    match signature.is_signed_by_address(&secp, &address, signed_msg_hash(message)) {
        Ok(verified) => Ok(verified),
        Err(MessageSignatureError::UnsupportedAddressType(kind)) => {
            Err(VerificationError::UnsupportedAddress(kind.to_string()))
        }
        Err(_) => Ok(false),
    }
}

/// Check that the certificate at `signed_cert_path` carries a signature of
/// `uid` by `issuing_address`.
pub fn verify_signature(
    uid: &str,
    signed_cert_path: &Path,
    issuing_address: &str,
) -> Result<(), VerificationError> {
    tracing::info!(uid, "Verifying certificate signature");

    let content = std::fs::read_to_string(signed_cert_path)?;
    let certificate: serde_json::Value = serde_json::from_str(&content)?;
    let signature = certificate
        .get("signature")
        .and_then(serde_json::Value::as_str)
        .ok_or(VerificationError::MissingSignature)?;

    if !verify_message(issuing_address, uid, signature)? {
        return Err(VerificationError::Unverified {
            uid: uid.to_string(),
        });
    }
    Ok(())
}
