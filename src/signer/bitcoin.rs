//! Bitcoin signing with WIF keys.

use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{All, Message, Secp256k1};
use bitcoin::sign_message::{signed_msg_hash, MessageSignature};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{ecdsa, CompressedPublicKey, NetworkKind, PrivateKey, ScriptBuf, Witness};

use crate::blockchain::transaction::{SignedTransaction, UnsignedTransaction};
use crate::signer::{Signer, SignerError};

/// Signs bitcoin messages and P2PKH / P2WPKH inputs.
#[derive(Debug, Clone)]
pub struct BitcoinSigner {
    network: bitcoin::Network,
    secp: Secp256k1<All>,
}

impl BitcoinSigner {
    pub fn new(network: bitcoin::Network) -> Self {
        Self {
            network,
            secp: Secp256k1::new(),
        }
    }

    /// Parse a WIF key, rejecting keys encoded for another network kind.
    fn private_key(&self, wif: &str) -> Result<PrivateKey, SignerError> {
        let key = PrivateKey::from_wif(wif.trim())
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;

        if key.network != NetworkKind::from(self.network) {
            return Err(SignerError::InvalidKey(format!(
                "key is not valid for {}",
                self.network
            )));
        }
        Ok(key)
    }

    fn unable(reason: impl std::fmt::Display) -> SignerError {
        SignerError::UnableToSignTx(reason.to_string())
    }
}

impl Signer for BitcoinSigner {
    /// Base64 recoverable signature over the "Bitcoin Signed Message" hash.
    fn sign_message(&self, secret: &str, message: &str) -> Result<String, SignerError> {
        let key = self.private_key(secret)?;
        let hash = signed_msg_hash(message);
        let digest = Message::from_digest(hash.to_byte_array());
        let signature = self.secp.sign_ecdsa_recoverable(&digest, &key.inner);

        Ok(MessageSignature::new(signature, key.compressed).to_base64())
    }

    fn sign_transaction(
        &self,
        secret: &str,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, SignerError> {
        let UnsignedTransaction::Bitcoin(unsigned) = tx else {
            return Err(Self::unable(format!("expected a bitcoin transaction, got {}", tx.kind())));
        };
        if unsigned.spent_outputs.len() != unsigned.tx.input.len() {
            return Err(Self::unable(format!(
                "{} inputs but {} spent outputs",
                unsigned.tx.input.len(),
                unsigned.spent_outputs.len()
            )));
        }

        let key = self.private_key(secret)?;
        let public_key = key.public_key(&self.secp);
        let p2pkh = ScriptBuf::new_p2pkh(&public_key.pubkey_hash());
        // Segwit outputs only exist for compressed keys
        let compressed = CompressedPublicKey::try_from(public_key).ok();
        let p2wpkh = compressed.map(|pk| ScriptBuf::new_p2wpkh(&pk.wpubkey_hash()));

        let mut signed = unsigned.tx.clone();
        let mut cache = SighashCache::new(&unsigned.tx);

        for (index, spent) in unsigned.spent_outputs.iter().enumerate() {
            if spent.script_pubkey == p2pkh {
                let sighash = cache
                    .legacy_signature_hash(index, &spent.script_pubkey, EcdsaSighashType::All.to_u32())
                    .map_err(Self::unable)?;
                let digest = Message::from_digest(sighash.to_byte_array());
                let signature = ecdsa::Signature::sighash_all(self.secp.sign_ecdsa(&digest, &key.inner));

                let push = PushBytesBuf::try_from(signature.to_vec()).map_err(Self::unable)?;
                signed.input[index].script_sig = Builder::new()
                    .push_slice(push)
                    .push_key(&public_key)
                    .into_script();
            } else if let (Some(script), Some(pk)) = (&p2wpkh, compressed) {
                if spent.script_pubkey != *script {
                    continue;
                }
                let sighash = cache
                    .p2wpkh_signature_hash(index, &spent.script_pubkey, spent.value, EcdsaSighashType::All)
                    .map_err(Self::unable)?;
                let digest = Message::from_digest(sighash.to_byte_array());
                let signature = ecdsa::Signature::sighash_all(self.secp.sign_ecdsa(&digest, &key.inner));

                let mut witness = Witness::new();
                witness.push(signature.to_vec());
                witness.push(pk.to_bytes());
                signed.input[index].witness = witness;
            }
        }

        // Every input must carry a signature, or the whole transaction is unusable
        if let Some(index) = signed
            .input
            .iter()
            .position(|input| input.script_sig.is_empty() && input.witness.is_empty())
        {
            return Err(Self::unable(format!("input {} could not be signed with this key", index)));
        }

        Ok(SignedTransaction::Bitcoin(signed))
    }
}
