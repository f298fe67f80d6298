//! Signed value-transfer records
//!
//! A transaction is signed over the SHA-256 of its canonical (key-sorted)
//! JSON content `{amount, recipient, sender}`. The signature itself is never
//! part of the signed payload, so signing does not change the content hash.

use crate::crypto::{self, KeyPair, COINBASE};
use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

/// A transfer of value between two addresses, or a coinbase mint when
/// `sender == COINBASE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    pub signature: Option<String>,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            signature: None,
        }
    }

    /// Build the coinbase transaction paying a mining reward.
    pub fn coinbase(recipient: impl Into<String>, reward: f64) -> Self {
        Transaction::new(COINBASE, recipient, reward)
    }

    pub fn is_coinbase(&self) -> bool {
        self.sender == COINBASE
    }

    /// Deterministic hash over `{sender, recipient, amount}`.
    ///
    /// serde_json orders object keys, so the digest is independent of field
    /// insertion order and reproducible across implementations.
    pub fn content_hash(&self) -> [u8; 32] {
        let content = json!({
            "sender": &self.sender,
            "recipient": &self.recipient,
            "amount": self.amount,
        });
        Sha256::digest(content.to_string().as_bytes()).into()
    }

    /// Hex form of the content hash, used in logs and API responses.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.content_hash())
    }

    /// Sign the content hash with the sender's key pair and store the
    /// signature as hex. Coinbase transactions carry no signature; signing
    /// one is a no-op.
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<(), ChainError> {
        if self.is_coinbase() {
            return Ok(());
        }

        let signature = keypair.sign_digest(&self.content_hash())?;
        self.signature = Some(hex::encode(signature));
        Ok(())
    }

    /// Check the signature against the public key encoded in `sender`.
    ///
    /// Coinbase transactions always verify. Every failure mode on the way
    /// (missing signature, malformed hex, invalid curve point, bad
    /// signature) makes the transaction invalid rather than an error.
    pub fn verify(&self) -> bool {
        if self.is_coinbase() {
            return true;
        }

        let signature_hex = match &self.signature {
            Some(sig) => sig,
            None => return false,
        };

        let signature_bytes = match hex::decode(signature_hex) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        crypto::verify_signature(&self.sender, &self.content_hash(), &signature_bytes).is_ok()
    }
}
