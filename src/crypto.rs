//! Cryptographic primitives for Embercoin

use crate::error::ChainError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};

/// A thread-safe, lazily initialized Secp256k1 context.
/// This prevents repeated, unnecessary context creation.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// A ledger address is the hex encoding of a compressed secp256k1
/// public key (33 bytes, 66 hex characters).
pub type Address = String;

/// Sentinel sender for newly minted reward value. Coinbase transactions
/// are exempt from signature and balance checks.
pub const COINBASE: &str = "COINBASE";

/// Parse an address back into a public key. Fails on malformed hex or
/// bytes that are not a valid curve point.
pub fn public_key_from_address(address: &str) -> Result<PublicKey, ChainError> {
    let bytes = hex::decode(address)
        .map_err(|e| ChainError::CryptoError(format!("Invalid hex address: {}", e)))?;
    PublicKey::from_slice(&bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid public key: {}", e)))
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        // Using the context from the static Lazy
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);

        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ChainError::CryptoError(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ChainError::CryptoError(format!("Invalid secret key bytes: {}", e))
            }
        })?;

        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        Ok(KeyPair {
            secret_key,
            public_key,
        })
    }

    /// Creates a KeyPair from a hex-encoded secret key.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(secret_hex)
            .map_err(|e| ChainError::CryptoError(format!("Invalid hex secret key: {}", e)))?;
        Self::from_secret_bytes(&bytes)
    }

    /// Returns the ledger address (hex of the compressed public key).
    pub fn address(&self) -> Address {
        let pubkey_bytes: [u8; PUBLIC_KEY_SIZE] = self.public_key.serialize();
        hex::encode(pubkey_bytes)
    }

    /// Returns the secret key as a hex string.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Signs a 32-byte digest and returns the compact signature bytes.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<[u8; COMPACT_SIGNATURE_SIZE], ChainError> {
        let message = Message::from_digest_slice(digest)
            .map_err(|e| ChainError::CryptoError(format!("Failed to create message: {}", e)))?;

        // Using the context from the static Lazy
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact())
    }
}

/// Verifies a compact ECDSA signature over a 32-byte digest against the
/// public key recovered from a ledger address.
pub fn verify_signature(
    address: &str,
    digest: &[u8; 32],
    signature_bytes: &[u8],
) -> Result<(), ChainError> {
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(ChainError::CryptoError(format!(
            "Signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let public_key = public_key_from_address(address)?;

    let message = Message::from_digest_slice(digest)
        .map_err(|e| ChainError::CryptoError(format!("Failed to create message: {}", e)))?;

    let signature = Signature::from_compact(signature_bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid signature: {}", e)))?;

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .map_err(|_| ChainError::CryptoError("Signature verification failed".to_string()))
}
