//! Wallet operations: key generation, persistence, and transaction signing

use crate::crypto::KeyPair;
use crate::error::ChainError;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A keypair persisted as hex, identified by its ledger address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub name: Option<String>,
    pub address: String,
    pub secret_key_hex: String,
    pub created: String,
}

impl Wallet {
    /// Generate a fresh wallet with a random keypair.
    pub fn new(name: Option<String>) -> Self {
        let keypair = KeyPair::generate();
        Wallet {
            name,
            address: keypair.address(),
            secret_key_hex: keypair.secret_key_hex(),
            created: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild the keypair from the stored secret key.
    pub fn keypair(&self) -> Result<KeyPair, ChainError> {
        let keypair = KeyPair::from_secret_hex(&self.secret_key_hex)?;
        if keypair.address() != self.address {
            return Err(ChainError::WalletError(
                "stored address does not match the secret key".to_string(),
            ));
        }
        Ok(keypair)
    }

    /// Sign a transaction with this wallet's key. The wallet must be the
    /// transaction's sender.
    pub fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), ChainError> {
        if !transaction.is_coinbase() && transaction.sender != self.address {
            return Err(ChainError::WalletError(format!(
                "wallet {} cannot sign for sender {}",
                self.address, transaction.sender
            )));
        }
        transaction.sign(&self.keypair()?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ChainError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChainError> {
        let json = fs::read_to_string(path)?;
        let wallet = serde_json::from_str(&json)?;
        Ok(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_address_matches_keypair() {
        let wallet = Wallet::new(Some("alice".to_string()));
        let keypair = wallet.keypair().unwrap();
        assert_eq!(wallet.address, keypair.address());
    }

    #[test]
    fn test_sign_transaction_end_to_end() {
        let wallet = Wallet::new(None);
        let mut tx = Transaction::new(wallet.address.clone(), "recipient", 7.0);
        wallet.sign_transaction(&mut tx).unwrap();
        assert!(tx.verify());
    }

    #[test]
    fn test_cannot_sign_for_other_sender() {
        let wallet = Wallet::new(None);
        let other = Wallet::new(None);

        let mut tx = Transaction::new(other.address.clone(), "recipient", 7.0);
        let result = wallet.sign_transaction(&mut tx);
        assert!(matches!(result, Err(ChainError::WalletError(_))));
    }

    #[test]
    fn test_corrupted_wallet_detected() {
        let mut wallet = Wallet::new(None);
        wallet.address = "00".repeat(33);
        assert!(matches!(wallet.keypair(), Err(ChainError::WalletError(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");

        let wallet = Wallet::new(Some("persistent".to_string()));
        wallet.save(&path).unwrap();

        let loaded = Wallet::load(&path).unwrap();
        assert_eq!(loaded.address, wallet.address);
        assert_eq!(loaded.secret_key_hex, wallet.secret_key_hex);
        assert_eq!(loaded.name, wallet.name);
        assert_eq!(loaded.created, wallet.created);
    }
}
