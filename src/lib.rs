//! Embercoin - a proof-of-work account-balance ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Ledger logic: admission, mining, balances, verification
//! - [`block`] - Block structure and proof-of-work
//! - [`transaction`] - Signed value-transfer records
//!
//! ## Consensus
//! - [`consensus`] - Longest-valid-chain conflict resolution
//!
//! ## Cryptography
//! - [`crypto`] - Keys, signatures and verification (secp256k1)
//! - [`wallet`] - Wallet persistence and transaction signing
//!
//! ## Networking & Configuration
//! - [`node`] - HTTP node and peer registry
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod block;
pub mod blockchain;
pub mod transaction;

// ============================================================================
// Consensus
// ============================================================================
pub mod consensus;

// ============================================================================
// Cryptography & Wallets
// ============================================================================
pub mod crypto;
pub mod wallet;

// ============================================================================
// Networking
// ============================================================================
pub mod node;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
