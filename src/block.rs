//! Block structure and proof-of-work mining

use crate::transaction::Transaction;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// An ordered batch of transactions linked to its predecessor by hash.
///
/// `hash` is cached and treated as authoritative on deserialization; a
/// tampered serialized block is only caught by chain verification, not at
/// load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub timestamp: f64,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        timestamp: f64,
        previous_hash: String,
    ) -> Self {
        let mut block = Block {
            index,
            transactions,
            timestamp,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// SHA-256 over the canonical key-sorted JSON of the five signed fields.
    ///
    /// Pure function of `{index, transactions, timestamp, previous_hash,
    /// nonce}`; the cached `hash` field is excluded.
    pub fn compute_hash(&self) -> String {
        let content = json!({
            "index": self.index,
            "transactions": &self.transactions,
            "timestamp": self.timestamp,
            "previous_hash": &self.previous_hash,
            "nonce": self.nonce,
        });
        hex::encode(Sha256::digest(content.to_string().as_bytes()))
    }

    /// Whether a hex hash satisfies the leading-zero-digit difficulty
    /// predicate.
    pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
        let difficulty = difficulty as usize;
        hash.len() >= difficulty && hash.as_bytes()[..difficulty].iter().all(|&b| b == b'0')
    }

    /// Proof-of-work search: increment `nonce` from its current value and
    /// recompute the hash until it has `difficulty` leading zero hex digits.
    ///
    /// Unbounded and blocking; callers that need interruption must impose
    /// their own deadline or use [`Block::mine_with_budget`].
    pub fn mine(&mut self, difficulty: u32) {
        while !Self::meets_difficulty(&self.hash, difficulty) {
            self.nonce += 1;
            self.hash = self.compute_hash();
        }
        debug!("Block {} mined: {}", self.index, self.hash);
    }

    /// Bounded proof-of-work search: at most `budget` nonce increments.
    /// Returns true when the difficulty predicate was satisfied.
    pub fn mine_with_budget(&mut self, difficulty: u32, budget: u64) -> bool {
        let mut spent = 0u64;
        while !Self::meets_difficulty(&self.hash, difficulty) {
            if spent >= budget {
                return false;
            }
            self.nonce += 1;
            self.hash = self.compute_hash();
            spent += 1;
        }
        true
    }
}
