//! Cross-replica conflict resolution via the longest-valid-chain rule

use crate::block::Block;
use crate::blockchain::Blockchain;
use log::info;

/// Consensus engine comparing the local ledger against candidate chains
/// from remote replicas.
pub struct Consensus;

impl Consensus {
    /// Replace the local chain with the longest valid candidate, if any.
    ///
    /// Candidates no longer than the local chain are discarded outright;
    /// ties favor the incumbent. Each remaining candidate is loaded into a
    /// scratch ledger and vetted with `verify_chain()` at the local
    /// difficulty. Among valid candidates the greatest length wins, and
    /// the replacement is a single assignment of the whole chain. The
    /// pending pool is left untouched.
    ///
    /// Returns true when a replacement occurred.
    pub fn resolve(local: &mut Blockchain, candidates: Vec<Vec<Block>>) -> bool {
        let mut max_length = local.chain.len();
        let mut replacement: Option<Vec<Block>> = None;

        for candidate in candidates {
            if candidate.len() <= max_length {
                continue;
            }

            let scratch =
                Blockchain::from_parts(candidate.clone(), local.difficulty, local.mining_reward);
            if scratch.verify_chain() {
                max_length = candidate.len();
                replacement = Some(candidate);
            }
        }

        match replacement {
            Some(chain) => {
                info!(
                    "Replacing local chain ({} blocks) with longer valid chain ({} blocks)",
                    local.chain.len(),
                    chain.len()
                );
                local.chain = chain;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DIFFICULTY: u32 = 1;

    fn chain_of_length(length: usize) -> Blockchain {
        let mut chain = Blockchain::new(TEST_DIFFICULTY, 50.0);
        while chain.chain.len() < length {
            chain.mine_pending_transactions("miner").unwrap();
        }
        chain
    }

    #[test]
    fn test_longer_valid_candidate_wins() {
        let mut local = chain_of_length(2);
        let local_tip = local.latest_block().unwrap().hash.clone();

        let remote = chain_of_length(4);
        let replaced = Consensus::resolve(&mut local, vec![remote.chain.clone()]);

        assert!(replaced);
        assert_eq!(local.chain.len(), 4);
        assert_ne!(local.latest_block().unwrap().hash, local_tip);
        assert!(local.verify_chain());
    }

    #[test]
    fn test_shorter_and_equal_candidates_ignored() {
        let mut local = chain_of_length(3);
        let original = local.chain.clone();

        let shorter = chain_of_length(2);
        let equal = chain_of_length(3);

        let replaced = Consensus::resolve(&mut local, vec![shorter.chain, equal.chain]);
        assert!(!replaced);
        assert_eq!(local.chain, original);
    }

    #[test]
    fn test_longer_invalid_candidate_ignored() {
        let mut local = chain_of_length(3);
        let original = local.chain.clone();

        let mut forged = chain_of_length(5);
        forged.chain[4].transactions[0].amount = 1_000_000.0;

        let replaced = Consensus::resolve(&mut local, vec![forged.chain]);
        assert!(!replaced);
        assert_eq!(local.chain, original);
    }

    #[test]
    fn test_longest_of_several_valid_candidates_wins() {
        let mut local = chain_of_length(2);

        let mid = chain_of_length(4);
        let longest = chain_of_length(6);
        let longest_tip = longest.latest_block().unwrap().hash.clone();

        // Iteration order must not matter: the longest valid candidate wins
        // even when seen first.
        let replaced = Consensus::resolve(&mut local, vec![longest.chain, mid.chain]);
        assert!(replaced);
        assert_eq!(local.chain.len(), 6);
        assert_eq!(local.latest_block().unwrap().hash, longest_tip);
    }

    #[test]
    fn test_mixed_candidates_per_length_rule() {
        // Local length 5; candidates of length 4 (valid) and 6 (valid).
        let mut local = chain_of_length(5);
        let four = chain_of_length(4);
        let six = chain_of_length(6);
        let six_tip = six.latest_block().unwrap().hash.clone();

        let replaced = Consensus::resolve(&mut local, vec![four.chain, six.chain]);
        assert!(replaced);
        assert_eq!(local.chain.len(), 6);
        assert_eq!(local.latest_block().unwrap().hash, six_tip);

        // A longer but invalid candidate leaves the chain unchanged.
        let mut seven = chain_of_length(7);
        seven.chain[6].previous_hash = "f".repeat(64);
        let replaced = Consensus::resolve(&mut local, vec![seven.chain]);
        assert!(!replaced);
        assert_eq!(local.chain.len(), 6);
    }

    #[test]
    fn test_pending_pool_not_reconciled() {
        let mut local = chain_of_length(2);
        let pending = crate::transaction::Transaction::coinbase("recipient", 1.0);
        local.submit_transaction(pending.clone()).unwrap();

        let remote = chain_of_length(4);
        assert!(Consensus::resolve(&mut local, vec![remote.chain]));

        // Stale pooled entries survive a replacement unchanged.
        assert_eq!(local.pending_transactions, vec![pending]);
    }
}
