//! Block implementation for the ledger
//!
//! A block carries an ordered snapshot of transactions, the nonce found by
//! proof-of-work and the hash linking it to its predecessor.

use crate::core::transaction::Transaction;
use crate::crypto::block_hash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Genesis Constants
// =============================================================================

/// Index of the genesis block
pub const GENESIS_INDEX: u64 = 1;

/// Nonce of the genesis block
pub const GENESIS_NONCE: u64 = 0;

/// Previous-hash placeholder of the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Hash of the genesis block
pub const GENESIS_HASH: &str = "0";

/// The payload covered by proof-of-work.
///
/// Only `transactions` and `index` are hashed; the block timestamp is not.
/// Field order fixes the encoding.
#[derive(Debug, Serialize)]
pub struct BlockData<'a> {
    pub transactions: &'a [Transaction],
    pub index: u64,
}

impl<'a> BlockData<'a> {
    pub fn new(transactions: &'a [Transaction], index: u64) -> Self {
        Self {
            transactions,
            index,
        }
    }

    /// Deterministic JSON encoding fed to the block hash
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Hash this data on top of `previous_hash` with the given nonce
    pub fn hash(&self, previous_hash: &str, nonce: u64) -> Result<String, serde_json::Error> {
        Ok(block_hash(previous_hash, &self.encode()?, nonce))
    }
}

/// A block in the chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// Block position, starting at 1 for genesis
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    /// Nonce used for proof of work
    pub nonce: u64,
    pub hash: String,
    pub previous_hash: String,
}

impl Block {
    /// The fixed genesis block shared by every node
    pub fn genesis() -> Self {
        Self {
            index: GENESIS_INDEX,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            transactions: Vec::new(),
            nonce: GENESIS_NONCE,
            hash: GENESIS_HASH.to_string(),
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
        }
    }

    /// Whether this block is the genesis block.
    ///
    /// The timestamp is not compared, it carries no consensus meaning.
    pub fn is_genesis(&self) -> bool {
        self.index == GENESIS_INDEX
            && self.nonce == GENESIS_NONCE
            && self.hash == GENESIS_HASH
            && self.previous_hash == GENESIS_PREVIOUS_HASH
            && self.transactions.is_empty()
    }

    /// The proof-of-work payload of this block
    pub fn data(&self) -> BlockData<'_> {
        BlockData::new(&self.transactions, self.index)
    }

    /// Recompute this block's hash from its contents
    pub fn compute_hash(&self) -> Result<String, serde_json::Error> {
        self.data().hash(&self.previous_hash, self.nonce)
    }

    /// Get number of transactions in this block
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}
