//! Blockchain implementation
//!
//! Owns the chain of blocks and the pending transaction pool. Every
//! mutation either appends one block or replaces the chain wholesale, and
//! every mutation resets the pending pool.

use crate::core::block::{Block, BlockData};
use crate::core::transaction::{Transaction, TransactionError};
use crate::core::validator::{linkage_ok, proof_of_work_ok, validate_chain};
use crate::mining::{MiningError, ProofOfWork, TransactionPool, DEFAULT_DIFFICULTY};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Blockchain-related errors
#[derive(Error, Debug)]
pub enum BlockchainError {
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(#[from] TransactionError),
    #[error(
        "Invalid block linkage: expected index {expected_index} on {expected_previous_hash}, \
         got index {index} on {previous_hash}"
    )]
    InvalidBlockLinkage {
        expected_index: u64,
        expected_previous_hash: String,
        index: u64,
        previous_hash: String,
    },
    #[error("Invalid proof of work for block {0}")]
    InvalidProofOfWork(u64),
    #[error("Invalid chain: {0}")]
    InvalidChain(String),
}

/// Chain plus pending pool, as exchanged between peers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub pending_transactions: Vec<Transaction>,
}

/// The ledger: chain of blocks and pending transactions
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks, never empty
    blocks: Vec<Block>,
    pending: TransactionPool,
    /// Mining difficulty (leading zero hex characters)
    pub difficulty: u32,
}

impl Blockchain {
    /// Create a new blockchain with genesis block
    pub fn new() -> Self {
        Self::with_difficulty(DEFAULT_DIFFICULTY)
    }

    /// Create a blockchain with custom difficulty
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            blocks: vec![Block::genesis()],
            pending: TransactionPool::new(),
            difficulty,
        }
    }

    /// Proof-of-work engine for this chain's difficulty
    pub fn pow(&self) -> ProofOfWork {
        ProofOfWork::new(self.difficulty)
    }

    /// Get the latest block
    pub fn latest_block(&self) -> &Block {
        // Invariant: the chain always holds at least the genesis block
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn pending(&self) -> &TransactionPool {
        &self.pending
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Queue a transaction for the next block.
    ///
    /// Returns the index of the block it is expected to land in.
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<u64, BlockchainError> {
        self.pending.submit(tx)?;
        Ok(self.latest_block().index + 1)
    }

    /// Append a block built on the tip from a nonce found by proof-of-work.
    ///
    /// `transactions` must be the pool snapshot the nonce was mined over.
    /// The nonce is trusted, not re-verified.
    pub fn create_block(
        &mut self,
        nonce: u64,
        previous_hash: String,
        hash: String,
        transactions: Vec<Transaction>,
    ) -> Block {
        let block = Block {
            index: self.latest_block().index + 1,
            timestamp: Utc::now(),
            transactions,
            nonce,
            hash,
            previous_hash,
        };

        self.blocks.push(block.clone());
        self.pending.clear();
        block
    }

    /// Synchronously mine the pending pool into a new block
    pub fn mine_block(&mut self) -> Result<Block, MiningError> {
        let previous_hash = self.latest_block().hash.clone();
        let index = self.latest_block().index + 1;
        let transactions = self.pending.drain();

        let solution = self.pow().mine(
            &previous_hash,
            &BlockData::new(&transactions, index),
            &CancellationToken::new(),
        )?;

        Ok(self.create_block(solution.nonce, previous_hash, solution.hash, transactions))
    }

    /// Accept a block produced elsewhere. It must extend the current tip and
    /// carry a valid proof of work; otherwise the chain is left unchanged.
    pub fn accept_block(&mut self, block: Block) -> Result<(), BlockchainError> {
        let latest = self.latest_block();

        if !linkage_ok(&block, latest) {
            return Err(BlockchainError::InvalidBlockLinkage {
                expected_index: latest.index + 1,
                expected_previous_hash: latest.hash.clone(),
                index: block.index,
                previous_hash: block.previous_hash,
            });
        }

        if !proof_of_work_ok(&block, &self.pow()) {
            return Err(BlockchainError::InvalidProofOfWork(block.index));
        }

        self.blocks.push(block);
        self.pending.clear();
        Ok(())
    }

    /// Replace chain and pool wholesale with a validated candidate
    pub fn replace(&mut self, snapshot: ChainSnapshot) -> Result<(), BlockchainError> {
        validate_chain(&snapshot.chain, &self.pow())?;
        self.blocks = snapshot.chain;
        self.pending = TransactionPool::from_snapshot(snapshot.pending_transactions);
        Ok(())
    }

    /// Validate the entire chain
    pub fn is_valid(&self) -> bool {
        validate_chain(&self.blocks, &self.pow()).is_ok()
    }

    /// Consistent copy of chain and pool
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            chain: self.blocks.clone(),
            pending_transactions: self.pending.drain(),
        }
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}
