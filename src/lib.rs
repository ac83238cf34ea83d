//! PoW Ledger: a small proof-of-work peer-to-peer ledger node in Rust
//!
//! This crate provides:
//! - A transaction pool and block factory
//! - SHA-256 proof of work with a leading-zero difficulty
//! - Chain validation and longest-valid-chain consensus
//! - Block, transaction and address lookups
//! - A framed TCP peer protocol and an HTTP API
//!
//! # Example
//!
//! ```rust
//! use pow_ledger::core::{get_address_data, Blockchain, Transaction};
//!
//! // Create a chain with an easy difficulty
//! let mut blockchain = Blockchain::with_difficulty(1);
//!
//! // Queue a transaction and mine it
//! let tx = Transaction::new(10.0, "alice", "bob");
//! let index = blockchain.submit_transaction(tx).unwrap();
//! let block = blockchain.mine_block().unwrap();
//! assert_eq!(block.index, index);
//!
//! // Check balance
//! let bob = get_address_data(blockchain.blocks(), "bob");
//! println!("Balance: {}", bob.balance);
//! ```

pub mod api;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod network;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use core::{
    Block, Blockchain, BlockchainError, ChainSnapshot, NewTransaction, Transaction,
    TransactionError, MINING_REWARD,
};
pub use mining::{ProofOfWork, TransactionPool, DEFAULT_DIFFICULTY};
pub use network::{Node, NodeConfig, PeerClient, PeerRegistry, Server, TcpPeerClient};
