//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Transactions (account-to-account transfers, reward convention)
//! - Blocks (proof-of-work payload and genesis constants)
//! - Blockchain (chain plus pending pool, append and replace)
//! - Validation (linkage and whole-chain proof-of-work checks)
//! - Lookups (by block hash, transaction id, address)

pub mod block;
pub mod blockchain;
pub mod lookup;
pub mod transaction;
pub mod validator;

pub use block::{
    Block, BlockData, GENESIS_HASH, GENESIS_INDEX, GENESIS_NONCE, GENESIS_PREVIOUS_HASH,
};
pub use blockchain::{Blockchain, BlockchainError, ChainSnapshot};
pub use lookup::{get_address_data, get_block, get_transaction, AddressData, TransactionLocation};
pub use transaction::{
    NewTransaction, Transaction, TransactionError, MINING_REWARD, REWARD_SENDER,
};
pub use validator::{chain_valid, linkage_ok, proof_of_work_ok, validate_chain};
