//! Read-only queries over the chain
//!
//! Lookups scan the chain in order; nothing is indexed ahead of time, so
//! results always reflect the chain they are given.

use crate::core::{Block, Transaction};
use serde::Serialize;

/// A transaction together with the block that contains it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransactionLocation<'a> {
    pub transaction: &'a Transaction,
    pub block: &'a Block,
}

/// Every transaction touching an address, plus its derived balance
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AddressData {
    pub address: String,
    pub transactions: Vec<Transaction>,
    /// Received minus sent
    pub balance: f64,
}

/// Find a block by hash
pub fn get_block<'a>(chain: &'a [Block], hash: &str) -> Option<&'a Block> {
    chain.iter().find(|block| block.hash == hash)
}

/// Find the first transaction with `id`, in chain order
pub fn get_transaction<'a>(chain: &'a [Block], id: &str) -> Option<TransactionLocation<'a>> {
    chain.iter().find_map(|block| {
        block
            .transactions
            .iter()
            .find(|tx| tx.id == id)
            .map(|transaction| TransactionLocation { transaction, block })
    })
}

/// Collect all confirmed transactions sent or received by `address`
pub fn get_address_data(chain: &[Block], address: &str) -> AddressData {
    let mut balance = 0.0;
    let mut transactions = Vec::new();

    for tx in chain.iter().flat_map(|block| &block.transactions) {
        if tx.recipient == address {
            balance += tx.amount;
        }
        if tx.sender == address {
            balance -= tx.amount;
        }
        if tx.sender == address || tx.recipient == address {
            transactions.push(tx.clone());
        }
    }

    AddressData {
        address: address.to_string(),
        transactions,
        balance,
    }
}
