//! Transaction pool for pending transactions
//!
//! Holds submitted transactions until the next block is formed. The pool is
//! never merged or partially pruned: any change to the chain resets it.

use crate::core::{Transaction, TransactionError};
use serde::{Deserialize, Serialize};

/// Ordered pool of transactions not yet embedded in any block
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from a peer's snapshot, dropping malformed entries
    pub fn from_snapshot(transactions: Vec<Transaction>) -> Self {
        let transactions = transactions
            .into_iter()
            .filter(|tx| match tx.validate() {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Dropping malformed pending transaction {}: {}", tx.id, e);
                    false
                }
            })
            .collect();
        Self { transactions }
    }

    /// Validate and append a transaction; an id already in the pool is refused
    pub fn submit(&mut self, tx: Transaction) -> Result<(), TransactionError> {
        tx.validate()?;
        if self.contains(&tx.id) {
            return Err(TransactionError::AlreadyPending(tx.id));
        }
        log::debug!("Transaction {} added to pending pool", tx.id);
        self.transactions.push(tx);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.transactions.iter().any(|tx| tx.id == id)
    }

    /// Snapshot of the pool's current contents; the pool is left untouched
    pub fn drain(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Discard every pending transaction
    pub fn clear(&mut self) {
        if !self.transactions.is_empty() {
            log::debug!(
                "Clearing {} pending transactions",
                self.transactions.len()
            );
        }
        self.transactions.clear();
    }

    /// Pending transactions in arrival order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_and_drain() {
        let mut pool = TransactionPool::new();
        let tx = Transaction::new(10.0, "A", "B");

        pool.submit(tx.clone()).unwrap();
        assert_eq!(pool.len(), 1);

        let snapshot = pool.drain();
        assert_eq!(snapshot, vec![tx]);
        // drain does not clear
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_submit_rejects_malformed() {
        let mut pool = TransactionPool::new();
        assert!(pool.submit(Transaction::new(0.0, "A", "B")).is_err());
        assert!(pool.submit(Transaction::new(1.0, "", "B")).is_err());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_submit_refuses_pending_id() {
        let mut pool = TransactionPool::new();
        let tx = Transaction::new(5.0, "A", "B");

        pool.submit(tx.clone()).unwrap();
        let result = pool.submit(tx.clone());

        assert_eq!(result, Err(TransactionError::AlreadyPending(tx.id.clone())));
        assert_eq!(pool.transactions(), &[tx]);
    }

    #[test]
    fn test_preserves_arrival_order() {
        let mut pool = TransactionPool::new();
        let first = Transaction::new(1.0, "A", "B");
        let second = Transaction::new(2.0, "B", "C");
        pool.submit(first.clone()).unwrap();
        pool.submit(second.clone()).unwrap();
        assert_eq!(pool.transactions(), &[first, second]);
    }

    #[test]
    fn test_clear() {
        let mut pool = TransactionPool::new();
        pool.submit(Transaction::new(1.0, "A", "B")).unwrap();
        pool.submit(Transaction::reward("miner")).unwrap();
        pool.clear();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_from_snapshot_drops_malformed() {
        let good = Transaction::new(1.0, "A", "B");
        let bad = Transaction::new(-1.0, "A", "B");
        let pool = TransactionPool::from_snapshot(vec![good.clone(), bad]);
        assert_eq!(pool.transactions(), &[good]);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let mut pool = TransactionPool::new();
        pool.submit(Transaction::new(1.0, "A", "B")).unwrap();
        let json = serde_json::to_value(&pool).unwrap();
        assert!(json.is_array());
    }
}
