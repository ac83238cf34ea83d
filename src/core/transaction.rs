//! Transaction handling for the ledger
//!
//! Transactions are plain account-to-account transfers. They are immutable
//! once created and carry no signature; ownership is not authenticated.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Reserved sender for mining rewards
pub const REWARD_SENDER: &str = "00";

/// Amount credited to the miner of each block
pub const MINING_REWARD: f64 = 12.5;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransactionError {
    #[error("Missing sender address")]
    MissingSender,
    #[error("Missing recipient address")]
    MissingRecipient,
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(f64),
    #[error("Transaction {0} is already pending")]
    AlreadyPending(String),
}

// =============================================================================
// Transaction
// =============================================================================

/// A transfer of `amount` from `sender` to `recipient`.
///
/// Field order is significant: it fixes the JSON encoding that goes into
/// every block hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Unique identifier (32 hex characters)
    pub id: String,
    pub amount: f64,
    pub sender: String,
    pub recipient: String,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction with a fresh id and the current time
    pub fn new(amount: f64, sender: &str, recipient: &str) -> Self {
        Self {
            id: new_transaction_id(),
            amount,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Create the reward transaction paying a miner
    pub fn reward(recipient: &str) -> Self {
        Self::new(MINING_REWARD, REWARD_SENDER, recipient)
    }

    /// Whether this transaction comes from the reserved reward sender
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }

    /// Structural validation applied before a transaction enters the pool
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.sender.trim().is_empty() {
            return Err(TransactionError::MissingSender);
        }
        if self.recipient.trim().is_empty() {
            return Err(TransactionError::MissingRecipient);
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(TransactionError::NonPositiveAmount(self.amount));
        }
        // Rewards are exempt from the positive-amount rule
        if !self.is_reward() && self.amount <= 0.0 {
            return Err(TransactionError::NonPositiveAmount(self.amount));
        }
        Ok(())
    }
}

/// Transaction request as it arrives from a client, before an id and
/// timestamp are assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: f64,
    pub sender: String,
    pub recipient: String,
}

impl NewTransaction {
    /// Validate the request and turn it into a transaction
    pub fn into_transaction(self) -> Result<Transaction, TransactionError> {
        let tx = Transaction::new(self.amount, &self.sender, &self.recipient);
        tx.validate()?;
        Ok(tx)
    }
}

/// Generate a random 128-bit identifier rendered as hex
pub fn new_transaction_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
