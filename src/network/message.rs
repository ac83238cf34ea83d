//! Network message types for peer communication
//!
//! Every peer exchange is a single request followed by a single response.

use crate::core::{Block, ChainSnapshot, Transaction};
use serde::{Deserialize, Serialize};

/// Magic bytes for message framing
pub const MAGIC: [u8; 4] = [0x4C, 0x44, 0x47, 0x52]; // "LDGR"

/// Maximum accepted frame payload
pub const MAX_MESSAGE_SIZE: usize = 32 * 1024 * 1024;

/// Peer protocol messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Message {
    /// Relay a transaction into the peer's pending pool
    NewTransaction(Transaction),

    /// Announce a newly mined block
    NewBlock(Block),

    /// Request the peer's chain and pending pool
    GetSnapshot,

    /// Transaction queued; expected block index
    TransactionQueued { block_index: u64 },

    /// Block appended to the peer's chain
    BlockAccepted { index: u64 },

    /// Response with chain and pending pool
    Snapshot(ChainSnapshot),

    /// Request refused
    Rejected { reason: String },
}

impl Message {
    /// Serialize message to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Get message type name for logging
    pub fn type_name(&self) -> &'static str {
        match self {
            Message::NewTransaction(_) => "NewTransaction",
            Message::NewBlock(_) => "NewBlock",
            Message::GetSnapshot => "GetSnapshot",
            Message::TransactionQueued { .. } => "TransactionQueued",
            Message::BlockAccepted { .. } => "BlockAccepted",
            Message::Snapshot(_) => "Snapshot",
            Message::Rejected { .. } => "Rejected",
        }
    }
}
