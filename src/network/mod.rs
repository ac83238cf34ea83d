//! Peer-to-peer networking module
//!
//! Provides the node engine and its peer plumbing.
//!
//! # Features
//! - TCP request/response peer protocol
//! - Transaction and block relay with per-peer failure isolation
//! - Longest-valid-chain consensus
//! - Cancellable background mining

pub mod consensus;
pub mod message;
pub mod node;
pub mod peer;
pub mod server;

pub use consensus::{resolve, ConsensusOutcome, ConsensusReport, ConsensusResolver};
pub use message::{Message, MAGIC, MAX_MESSAGE_SIZE};
pub use node::{
    MinedBlock, Node, NodeConfig, NodeError, NodeSnapshot, TransactionBroadcast,
    TransactionRecord,
};
pub use peer::{
    fan_out, BroadcastReport, PeerClient, PeerError, PeerFailure, PeerRegistry,
};
pub use server::{connect_to_peer, MessageCodec, Server, TcpPeerClient};
