//! Mining module: proof-of-work search and the pending transaction pool

pub mod mempool;
pub mod miner;

pub use mempool::TransactionPool;
pub use miner::{
    MiningError, MiningSignal, MiningStats, ProofOfWork, Solution, DEFAULT_DIFFICULTY,
    MAX_DIFFICULTY,
};
