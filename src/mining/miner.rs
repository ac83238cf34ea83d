//! Proof-of-work engine
//!
//! Brute-force nonce search against the leading-zero difficulty predicate.
//! The search is CPU bound, so it runs on the blocking thread pool and
//! polls a cancellation token to give up when the chain moves underneath it.

use crate::core::{BlockData, Transaction};
use crate::crypto::{block_hash, meets_difficulty};
use log::info;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Default mining difficulty (number of leading zero hex characters)
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Highest satisfiable difficulty: the length of a hex SHA-256 digest
pub const MAX_DIFFICULTY: u32 = 64;

/// How many nonces are tried between cancellation checks
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Mining errors
#[derive(Error, Debug)]
pub enum MiningError {
    #[error("Mining cancelled: a competing block changed the chain tip")]
    Cancelled,
    #[error("Mined block is stale: chain tip moved from {0}")]
    Stale(String),
    #[error("Nonce space exhausted")]
    Exhausted,
    #[error("Difficulty {0} can never be met (maximum is {})", MAX_DIFFICULTY)]
    UnreachableDifficulty(u32),
    #[error("Failed to encode block data: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("Mining worker failed: {0}")]
    Worker(String),
}

/// Mining statistics
#[derive(Debug, Clone, Serialize)]
pub struct MiningStats {
    /// Number of hash attempts
    pub hash_attempts: u64,
    /// Time taken in milliseconds
    pub time_ms: u128,
    /// Hash rate (hashes per second)
    pub hash_rate: f64,
}

/// A nonce satisfying the difficulty predicate, with its hash
#[derive(Debug, Clone)]
pub struct Solution {
    pub nonce: u64,
    pub hash: String,
    pub stats: MiningStats,
}

/// Proof-of-work engine for a fixed difficulty
#[derive(Debug, Clone, Copy)]
pub struct ProofOfWork {
    pub difficulty: u32,
}

impl ProofOfWork {
    pub fn new(difficulty: u32) -> Self {
        Self { difficulty }
    }

    /// Deterministic hash of a candidate block
    pub fn hash(
        &self,
        previous_hash: &str,
        data: &BlockData<'_>,
        nonce: u64,
    ) -> Result<String, serde_json::Error> {
        data.hash(previous_hash, nonce)
    }

    /// Whether a digest satisfies this engine's difficulty
    pub fn is_satisfied_by(&self, hash: &str) -> bool {
        meets_difficulty(hash, self.difficulty)
    }

    /// Find the first nonce, counting up from zero, whose hash meets the
    /// difficulty. Returns `Cancelled` as soon as `cancel` fires.
    pub fn mine(
        &self,
        previous_hash: &str,
        data: &BlockData<'_>,
        cancel: &CancellationToken,
    ) -> Result<Solution, MiningError> {
        let encoded = data.encode()?;
        self.search(previous_hash, &encoded, cancel)
    }

    fn search(
        &self,
        previous_hash: &str,
        encoded_data: &str,
        cancel: &CancellationToken,
    ) -> Result<Solution, MiningError> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(MiningError::UnreachableDifficulty(self.difficulty));
        }

        let start = Instant::now();
        let mut nonce = 0u64;

        loop {
            if nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
                return Err(MiningError::Cancelled);
            }

            let hash = block_hash(previous_hash, encoded_data, nonce);
            if self.is_satisfied_by(&hash) {
                let stats = Self::stats(nonce + 1, start);
                return Ok(Solution { nonce, hash, stats });
            }

            nonce = nonce.checked_add(1).ok_or(MiningError::Exhausted)?;
        }
    }

    /// Run the search on the blocking pool so async readers keep running
    pub async fn mine_detached(
        self,
        previous_hash: String,
        transactions: Vec<Transaction>,
        index: u64,
        cancel: CancellationToken,
    ) -> Result<Solution, MiningError> {
        let encoded = BlockData::new(&transactions, index).encode()?;

        info!(
            "Mining block {} with difficulty {}...",
            index, self.difficulty
        );

        let solution = tokio::task::spawn_blocking(move || {
            self.search(&previous_hash, &encoded, &cancel)
        })
        .await
        .map_err(|e| MiningError::Worker(e.to_string()))??;

        info!(
            "Block {} mined in {}ms ({} attempts, {:.2} H/s)",
            index, solution.stats.time_ms, solution.stats.hash_attempts, solution.stats.hash_rate
        );

        Ok(solution)
    }

    fn stats(attempts: u64, start: Instant) -> MiningStats {
        let elapsed = start.elapsed().as_millis();
        let hash_rate = if elapsed > 0 {
            (attempts as f64) / (elapsed as f64 / 1000.0)
        } else {
            attempts as f64
        };

        MiningStats {
            hash_attempts: attempts,
            time_ms: elapsed,
            hash_rate,
        }
    }
}

/// Hands out the token current searches watch, and cancels them all when
/// the chain tip moves.
#[derive(Debug, Default)]
pub struct MiningSignal {
    token: Mutex<CancellationToken>,
}

impl MiningSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a search starting now
    pub fn current(&self) -> CancellationToken {
        self.token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Cancel every search started so far; later searches get a fresh token
    pub fn cancel_all(&self) {
        let mut token = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        token.cancel();
        *token = CancellationToken::new();
    }
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY)
    }
}
