//! Longest-valid-chain consensus
//!
//! Pull based: on demand, every peer is asked for its chain and pending
//! pool. The strictly longest chain that validates wins; on a tie the local
//! chain is kept. A winner overwrites local chain and pool wholesale.

use crate::core::{Blockchain, ChainSnapshot};
use crate::network::peer::{fan_out, PeerClient, PeerFailure, PeerRegistry};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Result of a consensus round
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConsensusOutcome {
    /// Local chain and pool were overwritten by `source`'s
    Replaced { source: String, length: usize },
    /// Local chain kept
    Kept { length: usize },
}

impl ConsensusOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, ConsensusOutcome::Replaced { .. })
    }
}

/// Consensus outcome plus the peers that could not take part
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusReport {
    #[serde(flatten)]
    pub outcome: ConsensusOutcome,
    /// Peers whose snapshot could not be fetched
    pub unreachable: Vec<PeerFailure>,
    /// Longer peer chains that failed validation
    pub invalid: Vec<PeerFailure>,
}

/// Apply the fork-choice rule to already fetched candidates.
///
/// Candidates are tried longest first (peer order breaks ties); the first
/// one that is strictly longer than the local chain and validates replaces
/// it. Shorter or equal chains are never validated.
pub fn resolve(
    local: &mut Blockchain,
    mut candidates: Vec<(String, ChainSnapshot)>,
) -> (ConsensusOutcome, Vec<PeerFailure>) {
    let mut invalid = Vec::new();

    // Stable sort keeps registry order among equal lengths
    candidates.sort_by(|a, b| b.1.chain.len().cmp(&a.1.chain.len()));

    for (peer, snapshot) in candidates {
        let length = snapshot.chain.len();
        if length <= local.len() {
            break;
        }

        match local.replace(snapshot) {
            Ok(()) => {
                log::info!("Chain replaced by {}'s chain of {} blocks", peer, length);
                return (
                    ConsensusOutcome::Replaced {
                        source: peer,
                        length,
                    },
                    invalid,
                );
            }
            Err(e) => {
                log::warn!("Discarding chain of {} blocks from {}: {}", length, peer, e);
                invalid.push(PeerFailure {
                    peer,
                    error: e.to_string(),
                });
            }
        }
    }

    (
        ConsensusOutcome::Kept {
            length: local.len(),
        },
        invalid,
    )
}

/// Gathers consensus candidates from the registered peers
pub struct ConsensusResolver {
    registry: Arc<PeerRegistry>,
    client: Arc<dyn PeerClient>,
    timeout: Duration,
}

impl ConsensusResolver {
    pub fn new(registry: Arc<PeerRegistry>, client: Arc<dyn PeerClient>, timeout: Duration) -> Self {
        Self {
            registry,
            client,
            timeout,
        }
    }

    /// Fetch every peer's snapshot; unreachable peers are reported, not fatal
    pub async fn collect(&self) -> (Vec<(String, ChainSnapshot)>, Vec<PeerFailure>) {
        let client = &self.client;
        let results = fan_out(self.registry.enumerate(), self.timeout, |peer| async move {
            client.fetch_snapshot(&peer).await
        })
        .await;

        let mut candidates = Vec::new();
        let mut unreachable = Vec::new();

        for (peer, result) in results {
            match result {
                Ok(snapshot) => candidates.push((peer, snapshot)),
                Err(e) => {
                    log::warn!("Peer {} unreachable during consensus: {}", peer, e);
                    unreachable.push(PeerFailure {
                        peer,
                        error: e.to_string(),
                    });
                }
            }
        }

        (candidates, unreachable)
    }

    /// One full consensus round against `blockchain`.
    ///
    /// Snapshots are fetched without holding the lock; the fork choice and
    /// any replacement happen under a single write lock. `on_replace` runs
    /// while that lock is still held.
    pub async fn run<F>(&self, blockchain: &RwLock<Blockchain>, on_replace: F) -> ConsensusReport
    where
        F: FnOnce(),
    {
        let (candidates, unreachable) = self.collect().await;

        let mut chain = blockchain.write().await;
        let (outcome, invalid) = resolve(&mut chain, candidates);

        if outcome.is_replaced() {
            on_replace();
        } else {
            log::info!("Current chain of {} blocks kept", chain.len());
        }

        ConsensusReport {
            outcome,
            unreachable,
            invalid,
        }
    }
}
