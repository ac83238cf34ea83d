//! Peers: the registry of known endpoints, the client used to reach them,
//! and fan-out of one call to every peer.
//!
//! A failing peer is recorded in the report and never aborts the
//! operation for the others.

use crate::core::{Block, ChainSnapshot, Transaction};
use futures::future::{join_all, BoxFuture};
use serde::Serialize;
use std::collections::BTreeSet;
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

fn split_endpoint(endpoint: &str) -> Option<(&str, u16)> {
    let (host, port) = endpoint.rsplit_once(':')?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    Some((host, port.parse().ok()?))
}

fn is_local_host(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback() || ip.is_unspecified())
            .unwrap_or(false)
}

/// Whether `candidate` reaches this node's own listener
fn is_own_endpoint(own: &str, candidate: &str) -> bool {
    if own == candidate {
        return true;
    }
    match (split_endpoint(own), split_endpoint(candidate)) {
        (Some((own_host, own_port)), Some((host, port))) => {
            own_port == port && is_local_host(own_host) && is_local_host(host)
        }
        _ => false,
    }
}

/// Peer communication errors
#[derive(Error, Debug)]
pub enum PeerError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Peer timed out after {0}ms")]
    Timeout(u128),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Peer disconnected")]
    Disconnected,
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(&'static str),
    #[error("Peer rejected request: {0}")]
    Rejected(String),
}

/// Outbound calls the node makes to a peer
pub trait PeerClient: Send + Sync {
    /// Relay a transaction; returns the peer's expected block index
    fn send_transaction<'a>(
        &'a self,
        peer: &'a str,
        tx: Transaction,
    ) -> BoxFuture<'a, Result<u64, PeerError>>;

    /// Announce a mined block
    fn send_block<'a>(&'a self, peer: &'a str, block: Block)
        -> BoxFuture<'a, Result<(), PeerError>>;

    /// Fetch the peer's chain and pending pool
    fn fetch_snapshot<'a>(&'a self, peer: &'a str) -> BoxFuture<'a, Result<ChainSnapshot, PeerError>>;
}

/// The set of peer endpoints this node talks to, never including itself
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    own_endpoint: String,
    peers: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new(own_endpoint: &str) -> Self {
        Self {
            own_endpoint: own_endpoint.to_string(),
            peers: BTreeSet::new(),
        }
    }

    /// Build a registry from configured endpoints, skipping blanks and any
    /// loopback alias of our own endpoint (`localhost:8333` for `127.0.0.1:8333`)
    pub fn with_peers<I, S>(own_endpoint: &str, peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers = peers
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty() && !is_own_endpoint(own_endpoint, p))
            .collect();

        Self {
            own_endpoint: own_endpoint.to_string(),
            peers,
        }
    }

    pub fn own_endpoint(&self) -> &str {
        &self.own_endpoint
    }

    /// All peer endpoints
    pub fn enumerate(&self) -> Vec<String> {
        self.peers.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// A peer that could not be reached during a fan-out
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeerFailure {
    pub peer: String,
    pub error: String,
}

/// Per-peer outcome of a broadcast
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BroadcastReport {
    pub delivered: Vec<String>,
    pub failed: Vec<PeerFailure>,
}

impl BroadcastReport {
    /// Summarise fan-out results, logging each failure
    pub fn from_results<T>(what: &str, results: Vec<(String, Result<T, PeerError>)>) -> Self {
        let mut report = Self::default();

        for (peer, result) in results {
            match result {
                Ok(_) => report.delivered.push(peer),
                Err(e) => {
                    log::warn!("Failed to send {} to {}: {}", what, peer, e);
                    report.failed.push(PeerFailure {
                        peer,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Issue `call` against every peer concurrently. Completes once every call
/// has settled; each call is bounded by `timeout`.
pub async fn fan_out<T, F, Fut>(
    peers: Vec<String>,
    timeout: Duration,
    call: F,
) -> Vec<(String, Result<T, PeerError>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, PeerError>>,
{
    let calls = peers.into_iter().map(|peer| {
        let request = call(peer.clone());
        async move {
            let result = match tokio::time::timeout(timeout, request).await {
                Ok(result) => result,
                Err(_) => Err(PeerError::Timeout(timeout.as_millis())),
            };
            (peer, result)
        }
    });

    join_all(calls).await
}
