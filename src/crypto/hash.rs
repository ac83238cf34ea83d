//! Cryptographic hashing utilities for the ledger
//!
//! Provides the SHA-256 based block hash and the proof-of-work
//! difficulty predicate. Every node must derive the same digest for
//! the same inputs, so the encoding here is part of the protocol.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Hash a candidate block: `previous_hash`, then the decimal nonce, then the
/// already-serialized block data.
pub fn block_hash(previous_hash: &str, encoded_data: &str, nonce: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(previous_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.update(encoded_data.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks if a hex digest meets the difficulty target.
/// The digest must start with `difficulty` `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let required = difficulty as usize;
    hash.len() >= required && hash.bytes().take(required).all(|b| b == b'0')
}
