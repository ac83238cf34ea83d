//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing
//! - The block hash used by proof-of-work
//! - The difficulty predicate

pub mod hash;

pub use hash::{block_hash, meets_difficulty, sha256, sha256_hex};
