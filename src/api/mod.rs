//! REST API module
//!
//! HTTP surface over a running node.
//!
//! # Endpoints
//!
//! ## Chain
//! - `GET /blockchain` - Chain, pending pool and node identity
//! - `GET /validate` - Validate the local chain
//! - `GET /consensus` - Adopt the longest valid peer chain
//!
//! ## Transactions and mining
//! - `POST /transaction/broadcast` - Create and relay a transaction
//! - `GET /mine` - Mine pending transactions and claim the reward
//!
//! ## Lookups
//! - `GET /block/{hash}` - Block by hash
//! - `GET /transaction/{id}` - Confirmed transaction and its block
//! - `GET /address/{address}` - Address history and balance

pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, ApiState};
pub use routes::create_router;
