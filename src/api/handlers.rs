//! REST API handlers for ledger operations

use crate::core::{
    AddressData, Block, BlockchainError, NewTransaction, Transaction, TransactionError,
};
use crate::mining::{MiningError, MiningStats};
use crate::network::{
    BroadcastReport, ConsensusReport, Node, NodeError, NodeSnapshot, TransactionRecord,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub node: Arc<Node>,
}

impl ApiState {
    pub fn new(node: Arc<Node>) -> Self {
        Self { node }
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub blocks: usize,
    pub peers: usize,
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub note: String,
    pub transaction: Transaction,
    pub block_index: u64,
    pub broadcast: BroadcastReport,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub note: String,
    pub block: Block,
    pub stats: MiningStats,
    pub broadcast: BroadcastReport,
    pub reward: Transaction,
}

#[derive(Serialize)]
pub struct ConsensusResponse {
    pub note: String,
    #[serde(flatten)]
    pub report: ConsensusReport,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub blocks_checked: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn error_response(e: NodeError) -> (StatusCode, Json<ApiError>) {
    let status = match &e {
        NodeError::Blockchain(BlockchainError::MalformedTransaction(
            TransactionError::AlreadyPending(_),
        )) => StatusCode::CONFLICT,
        NodeError::Blockchain(BlockchainError::MalformedTransaction(_)) => StatusCode::BAD_REQUEST,
        NodeError::Blockchain(_) => StatusCode::CONFLICT,
        NodeError::Mining(MiningError::Cancelled) | NodeError::Mining(MiningError::Stale(_)) => {
            StatusCode::CONFLICT
        }
        NodeError::Mining(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ApiError {
            error: e.to_string(),
        }),
    )
}

fn bad_request(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: format!("Malformed transaction: {}", rejection.body_text()),
        }),
    )
}

fn not_found(what: String) -> (StatusCode, Json<ApiError>) {
    (StatusCode::NOT_FOUND, Json(ApiError { error: what }))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Liveness check
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let snapshot = state.node.chain_snapshot().await;
    Json(HealthResponse {
        status: "ok",
        blocks: snapshot.chain.len(),
        peers: state.node.registry().len(),
    })
}

/// GET /blockchain - Whole chain, pending pool and node identity
pub async fn get_blockchain(State(state): State<ApiState>) -> Json<NodeSnapshot> {
    Json(state.node.node_snapshot().await)
}

/// POST /transaction/broadcast - Create a transaction and relay it to peers
pub async fn broadcast_transaction(
    State(state): State<ApiState>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> ApiResult<TransactionResponse> {
    let Json(req) = payload.map_err(bad_request)?;
    let sent = state
        .node
        .broadcast_transaction(req)
        .await
        .map_err(error_response)?;

    Ok(Json(TransactionResponse {
        note: format!(
            "Transaction created and broadcast; it will be added in block {}.",
            sent.block_index
        ),
        transaction: sent.transaction,
        block_index: sent.block_index,
        broadcast: sent.broadcast,
    }))
}

/// GET /mine - Mine the pending pool into a block and claim the reward
pub async fn mine_block(State(state): State<ApiState>) -> ApiResult<MineResponse> {
    let (mined, reward) = state
        .node
        .mine_and_reward()
        .await
        .map_err(error_response)?;

    Ok(Json(MineResponse {
        note: format!("New block {} mined and broadcast", mined.block.index),
        block: mined.block,
        stats: mined.stats,
        broadcast: mined.broadcast,
        reward: reward.transaction,
    }))
}

/// GET /consensus - Adopt the longest valid chain among peers
pub async fn run_consensus(State(state): State<ApiState>) -> Json<ConsensusResponse> {
    let report = state.node.run_consensus().await;
    let note = if report.outcome.is_replaced() {
        "This chain has been replaced."
    } else {
        "Current chain has not been replaced."
    };

    Json(ConsensusResponse {
        note: note.to_string(),
        report,
        chain: state.node.chain_snapshot().await.chain,
    })
}

/// GET /validate - Validate the local chain
pub async fn validate_chain(State(state): State<ApiState>) -> Json<ValidationResponse> {
    let valid = state.node.is_chain_valid().await;
    let block_count = state.node.chain_snapshot().await.chain.len();

    Json(ValidationResponse {
        valid,
        blocks_checked: block_count,
        message: if valid {
            format!("Blockchain is valid ({} blocks verified)", block_count)
        } else {
            "Blockchain validation failed".to_string()
        },
    })
}

/// GET /block/{hash} - Block by hash
pub async fn get_block(
    State(state): State<ApiState>,
    Path(hash): Path<String>,
) -> ApiResult<Block> {
    state
        .node
        .get_block(&hash)
        .await
        .map(Json)
        .ok_or_else(|| not_found(format!("Block {} not found", hash)))
}

/// GET /transaction/{id} - Confirmed transaction and its block
pub async fn get_transaction(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<TransactionRecord> {
    state
        .node
        .get_transaction(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(format!("Transaction {} not found", id)))
}

/// GET /address/{address} - Transactions and balance of an address
pub async fn get_address(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> Json<AddressData> {
    Json(state.node.get_address_data(&address).await)
}
