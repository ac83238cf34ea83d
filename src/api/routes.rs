//! REST API routes configuration

use crate::api::handlers::{self, ApiError, ApiState};
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Unknown routes answer with a JSON 404
async fn fallback_handler(uri: axum::http::Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            error: format!("No route for {}", uri.path()),
        }),
    )
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Chain
        .route("/blockchain", get(handlers::get_blockchain))
        .route("/validate", get(handlers::validate_chain))
        .route("/consensus", get(handlers::run_consensus))
        // Transactions and mining
        .route(
            "/transaction/broadcast",
            post(handlers::broadcast_transaction),
        )
        .route("/mine", get(handlers::mine_block))
        // Lookups
        .route("/block/{hash}", get(handlers::get_block))
        .route("/transaction/{id}", get(handlers::get_transaction))
        .route("/address/{address}", get(handlers::get_address))
        .fallback(fallback_handler)
        .with_state(state)
        .layer(cors)
}
