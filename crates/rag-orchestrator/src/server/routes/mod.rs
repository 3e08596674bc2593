//! API routes for the orchestrator server

pub mod generate;
pub mod query;
pub mod retrieve;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::server::state::AppState;

/// Build all `/v1` routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/retrieve", post(retrieve::retrieve_documents))
        .route("/generate", post(generate::generate_answer))
        .route("/query", post(query::query_rag))
        .route("/stats", get(stats))
        .route("/info", get(info))
}

/// GET /v1/stats - pipeline counters and cache statistics
async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let orchestrator = state.orchestrator();
    Json(json!({
        "orchestrator": orchestrator.stats(),
        "cache": orchestrator.cache_stats(),
    }))
}

/// GET /v1/info - API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    Json(json!({
        "name": config.service.name,
        "version": config.service.version,
        "description": "RAG orchestrator: retrieval, generation and cited answers",
        "backend": config.backend,
        "endpoints": {
            "POST /v1/retrieve": "Retrieve ranked documents for a query",
            "POST /v1/generate": "Generate an answer from query and context",
            "POST /v1/query": "Full pipeline: retrieve, generate, cite",
            "GET /v1/stats": "Pipeline counters and cache statistics",
            "GET /health": "Health check"
        }
    }))
}
