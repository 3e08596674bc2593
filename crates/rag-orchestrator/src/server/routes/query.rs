//! Query endpoint: full RAG pipeline with citations

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::{extract::ValidJson, state::AppState};
use crate::types::{Query, QueryRequest, QueryResult};

/// POST /v1/query - Query the RAG pipeline
///
/// Downstream failures still answer 200 with `meta.error` set.
pub async fn query_rag(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<QueryRequest>,
) -> Result<Json<QueryResult>> {
    let query = Query::from(request);
    let outcome = state.orchestrator().process_query(&query).await?;

    if let Some(stage) = outcome.failed_stage() {
        tracing::warn!("Serving degraded answer ({:?} failed)", stage);
    }

    Ok(Json(outcome.into_result()))
}
