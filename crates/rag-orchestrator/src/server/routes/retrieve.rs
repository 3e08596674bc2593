//! Retrieval endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::{extract::ValidJson, state::AppState};
use crate::types::{RetrieveRequest, RetrieveResponse};

/// POST /v1/retrieve - Retrieve ranked documents
pub async fn retrieve_documents(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>> {
    let documents = state
        .retrieval_service()
        .retrieve(&request.query, request.limit)
        .await?;

    tracing::debug!("Retrieved {} documents (limit {})", documents.len(), request.limit);

    Ok(Json(RetrieveResponse { documents }))
}
