//! Generation endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::{extract::ValidJson, state::AppState};
use crate::types::{GenerateRequest, GenerationResult};

/// POST /v1/generate - Generate an answer from the given context
pub async fn generate_answer(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<GenerateRequest>,
) -> Result<Json<GenerationResult>> {
    let result = state
        .generation_service()
        .generate(&request.query, &request.context)
        .await?;

    Ok(Json(result))
}
