//! Response types for the pipeline and its endpoints

use serde::{Deserialize, Serialize};

use super::document::{Document, Source};

/// Output of the generation stage
///
/// On the wire this is `{response}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(rename = "response")]
    pub answer_text: String,
}

impl GenerationResult {
    pub fn new(answer_text: impl Into<String>) -> Self {
        Self {
            answer_text: answer_text.into(),
        }
    }
}

/// `POST /v1/retrieve` response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub documents: Vec<Document>,
}

/// Pipeline stage that failed and was replaced by a fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedStage {
    Retrieval,
    Generation,
}

/// Metadata attached to every query result, including fallbacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// Whether the answer was served from the answer cache
    pub cache_hit: bool,
    /// Wall-clock duration of the whole pipeline in milliseconds
    pub latency_ms: u64,
    /// Description of the downstream failure, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stage that was replaced by a fallback, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<FailedStage>,
}

impl QueryMetadata {
    /// Metadata for a fully successful run
    pub fn success(latency_ms: u64) -> Self {
        Self {
            cache_hit: false,
            latency_ms,
            error: None,
            degraded: None,
        }
    }

    /// Metadata for a run where `stage` failed
    pub fn degraded(stage: FailedStage, error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            cache_hit: false,
            latency_ms,
            error: Some(error.into()),
            degraded: Some(stage),
        }
    }
}

/// Final answer with citations (`POST /v1/query` response body)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Generated answer, or a fallback explanation
    pub answer: String,
    /// One citation per retrieved document, in retrieval order
    pub sources: Vec<Source>,
    /// Pipeline metadata
    #[serde(rename = "meta")]
    pub metadata: QueryMetadata,
}

impl QueryResult {
    /// Compose a result from retrieved documents
    pub fn new(answer: impl Into<String>, documents: &[Document], metadata: QueryMetadata) -> Self {
        Self {
            answer: answer.into(),
            sources: documents.iter().map(Source::from_document).collect(),
            metadata,
        }
    }
}

/// `GET /health` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.into(),
            version: version.into(),
        }
    }
}
