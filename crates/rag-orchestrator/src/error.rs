//! Error types for the orchestrator

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of the retrieval stage
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    /// Backend unreachable (connect/transport error)
    #[error("retrieval service unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its timeout
    #[error("retrieval timed out after {0:?}")]
    Timeout(Duration),

    /// Backend answered with a non-success status
    #[error("retrieval service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Backend answered with a body that does not match the contract
    #[error("malformed retrieval response: {0}")]
    MalformedResponse(String),

    /// Programming defect in a retrieval backend; never degraded into a fallback
    #[error("retrieval backend defect: {0}")]
    Defect(String),
}

/// Failure of the generation stage
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Backend unreachable (connect/transport error)
    #[error("generation service unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its timeout
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    /// Backend answered with a non-success status (including rate limiting)
    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Backend answered with a body that does not match the contract
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),

    /// Programming defect in a generation backend; never degraded into a fallback
    #[error("generation backend defect: {0}")]
    Defect(String),
}

/// Shared behaviour of the per-stage errors, used by the retry/timeout policy
pub trait StageError: std::error::Error + Send + Sync + 'static {
    /// Error for a call that exceeded `after`
    fn timed_out(after: Duration) -> Self;

    /// Whether another attempt may succeed
    fn is_transient(&self) -> bool;

    /// Whether this is a defect that must surface as a hard failure
    fn is_defect(&self) -> bool;

    /// Caller-facing description, without transport detail such as service URLs
    fn summary(&self) -> String;
}

fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

impl StageError for RetrievalError {
    fn timed_out(after: Duration) -> Self {
        Self::Timeout(after)
    }

    fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => is_transient_status(*status),
            Self::MalformedResponse(_) | Self::Defect(_) => false,
        }
    }

    fn is_defect(&self) -> bool {
        matches!(self, Self::Defect(_))
    }

    fn summary(&self) -> String {
        match self {
            Self::Unavailable(_) => "retrieval service unavailable".to_string(),
            Self::Timeout(after) => format!("retrieval timed out after {:?}", after),
            Self::Status { status, .. } => format!("retrieval service returned HTTP {}", status),
            Self::MalformedResponse(_) => "malformed retrieval response".to_string(),
            Self::Defect(_) => "retrieval backend defect".to_string(),
        }
    }
}

impl StageError for GenerationError {
    fn timed_out(after: Duration) -> Self {
        Self::Timeout(after)
    }

    fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => is_transient_status(*status),
            Self::MalformedResponse(_) | Self::Defect(_) => false,
        }
    }

    fn is_defect(&self) -> bool {
        matches!(self, Self::Defect(_))
    }

    fn summary(&self) -> String {
        match self {
            Self::Unavailable(_) => "generation service unavailable".to_string(),
            Self::Timeout(after) => format!("generation timed out after {:?}", after),
            Self::Status { status, .. } => format!("generation service returned HTTP {}", status),
            Self::MalformedResponse(_) => "malformed generation response".to_string(),
            Self::Defect(_) => "generation backend defect".to_string(),
        }
    }
}

/// Field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Offending field (dotted path for nested fields)
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Orchestrator errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request body failed schema validation
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    /// Request rejected before validation (bad JSON syntax, wrong content type)
    #[error("Bad request: {message}")]
    Rejected { status: StatusCode, message: String },

    /// Retrieval stage failure
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Generation stage failure
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Uncaught defect inside a pipeline component
    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error from field failures
    pub fn validation(fields: Vec<FieldError>) -> Self {
        let message = fields
            .iter()
            .map(|f| format!("{}: {}", f.field, f.message))
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation { message, fields }
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            Error::Rejected { status, .. } => (*status, "bad_request"),
            Error::Retrieval(RetrievalError::Timeout(_))
            | Error::Generation(GenerationError::Timeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, "timeout")
            }
            Error::Retrieval(e) if e.is_defect() => {
                (StatusCode::INTERNAL_SERVER_ERROR, "unexpected_error")
            }
            Error::Generation(e) if e.is_defect() => {
                (StatusCode::INTERNAL_SERVER_ERROR, "unexpected_error")
            }
            Error::Retrieval(_) => (StatusCode::BAD_GATEWAY, "retrieval_error"),
            Error::Generation(_) => (StatusCode::BAD_GATEWAY, "generation_error"),
            Error::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, "unexpected_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self);
        }

        let message = match &self {
            Error::Validation { message, .. } | Error::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        };

        let body = match &self {
            Error::Validation { fields, .. } => json!({
                "error": {
                    "type": error_type,
                    "message": message,
                    "fields": fields,
                }
            }),
            _ => json!({
                "error": {
                    "type": error_type,
                    "message": message,
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}
