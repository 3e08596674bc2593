//! Core types for the orchestrator

pub mod document;
pub mod query;
pub mod response;

pub use document::{ContextItem, Document, Source};
pub use query::{GenerateRequest, Query, QueryRequest, RetrieveRequest, Validate};
pub use response::{
    FailedStage, GenerationResult, HealthResponse, QueryMetadata, QueryResult, RetrieveResponse,
};
