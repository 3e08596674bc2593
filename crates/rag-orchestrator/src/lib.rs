//! rag-orchestrator: front controller for a Retrieval-Augmented-Generation pipeline
//!
//! A query is fanned out to a retrieval backend, the retrieved documents are handed
//! to a generation backend, and the two outputs are composed into a single answer
//! with source citations. Downstream failures degrade into well-formed answers
//! instead of server errors.
//!
//! Backends are selected at construction time: `mock` backends return fixed data
//! for offline use, `http` backends talk to the retrieval and generation services
//! over the network.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, GenerationError, Result, RetrievalError};
pub use orchestrator::{QueryOrchestrator, QueryOutcome};
pub use types::{
    document::{ContextItem, Document, Source},
    query::Query,
    response::{GenerationResult, QueryMetadata, QueryResult},
};
