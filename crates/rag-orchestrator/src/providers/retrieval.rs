//! Retrieval provider trait

use async_trait::async_trait;

use crate::error::RetrievalError;
use crate::types::Document;

/// Trait for fetching documents relevant to a query
///
/// Implementations:
/// - `MockRetriever`: fixed pool of three documents, no I/O
/// - `HttpRetriever`: retrieval service over `POST /v1/retrieve`
///
/// Contract: at most `limit` documents, ordered by descending relevance score,
/// and never fewer than the backend has available up to `limit`.
#[async_trait]
pub trait RetrievalProvider: Send + Sync {
    /// Retrieve up to `limit` documents for `query`
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<Document>, RetrievalError>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
