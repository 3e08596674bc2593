//! Mock providers returning fixed data
//!
//! These back the `/v1/retrieve` and `/v1/generate` endpoints and stand in for
//! the network in `mock` backend mode.

use async_trait::async_trait;

use crate::error::{GenerationError, RetrievalError};
use crate::types::{ContextItem, Document, GenerationResult};

use super::generation::GenerationProvider;
use super::retrieval::RetrievalProvider;

/// Number of documents in the mock pool
pub const MOCK_POOL_SIZE: usize = 3;

/// Retriever with a fixed pool of documents, scored 0.95, 0.87, 0.82
#[derive(Debug, Clone, Default)]
pub struct MockRetriever;

impl MockRetriever {
    pub fn new() -> Self {
        Self
    }

    /// The full mock pool for a query, in descending score order
    pub fn pool(query: &str) -> Vec<Document> {
        vec![
            Document::new(
                "mock_doc_001",
                format!("This is a mock document about the query: {}", query),
                0.95,
            ),
            Document::new(
                "mock_doc_002",
                format!("Another mock document related to: {}", query),
                0.87,
            ),
            Document::new(
                "mock_doc_003",
                format!("Third mock document for: {}", query),
                0.82,
            ),
        ]
    }
}

#[async_trait]
impl RetrievalProvider for MockRetriever {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<Document>, RetrievalError> {
        let mut documents = Self::pool(query);
        documents.truncate(limit);
        Ok(documents)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Generator producing a deterministic templated answer
#[derive(Debug, Clone, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GenerationProvider for MockGenerator {
    async fn generate(
        &self,
        query: &str,
        context: &[ContextItem],
    ) -> Result<GenerationResult, GenerationError> {
        if context.is_empty() {
            return Ok(GenerationResult::new(format!(
                "Insufficient context to answer query: '{}'.",
                query
            )));
        }

        Ok(GenerationResult::new(format!(
            "Generated response for query: '{}' with {} context items",
            query,
            context.len()
        )))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use proptest::prelude::*;

    #[test]
    fn test_pool_is_ranked() {
        let pool = MockRetriever::pool("refund policy");
        assert_eq!(pool.len(), MOCK_POOL_SIZE);
        assert!(pool
            .windows(2)
            .all(|w| w[0].relevance_score >= w[1].relevance_score));
        assert!(pool.iter().all(|d| d.check().is_ok()));
        assert!(pool[0].content.contains("refund policy"));
    }

    #[test]
    fn test_generate_mentions_query_and_count() {
        let context = vec![ContextItem {
            doc_id: "123".to_string(),
            content: "test context".to_string(),
        }];
        let result = block_on(MockGenerator::new().generate("test question", &context)).unwrap();
        assert_eq!(
            result.answer_text,
            "Generated response for query: 'test question' with 1 context items"
        );
    }

    #[test]
    fn test_generate_empty_context() {
        let result = block_on(MockGenerator::new().generate("anything", &[])).unwrap();
        assert_eq!(result.answer_text, "Insufficient context to answer query: 'anything'.");
    }

    proptest! {
        #[test]
        fn prop_retrieve_respects_limit(limit in 1usize..64, query in "[a-z ]{0,20}") {
            let documents = block_on(MockRetriever::new().retrieve(&query, limit)).unwrap();
            prop_assert!(documents.len() <= limit);
            prop_assert_eq!(documents.len(), limit.min(MOCK_POOL_SIZE));
        }
    }
}
