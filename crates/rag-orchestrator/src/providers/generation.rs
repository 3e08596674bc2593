//! Generation provider trait

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::types::{ContextItem, GenerationResult};

/// Trait for generating an answer grounded in retrieved context
///
/// Implementations:
/// - `MockGenerator`: deterministic templated answer, no I/O
/// - `HttpGenerator`: generation service over `POST /v1/generate`
///
/// Must accept any context length, including an empty one.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate an answer to `query` from `context`
    async fn generate(
        &self,
        query: &str,
        context: &[ContextItem],
    ) -> Result<GenerationResult, GenerationError>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
