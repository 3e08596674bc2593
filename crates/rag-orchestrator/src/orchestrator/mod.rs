//! Query orchestration: retrieve, generate, compose
//!
//! [`QueryOrchestrator::process_query`] runs the two-stage pipeline and always
//! produces a [`QueryResult`] for downstream failures:
//!
//! - retrieval fails: generation is skipped, sources are empty, `meta.error` is set
//! - generation fails: sources come from retrieval, the answer is an apology,
//!   `meta.error` is set
//!
//! Which of the three happened is carried by [`QueryOutcome`]. Only backend
//! defects (errors that are not about the network or the remote service)
//! propagate as [`Error::Unexpected`].
//!
//! Degraded answers are still served as successes, so every degraded path is
//! logged at `warn` and counted in [`OrchestratorStats`].

pub mod cache;
pub mod policy;
pub mod stats;

use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, GenerationError, Result, RetrievalError, StageError};
use crate::providers::{GenerationProvider, Providers, RetrievalProvider};
use crate::types::{ContextItem, Document, FailedStage, Query, QueryMetadata, QueryResult};

pub use cache::{AnswerCache, CacheStats};
pub use policy::CallPolicy;
pub use stats::{OrchestratorStats, StatsSnapshot};

/// Result of one pipeline run
#[derive(Debug)]
pub enum QueryOutcome {
    /// Both stages succeeded (or the answer came from the cache)
    Answered(QueryResult),
    /// Retrieval failed; generation was skipped
    RetrievalFailed {
        result: QueryResult,
        error: RetrievalError,
    },
    /// Retrieval succeeded but generation failed
    GenerationFailed {
        result: QueryResult,
        error: GenerationError,
    },
}

impl QueryOutcome {
    /// The result to return to the caller
    pub fn result(&self) -> &QueryResult {
        match self {
            Self::Answered(result)
            | Self::RetrievalFailed { result, .. }
            | Self::GenerationFailed { result, .. } => result,
        }
    }

    /// Consume the outcome, keeping the result
    pub fn into_result(self) -> QueryResult {
        match self {
            Self::Answered(result)
            | Self::RetrievalFailed { result, .. }
            | Self::GenerationFailed { result, .. } => result,
        }
    }

    /// Stage that was replaced by a fallback, if any
    pub fn failed_stage(&self) -> Option<FailedStage> {
        match self {
            Self::Answered(_) => None,
            Self::RetrievalFailed { .. } => Some(FailedStage::Retrieval),
            Self::GenerationFailed { .. } => Some(FailedStage::Generation),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failed_stage().is_some()
    }
}

fn retrieval_fallback_answer(query: &Query) -> String {
    format!(
        "Service temporarily unavailable: no documents could be retrieved for '{}'. \
         Please try again later.",
        query.text
    )
}

fn generation_fallback_answer(query: &Query) -> String {
    format!(
        "Sorry, an answer could not be generated for '{}' right now. \
         The retrieved sources are listed below.",
        query.text
    )
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Composes retrieval and generation into one pipeline
pub struct QueryOrchestrator {
    retrieval: Arc<dyn RetrievalProvider>,
    generation: Arc<dyn GenerationProvider>,
    retrieval_policy: CallPolicy,
    generation_policy: CallPolicy,
    cache: Option<AnswerCache>,
    stats: OrchestratorStats,
}

impl QueryOrchestrator {
    /// Create an orchestrator with default call policies and no cache
    pub fn new(
        retrieval: Arc<dyn RetrievalProvider>,
        generation: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            retrieval,
            generation,
            retrieval_policy: CallPolicy::default(),
            generation_policy: CallPolicy::default(),
            cache: None,
            stats: OrchestratorStats::default(),
        }
    }

    /// Create an orchestrator from configuration and already-built providers
    pub fn from_config(config: &RagConfig, providers: Providers) -> Self {
        let orchestrator = Self::new(providers.retrieval, providers.generation).with_policies(
            CallPolicy::for_endpoint(&config.retrieval, &config.retry),
            CallPolicy::for_endpoint(&config.generation, &config.retry),
        );

        if config.cache.enabled {
            tracing::info!(
                "Answer cache enabled ({} entries, {}s TTL)",
                config.cache.max_entries,
                config.cache.ttl_secs
            );
            orchestrator.with_cache(AnswerCache::from_config(&config.cache))
        } else {
            orchestrator
        }
    }

    /// Set the call policies for the two stages
    pub fn with_policies(mut self, retrieval: CallPolicy, generation: CallPolicy) -> Self {
        self.retrieval_policy = retrieval;
        self.generation_policy = generation;
        self
    }

    /// Enable answer caching
    pub fn with_cache(mut self, cache: AnswerCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Pipeline counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Cache statistics, if caching is enabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(AnswerCache::stats)
    }

    /// Run the pipeline for `query`
    ///
    /// Downstream failures resolve to a degraded [`QueryOutcome`]; only backend
    /// defects return `Err`.
    pub async fn process_query(&self, query: &Query) -> Result<QueryOutcome> {
        let span = tracing::info_span!(
            "query",
            request_id = %Uuid::new_v4(),
            limit = query.limit
        );
        self.run(query).instrument(span).await
    }

    async fn run(&self, query: &Query) -> Result<QueryOutcome> {
        let start = Instant::now();
        self.stats.record_query();
        tracing::info!("Query: \"{}\"", query.text);

        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(query)) {
            self.stats.record_cache_hit();
            let metadata = QueryMetadata {
                cache_hit: true,
                ..QueryMetadata::success(elapsed_ms(start))
            };
            return Ok(QueryOutcome::Answered(QueryResult {
                answer: hit.answer,
                sources: hit.sources,
                metadata,
            }));
        }

        let documents = match self.retrieve(query).await {
            Ok(documents) => documents,
            Err(error) if error.is_defect() => {
                return Err(Error::unexpected(error.to_string()));
            }
            Err(error) => {
                self.stats.record_retrieval_failure();
                tracing::warn!(
                    "Retrieval failed, returning fallback answer: {} ({}ms)",
                    error,
                    elapsed_ms(start)
                );
                let metadata = QueryMetadata::degraded(
                    FailedStage::Retrieval,
                    error.summary(),
                    elapsed_ms(start),
                );
                let result = QueryResult::new(retrieval_fallback_answer(query), &[], metadata);
                return Ok(QueryOutcome::RetrievalFailed { result, error });
            }
        };

        tracing::debug!("Retrieved {} documents", documents.len());

        let answer = match self.generate(query, &documents).await {
            Ok(answer) => answer,
            Err(error) if error.is_defect() => {
                return Err(Error::unexpected(error.to_string()));
            }
            Err(error) => {
                self.stats.record_generation_failure();
                tracing::warn!(
                    "Generation failed, returning sources with fallback answer: {} ({}ms)",
                    error,
                    elapsed_ms(start)
                );
                let metadata = QueryMetadata::degraded(
                    FailedStage::Generation,
                    error.summary(),
                    elapsed_ms(start),
                );
                let result =
                    QueryResult::new(generation_fallback_answer(query), &documents, metadata);
                return Ok(QueryOutcome::GenerationFailed { result, error });
            }
        };

        let metadata = QueryMetadata::success(elapsed_ms(start));
        let result = QueryResult::new(answer, &documents, metadata);

        if let Some(cache) = &self.cache {
            cache.put(query, result.answer.clone(), result.sources.clone());
        }

        tracing::info!(
            "Query completed in {}ms, {} sources",
            result.metadata.latency_ms,
            result.sources.len()
        );

        Ok(QueryOutcome::Answered(result))
    }

    /// Retrieval stage, with the provider contract enforced
    async fn retrieve(&self, query: &Query) -> std::result::Result<Vec<Document>, RetrievalError> {
        let provider = &self.retrieval;
        let text = query.text.as_str();
        let limit = query.limit;

        let documents = self
            .retrieval_policy
            .call("retrieval", move || provider.retrieve(text, limit))
            .await?;

        if documents.len() > limit {
            return Err(RetrievalError::Defect(format!(
                "{} provider returned {} documents for limit {}",
                provider.name(),
                documents.len(),
                limit
            )));
        }
        for doc in &documents {
            doc.check().map_err(RetrievalError::Defect)?;
        }

        Ok(documents)
    }

    /// Generation stage; an empty answer counts as a malformed response
    async fn generate(
        &self,
        query: &Query,
        documents: &[Document],
    ) -> std::result::Result<String, GenerationError> {
        let provider = &self.generation;
        let text = query.text.as_str();
        let context: Vec<ContextItem> = documents.iter().map(ContextItem::from).collect();
        let context = context.as_slice();

        let generated = self
            .generation_policy
            .call("generation", move || provider.generate(text, context))
            .await?;

        if generated.answer_text.trim().is_empty() {
            return Err(GenerationError::MalformedResponse(
                "generation service returned an empty answer".to_string(),
            ));
        }

        Ok(generated.answer_text)
    }
}
