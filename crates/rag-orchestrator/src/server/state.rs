//! Application state for the orchestrator server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::orchestrator::QueryOrchestrator;
use crate::providers::{
    GenerationProvider, MockGenerator, MockRetriever, Providers, RetrievalProvider,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Query pipeline behind `/v1/query`
    orchestrator: QueryOrchestrator,
    /// Retrieval service behind `/v1/retrieve`
    retrieval_service: Arc<dyn RetrievalProvider>,
    /// Generation service behind `/v1/generate`
    generation_service: Arc<dyn GenerationProvider>,
}

impl AppState {
    /// Create new application state
    ///
    /// The `/v1/retrieve` and `/v1/generate` endpoints are always served by the
    /// mock providers; the orchestrator uses whatever backend is configured.
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state (backend: {:?})...", config.backend);

        let providers = Providers::from_config(&config)?;
        let orchestrator = QueryOrchestrator::from_config(&config, providers);

        Ok(Self::from_parts(
            config,
            orchestrator,
            Arc::new(MockRetriever::new()),
            Arc::new(MockGenerator::new()),
        ))
    }

    /// Assemble state from already-built components
    pub fn from_parts(
        config: RagConfig,
        orchestrator: QueryOrchestrator,
        retrieval_service: Arc<dyn RetrievalProvider>,
        generation_service: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                orchestrator,
                retrieval_service,
                generation_service,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the query orchestrator
    pub fn orchestrator(&self) -> &QueryOrchestrator {
        &self.inner.orchestrator
    }

    /// Get the retrieval service
    pub fn retrieval_service(&self) -> &Arc<dyn RetrievalProvider> {
        &self.inner.retrieval_service
    }

    /// Get the generation service
    pub fn generation_service(&self) -> &Arc<dyn GenerationProvider> {
        &self.inner.generation_service
    }
}
