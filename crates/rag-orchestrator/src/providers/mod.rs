//! Provider abstractions for the retrieval and generation stages
//!
//! The orchestrator only sees the [`RetrievalProvider`] and [`GenerationProvider`]
//! traits. Implementations are picked once, at construction time, from
//! [`BackendMode`]: `mock` for fixed offline data, `http` for the real services.

pub mod generation;
pub mod http;
pub mod mock;
pub mod retrieval;

use std::sync::Arc;

use crate::config::{BackendMode, RagConfig};
use crate::error::Result;

pub use generation::GenerationProvider;
pub use http::{HttpGenerator, HttpRetriever};
pub use mock::{MockGenerator, MockRetriever};
pub use retrieval::RetrievalProvider;

/// Retrieval and generation providers selected for a configuration
pub struct Providers {
    pub retrieval: Arc<dyn RetrievalProvider>,
    pub generation: Arc<dyn GenerationProvider>,
}

impl Providers {
    /// Build the providers for the configured backend
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let providers = match config.backend {
            BackendMode::Mock => Self {
                retrieval: Arc::new(MockRetriever::new()),
                generation: Arc::new(MockGenerator::new()),
            },
            BackendMode::Http => {
                let retrieval_url = config.base_url_for(&config.retrieval);
                let generation_url = config.base_url_for(&config.generation);
                tracing::info!(
                    "HTTP backends (retrieval: {}, generation: {})",
                    retrieval_url,
                    generation_url
                );
                Self {
                    retrieval: Arc::new(HttpRetriever::new(
                        &retrieval_url,
                        config.retrieval.timeout(),
                    )?),
                    generation: Arc::new(HttpGenerator::new(
                        &generation_url,
                        config.generation.timeout(),
                    )?),
                }
            }
        };

        tracing::info!(
            "Providers initialized (retrieval: {}, generation: {})",
            providers.retrieval.name(),
            providers.generation.name()
        );

        Ok(providers)
    }
}
