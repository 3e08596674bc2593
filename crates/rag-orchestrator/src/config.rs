//! Configuration for the orchestrator service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main orchestrator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Service identity reported by the health endpoint
    pub service: ServiceInfo,
    /// Server configuration
    pub server: ServerConfig,
    /// Backend selection (mock or http)
    pub backend: BackendMode,
    /// Retrieval service endpoint
    pub retrieval: ServiceEndpoint,
    /// Generation service endpoint
    pub generation: ServiceEndpoint,
    /// Retry policy for downstream calls
    pub retry: RetryConfig,
    /// Answer cache configuration
    pub cache: CacheConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply `RAG_*` overrides using the given variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("RAG_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("RAG_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("RAG_PORT is not a valid port: {}", port)))?;
        }
        if let Some(backend) = lookup("RAG_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(url) = lookup("RAG_RETRIEVAL_URL") {
            self.retrieval.base_url = Some(url);
        }
        if let Some(url) = lookup("RAG_GENERATION_URL") {
            self.generation.base_url = Some(url);
        }
        if let Some(secs) = lookup("RAG_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::Config(format!("RAG_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            self.retrieval.timeout_secs = secs;
            self.generation.timeout_secs = secs;
        }
        Ok(())
    }

    /// Base URL this server is reachable at from the same host
    pub fn self_base_url(&self) -> String {
        let host = match self.server.host.as_str() {
            "" | "0.0.0.0" => "127.0.0.1".to_string(),
            "::" => "[::1]".to_string(),
            host if host.contains(':') && !host.starts_with('[') => format!("[{}]", host),
            host => host.to_string(),
        };
        format!("http://{}:{}", host, self.server.port)
    }

    /// Base URL for a downstream service, falling back to this server itself
    pub fn base_url_for(&self, endpoint: &ServiceEndpoint) -> String {
        endpoint
            .base_url
            .clone()
            .unwrap_or_else(|| self.self_base_url())
    }

    /// Reject configurations the orchestrator cannot run with
    pub fn validate(&self) -> Result<()> {
        for (name, endpoint) in [("retrieval", &self.retrieval), ("generation", &self.generation)] {
            if endpoint.timeout_secs == 0 {
                return Err(Error::Config(format!("{}.timeout_secs must be positive", name)));
            }
            let blank_url = endpoint.base_url.as_deref().is_some_and(|url| url.trim().is_empty());
            if self.backend == BackendMode::Http && blank_url {
                return Err(Error::Config(format!("{}.base_url must not be empty", name)));
            }
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(Error::Config(
                "cache.max_entries must be positive when the cache is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Service identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,
    /// Service version
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "rag-orchestrator".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes (default: 1MB)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Backend selection for the orchestrator's retrieval and generation calls
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Fixed in-process data, no network calls
    Mock,
    /// Retrieval and generation services over HTTP
    #[default]
    Http,
}

impl std::str::FromStr for BackendMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "http" => Ok(Self::Http),
            other => Err(Error::Config(format!(
                "Unknown backend '{}' (expected 'mock' or 'http')",
                other
            ))),
        }
    }
}

/// A downstream service reachable over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEndpoint {
    /// Base URL, e.g. `http://retrieval.internal:8000`
    ///
    /// Unset means this server's own `/v1` endpoints, resolved from the final
    /// `server.host` and `server.port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl ServiceEndpoint {
    /// Endpoint at an explicit base URL
    pub fn at(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: Some(base_url.into()),
            timeout_secs,
        }
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServiceEndpoint {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
        }
    }
}

/// Retry policy for transient downstream failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Number of retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further retry
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 200,
        }
    }
}

/// Answer cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable answer caching
    pub enabled: bool,
    /// Maximum number of cached answers
    pub max_entries: usize,
    /// Time-to-live for cached answers in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries: 1000,
            ttl_secs: 300, // 5 minutes
        }
    }
}
