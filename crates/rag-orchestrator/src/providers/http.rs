//! HTTP providers for the retrieval and generation services

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, GenerationError, Result, RetrievalError};
use crate::types::document::truncate_snippet;
use crate::types::{ContextItem, Document, GenerationResult};

use super::generation::GenerationProvider;
use super::retrieval::RetrievalProvider;

/// Path of the retrieval endpoint on the retrieval service
pub const RETRIEVE_PATH: &str = "/v1/retrieve";

/// Path of the generation endpoint on the generation service
pub const GENERATE_PATH: &str = "/v1/generate";

/// Largest success body accepted from a downstream service (8MB)
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

/// Bytes read from a failed downstream response
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

/// Longest error body kept from a failed downstream response
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Serialize)]
struct RetrieveBody<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Deserialize)]
struct RetrieveReply {
    documents: Vec<Document>,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    query: &'a str,
    context: &'a [ContextItem],
}

/// Why a downstream JSON call failed, before it is mapped to a stage error
#[derive(Debug)]
enum CallFailure {
    Timeout(Duration),
    Transport(String),
    Status { status: u16, body: String },
    Decode(String),
}

/// Join a path onto a base URL
fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Read at most `limit` bytes of a body; the flag is set if more was available
async fn read_capped(
    response: &mut Response,
    limit: usize,
) -> std::result::Result<(Vec<u8>, bool), reqwest::Error> {
    let mut buf = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - buf.len();
        if chunk.len() > room {
            buf.extend_from_slice(&chunk[..room]);
            return Ok((buf, true));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok((buf, false))
}

/// JSON-over-HTTP POST client bound to one endpoint
struct JsonEndpoint {
    client: Client,
    url: String,
    timeout: Duration,
    max_response_bytes: usize,
}

impl JsonEndpoint {
    fn new(base_url: &str, path: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: join_url(base_url, path),
            timeout,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        })
    }

    async fn post<B, R>(&self, body: &B) -> std::result::Result<R, CallFailure>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut response = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let (bytes, _) = read_capped(&mut response, MAX_ERROR_BODY_BYTES)
                .await
                .unwrap_or_default();
            let body = String::from_utf8_lossy(&bytes);
            return Err(CallFailure::Status {
                status: status.as_u16(),
                body: truncate_snippet(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let too_large = || {
            CallFailure::Decode(format!(
                "response body exceeds {} bytes",
                self.max_response_bytes
            ))
        };
        if response
            .content_length()
            .is_some_and(|len| len > self.max_response_bytes as u64)
        {
            return Err(too_large());
        }

        let (bytes, truncated) = read_capped(&mut response, self.max_response_bytes)
            .await
            .map_err(|e| self.transport(e))?;
        if truncated {
            return Err(too_large());
        }

        serde_json::from_slice(&bytes).map_err(|e| CallFailure::Decode(e.to_string()))
    }

    fn transport(&self, err: reqwest::Error) -> CallFailure {
        if err.is_timeout() {
            CallFailure::Timeout(self.timeout)
        } else {
            CallFailure::Transport(err.to_string())
        }
    }
}

impl From<CallFailure> for RetrievalError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::Timeout(after) => Self::Timeout(after),
            CallFailure::Transport(msg) => Self::Unavailable(msg),
            CallFailure::Status { status, body } => Self::Status { status, body },
            CallFailure::Decode(msg) => Self::MalformedResponse(msg),
        }
    }
}

impl From<CallFailure> for GenerationError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::Timeout(after) => Self::Timeout(after),
            CallFailure::Transport(msg) => Self::Unavailable(msg),
            CallFailure::Status { status, body } => Self::Status { status, body },
            CallFailure::Decode(msg) => Self::MalformedResponse(msg),
        }
    }
}

/// Retrieval service client (`POST {base_url}/v1/retrieve`)
pub struct HttpRetriever {
    endpoint: JsonEndpoint,
}

impl HttpRetriever {
    /// Create a client for the retrieval service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: JsonEndpoint::new(base_url, RETRIEVE_PATH, timeout)?,
        })
    }

    /// Set the largest response body accepted from the service
    pub fn with_max_response_bytes(mut self, max_bytes: usize) -> Self {
        self.endpoint.max_response_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl RetrievalProvider for HttpRetriever {
    async fn retrieve(
        &self,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<Document>, RetrievalError> {
        let reply: RetrieveReply = self.endpoint.post(&RetrieveBody { query, limit }).await?;
        let mut documents = reply.documents;

        for doc in &documents {
            doc.check().map_err(RetrievalError::MalformedResponse)?;
        }

        // Stable: equal scores keep the service's order
        documents.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        if documents.len() > limit {
            tracing::warn!(
                "Retrieval service returned {} documents for limit {}, truncating",
                documents.len(),
                limit
            );
            documents.truncate(limit);
        }

        Ok(documents)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Generation service client (`POST {base_url}/v1/generate`)
pub struct HttpGenerator {
    endpoint: JsonEndpoint,
}

impl HttpGenerator {
    /// Create a client for the generation service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: JsonEndpoint::new(base_url, GENERATE_PATH, timeout)?,
        })
    }

    /// Set the largest response body accepted from the service
    pub fn with_max_response_bytes(mut self, max_bytes: usize) -> Self {
        self.endpoint.max_response_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl GenerationProvider for HttpGenerator {
    async fn generate(
        &self,
        query: &str,
        context: &[ContextItem],
    ) -> std::result::Result<GenerationResult, GenerationError> {
        let result: GenerationResult = self.endpoint.post(&GenerateBody { query, context }).await?;
        Ok(result)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://retrieval:9000/", RETRIEVE_PATH),
            "http://retrieval:9000/v1/retrieve"
        );
        assert_eq!(
            join_url("http://127.0.0.1:8000", GENERATE_PATH),
            "http://127.0.0.1:8000/v1/generate"
        );
    }
}
