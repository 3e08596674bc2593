//! Query and request types

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

use super::document::ContextItem;

/// Default number of sources for `/v1/query`
pub const DEFAULT_QUERY_LIMIT: usize = 3;

/// Default number of documents for `/v1/retrieve`
pub const DEFAULT_RETRIEVE_LIMIT: usize = 5;

/// Schema validation applied to request bodies after deserialization
pub trait Validate {
    /// Return every field-level violation, or `Ok(())`
    fn validate(&self) -> std::result::Result<(), Vec<FieldError>>;
}

/// A natural-language query for the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    /// The question text
    pub text: String,
    /// Maximum number of documents to retrieve (>= 1)
    pub limit: usize,
}

impl Query {
    /// Create a new query with the default limit
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: DEFAULT_QUERY_LIMIT,
        }
    }

    /// Set the number of documents to retrieve
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

fn validate_query_text(query: &str, errors: &mut Vec<FieldError>) {
    if query.trim().is_empty() {
        errors.push(FieldError::new("query", "must not be empty"));
    }
}

fn validate_limit(limit: usize, errors: &mut Vec<FieldError>) {
    if limit < 1 {
        errors.push(FieldError::new("limit", "must be at least 1"));
    }
}

fn into_result(errors: Vec<FieldError>) -> std::result::Result<(), Vec<FieldError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `POST /v1/query` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub query: String,

    /// Number of sources to retrieve (default: 3)
    #[serde(default = "default_query_limit")]
    pub limit: usize,
}

fn default_query_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

impl Validate for QueryRequest {
    fn validate(&self) -> std::result::Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        validate_query_text(&self.query, &mut errors);
        validate_limit(self.limit, &mut errors);
        into_result(errors)
    }
}

impl From<QueryRequest> for Query {
    fn from(request: QueryRequest) -> Self {
        Query::new(request.query).with_limit(request.limit)
    }
}

/// `POST /v1/retrieve` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    /// Text to retrieve documents for
    pub query: String,

    /// Maximum number of documents (default: 5)
    #[serde(default = "default_retrieve_limit")]
    pub limit: usize,
}

fn default_retrieve_limit() -> usize {
    DEFAULT_RETRIEVE_LIMIT
}

impl Validate for RetrieveRequest {
    fn validate(&self) -> std::result::Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        validate_query_text(&self.query, &mut errors);
        validate_limit(self.limit, &mut errors);
        into_result(errors)
    }
}

/// `POST /v1/generate` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The question to answer
    pub query: String,
    /// Documents to ground the answer in
    pub context: Vec<ContextItem>,
}

impl Validate for GenerateRequest {
    fn validate(&self) -> std::result::Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        validate_query_text(&self.query, &mut errors);
        for (i, item) in self.context.iter().enumerate() {
            if item.doc_id.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("context.{}.doc_id", i),
                    "must not be empty",
                ));
            }
        }
        into_result(errors)
    }
}
