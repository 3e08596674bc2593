//! Document and citation types

use serde::{Deserialize, Serialize};

/// Maximum number of characters kept in a source snippet
pub const SNIPPET_MAX_CHARS: usize = 100;

/// Marker appended to a snippet that was truncated
pub const SNIPPET_ELLIPSIS: char = '…';

/// A retrieved document
///
/// On the wire this is `{doc_id, content, score}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID (non-empty)
    #[serde(rename = "doc_id")]
    pub id: String,
    /// Full document content
    pub content: String,
    /// Relevance score (0.0-1.0, higher is better)
    #[serde(rename = "score")]
    pub relevance_score: f64,
}

impl Document {
    /// Create a new document
    pub fn new(id: impl Into<String>, content: impl Into<String>, relevance_score: f64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            relevance_score,
        }
    }

    /// Check the id and score are usable, describing the first problem found
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("document has an empty doc_id".to_string());
        }
        if !self.relevance_score.is_finite() || !(0.0..=1.0).contains(&self.relevance_score) {
            return Err(format!(
                "document '{}' has score {} outside [0, 1]",
                self.id, self.relevance_score
            ));
        }
        Ok(())
    }
}

/// Context item handed to the generation stage (`{doc_id, content}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextItem {
    pub doc_id: String,
    pub content: String,
}

impl From<&Document> for ContextItem {
    fn from(doc: &Document) -> Self {
        Self {
            doc_id: doc.id.clone(),
            content: doc.content.clone(),
        }
    }
}

/// Citation derived from a retrieved document for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Document ID
    pub doc_id: String,
    /// Content preview, at most [`SNIPPET_MAX_CHARS`] characters plus an ellipsis
    pub snippet: String,
    /// Relevance score copied from the document
    pub score: f64,
}

impl Source {
    /// Create a citation from a document
    pub fn from_document(doc: &Document) -> Self {
        Self {
            doc_id: doc.id.clone(),
            snippet: truncate_snippet(&doc.content, SNIPPET_MAX_CHARS),
            score: doc.relevance_score,
        }
    }
}

/// Truncate content to `max_chars` characters, appending an ellipsis if anything was cut
///
/// Counts characters, not bytes, so multi-byte content is never split mid-character.
pub fn truncate_snippet(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        None => content.to_string(),
        Some((cut, _)) => {
            let mut snippet = String::with_capacity(cut + SNIPPET_ELLIPSIS.len_utf8());
            snippet.push_str(&content[..cut]);
            snippet.push(SNIPPET_ELLIPSIS);
            snippet
        }
    }
}
