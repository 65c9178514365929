//! Query answer model.

use serde::{Deserialize, Serialize};

/// Message returned when a query targets a video that was never indexed.
pub const INDEX_NOT_FOUND_ANSWER: &str = "Index not found. Please re-upload.";

/// Answer to a natural-language query against one video index.
///
/// Fields the reasoning model adds beyond the documented shape are kept in
/// `extra` so the answer can be returned to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    /// Whether a matching scene was found
    pub found: bool,

    /// Scene start (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,

    /// Scene end (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,

    /// Human readable answer
    pub answer: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl QueryAnswer {
    /// Answer for a query whose index does not exist.
    pub fn index_not_found() -> Self {
        Self {
            found: false,
            start: None,
            end: None,
            answer: INDEX_NOT_FOUND_ANSWER.to_string(),
            extra: serde_json::Map::new(),
        }
    }
}
