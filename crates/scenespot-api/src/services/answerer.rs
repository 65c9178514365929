//! Query answerer.

use std::sync::Arc;

use scenespot_ml_client::ReasoningService;
use scenespot_models::{Identifier, QueryAnswer};
use scenespot_storage::{ArtifactStore, StorageError};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::prompts::{query_prompt, QUERY_SYSTEM_INSTRUCTION};

/// Answers natural-language queries against stored scene indexes.
pub struct QueryAnswerer {
    store: ArtifactStore,
    reasoning: Arc<dyn ReasoningService>,
}

impl QueryAnswerer {
    pub fn new(store: ArtifactStore, reasoning: Arc<dyn ReasoningService>) -> Self {
        Self { store, reasoning }
    }

    /// Find the scene in `filename`'s index that best matches `query`.
    ///
    /// A missing or unusable identifier yields the "index not found" answer
    /// without calling the reasoning service.
    pub async fn answer(&self, filename: &str, query: &str) -> ApiResult<QueryAnswer> {
        let identifier = match Identifier::from_filename(filename) {
            Ok(id) => id,
            Err(e) => {
                debug!(filename, error = %e, "Query names no valid index");
                metrics::record_query("index_missing");
                return Ok(QueryAnswer::index_not_found());
            }
        };

        let raw = match self.store.read(&identifier).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => {
                info!(identifier = %identifier, "No index for query");
                metrics::record_query("index_missing");
                return Ok(QueryAnswer::index_not_found());
            }
            Err(e) => {
                metrics::record_query("error");
                return Err(e.into());
            }
        };
        let video_log = String::from_utf8_lossy(&raw);

        let response = match self
            .reasoning
            .complete_json(QUERY_SYSTEM_INSTRUCTION, &query_prompt(&video_log, query))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                metrics::record_query("error");
                return Err(e.into());
            }
        };
        debug!(identifier = %identifier, response = %response, "Reasoning response");

        let answer: QueryAnswer = serde_json::from_str(&response).map_err(|e| {
            metrics::record_query("error");
            warn!(identifier = %identifier, error = %e, "Reasoning output is not a query answer");
            ApiError::MalformedResponse(e.to_string())
        })?;

        metrics::record_query("answered");
        info!(
            identifier = %identifier,
            found = answer.found,
            start = ?answer.start,
            end = ?answer.end,
            "Query answered"
        );

        Ok(answer)
    }
}
