//! Service seams for the external AI collaborators.
//!
//! The indexer and answerer only talk to these traits, so tests can swap in
//! stubs and count calls.

use std::path::Path;

use async_trait::async_trait;
use scenespot_models::AnalysisState;

use crate::error::MlResult;

/// A video held by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVideo {
    /// Service-side resource name, used for polling
    pub name: String,
    /// URI to reference the video in generation requests
    pub uri: String,
    /// MIME type the service recorded
    pub mime_type: String,
    /// Processing state
    pub state: AnalysisState,
}

/// Multimodal video analysis service.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Upload a local video file.
    async fn upload_video(&self, path: &Path, display_name: &str) -> MlResult<RemoteVideo>;

    /// Fetch the current state of an uploaded video.
    async fn get_video(&self, name: &str) -> MlResult<RemoteVideo>;

    /// Ask the model about a ready video. Returns the response text, which is
    /// requested as JSON but not validated here.
    async fn generate(&self, video: &RemoteVideo, prompt: &str) -> MlResult<String>;
}

/// Text reasoning service constrained to JSON output.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Run one system + user exchange and return the response text.
    async fn complete_json(&self, system: &str, user: &str) -> MlResult<String>;
}
