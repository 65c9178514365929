//! Analysis job state.

use serde::{Deserialize, Serialize};

/// State of an uploaded video on the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisState {
    /// Upload received, the service is still ingesting the video
    #[default]
    Processing,
    /// Video is ready for content generation
    Succeeded,
    /// The service gave up on the video
    Failed,
}

impl AnalysisState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisState::Processing => "PROCESSING",
            AnalysisState::Succeeded => "SUCCEEDED",
            AnalysisState::Failed => "FAILED",
        }
    }

    /// Check if this is a terminal state (no more polling needed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisState::Succeeded | AnalysisState::Failed)
    }
}

impl std::fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
