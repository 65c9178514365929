//! Gemini client for video understanding.
//!
//! Videos go through the Gemini File API (resumable upload, then polling the
//! file resource until it is `ACTIVE`) and are then referenced by URI in a
//! `generateContent` request.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scenespot_models::AnalysisState;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MlError, MlResult};
use crate::service::{AnalysisService, RemoteVideo};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: String,
    /// API base URL (overridable for tests and proxies)
    pub base_url: String,
    /// Model used for generation
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> MlResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| MlError::config("GEMINI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("GEMINI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        })
    }
}

/// Gemini API client.
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

/// File resource as returned by the File API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFile {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: GeminiFile,
}

#[derive(Debug, Serialize)]
struct UploadStartRequest<'a> {
    file: UploadStartFile<'a>,
}

#[derive(Debug, Serialize)]
struct UploadStartFile<'a> {
    display_name: &'a str,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    File {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GeminiConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Model used for generation.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn start_upload(&self, display_name: &str, mime_type: &str, size: usize) -> MlResult<String> {
        let url = format!("{}/upload/v1beta/files", self.base());

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&UploadStartRequest {
                file: UploadStartFile { display_name },
            })
            .send()
            .await?;

        let response = check_status(response, "Gemini upload start").await?;

        response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| MlError::malformed("Gemini upload start returned no upload URL"))
    }
}

#[async_trait]
impl AnalysisService for GeminiClient {
    async fn upload_video(&self, path: &Path, display_name: &str) -> MlResult<RemoteVideo> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = video_mime_type(display_name);
        let size = bytes.len();

        info!(path = %path.display(), size, mime_type, "Uploading video to Gemini");

        let upload_url = self.start_upload(display_name, mime_type, size).await?;

        let response = self
            .http
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;

        let response = check_status(response, "Gemini upload").await?;
        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| MlError::malformed(format!("Failed to parse Gemini upload response: {}", e)))?;

        debug!(name = %uploaded.file.name, "Gemini upload finished");
        Ok(uploaded.file.into())
    }

    async fn get_video(&self, name: &str) -> MlResult<RemoteVideo> {
        let url = format!("{}/v1beta/{}", self.base(), name);

        let response = self
            .http
            .get(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?;

        let response = check_status(response, "Gemini file lookup").await?;
        let file: GeminiFile = response
            .json()
            .await
            .map_err(|e| MlError::malformed(format!("Failed to parse Gemini file: {}", e)))?;

        Ok(file.into())
    }

    async fn generate(&self, video: &RemoteVideo, prompt: &str) -> MlResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base(),
            self.config.model
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            mime_type: video.mime_type.clone(),
                            file_uri: video.uri.clone(),
                        },
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        info!(model = %self.config.model, video = %video.name, "Requesting scene index from Gemini");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let response = check_status(response, "Gemini generateContent").await?;
        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| MlError::malformed(format!("Failed to parse Gemini response: {}", e)))?;

        let text: String = generated
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(MlError::malformed("No content in Gemini response"));
        }

        Ok(strip_code_fence(&text).to_string())
    }
}

impl From<GeminiFile> for RemoteVideo {
    fn from(file: GeminiFile) -> Self {
        Self {
            state: map_file_state(file.state.as_deref()),
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
        }
    }
}

/// Map a File API state onto [`AnalysisState`].
fn map_file_state(state: Option<&str>) -> AnalysisState {
    match state {
        Some("ACTIVE") => AnalysisState::Succeeded,
        Some("FAILED") => AnalysisState::Failed,
        _ => AnalysisState::Processing,
    }
}

/// Guess the video MIME type from the file name.
fn video_mime_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp" => "video/3gpp",
        _ => "video/mp4",
    }
}

/// Drop a surrounding markdown code fence, if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

async fn check_status(response: reqwest::Response, what: &str) -> MlResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(MlError::request_failed(format!("{} returned {}: {}", what, status, body)))
}
