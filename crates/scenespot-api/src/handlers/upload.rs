//! Video upload handler.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the video.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    /// Identifier to pass back as `filename` when asking questions
    pub filename: String,
}

/// Index an uploaded video.
///
/// POST /api/upload (multipart, field `file`)
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("Upload has no file name"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        upload = Some((name, bytes));
        break;
    }

    let (name, bytes) =
        upload.ok_or_else(|| ApiError::bad_request(format!("Missing '{}' field", FILE_FIELD)))?;

    info!(file_name = %name, size = bytes.len(), "Upload received");

    let outcome = state.indexer.index(&name, &bytes).await?;

    Ok(Json(UploadResponse {
        status: "success",
        filename: outcome.identifier.as_str().to_string(),
    }))
}
