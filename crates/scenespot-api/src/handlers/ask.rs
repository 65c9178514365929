//! Scene query handler.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use scenespot_models::QueryAnswer;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub query: String,
    /// Identifier returned by the upload endpoint
    pub filename: String,
}

/// Find the scene that best matches a query.
///
/// POST /api/ask (form fields `query`, `filename`; urlencoded or multipart)
pub async fn ask_question(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<Json<QueryAnswer>> {
    let form = read_ask_form(request, &state).await?;
    let answer = state.answerer.answer(&form.filename, &form.query).await?;
    Ok(Json(answer))
}

async fn read_ask_form(request: Request, state: &AppState) -> ApiResult<AskForm> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if !is_multipart {
        let Form(form) = Form::<AskForm>::from_request(request, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        return Ok(form);
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut query = None;
    let mut filename = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        let slot = match name.as_deref() {
            Some("query") => &mut query,
            Some("filename") => &mut filename,
            _ => continue,
        };
        let text = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read form field: {}", e)))?;
        *slot = Some(text);
    }

    Ok(AskForm {
        query: query.ok_or_else(|| ApiError::bad_request("Missing 'query' field"))?,
        filename: filename.ok_or_else(|| ApiError::bad_request("Missing 'filename' field"))?,
    })
}
