//! API error types.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scenespot_ml_client::MlError;
use scenespot_storage::StorageError;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("AI analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("AI analysis timed out after {0:?}")]
    AnalysisTimeout(Duration),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Storage(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AnalysisTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::MalformedResponse(_) | ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::AnalysisFailed(_)
            | ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            ApiError::Internal(_) | ApiError::Storage(_) | ApiError::Io(_) | ApiError::Upstream(_)
        )
    }
}

impl From<MlError> for ApiError {
    fn from(err: MlError) -> Self {
        match err {
            MlError::AnalysisFailed(msg) => ApiError::AnalysisFailed(msg),
            MlError::Timeout(after) => ApiError::AnalysisTimeout(after),
            MlError::MalformedResponse(msg) => ApiError::MalformedResponse(msg),
            MlError::Io(e) => ApiError::Io(e),
            MlError::Config(msg) => ApiError::Internal(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

/// Message sent in place of internal error details in production.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Marker on error responses whose message exposes internal details.
#[derive(Debug, Clone, Copy)]
pub struct InternalErrorDetails;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// JSON error body with the given status.
pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error = match &self {
            // Upload clients key off this exact string
            ApiError::AnalysisFailed(_) => "AI Failed".to_string(),
            ApiError::AnalysisTimeout(_) => "AI timed out".to_string(),
            _ => self.to_string(),
        };

        let mut response = error_response(status, error);
        if self.is_internal() {
            response.extensions_mut().insert(InternalErrorDetails);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ml_error_mapping() {
        assert!(matches!(
            ApiError::from(MlError::analysis_failed("x")),
            ApiError::AnalysisFailed(_)
        ));
        assert!(matches!(
            ApiError::from(MlError::Timeout(Duration::from_millis(250))),
            ApiError::AnalysisTimeout(d) if d == Duration::from_millis(250)
        ));
        assert!(matches!(
            ApiError::from(MlError::malformed("x")),
            ApiError::MalformedResponse(_)
        ));
        assert!(matches!(
            ApiError::from(MlError::request_failed("x")),
            ApiError::Upstream(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::AnalysisFailed("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::AnalysisTimeout(Duration::from_secs(1)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::Storage(StorageError::not_found("a")).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_only_internal_errors_are_marked() {
        let internal = ApiError::Upstream("groq said no".into()).into_response();
        assert!(internal.extensions().get::<InternalErrorDetails>().is_some());

        let failed = ApiError::AnalysisFailed("x".into()).into_response();
        assert!(failed.extensions().get::<InternalErrorDetails>().is_none());
    }

    #[test]
    fn test_sub_second_timeout_is_reported() {
        let err = ApiError::AnalysisTimeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "AI analysis timed out after 250ms");
    }
}
