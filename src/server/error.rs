//! HTTP error responses.
//!
//! Every error is rendered as `{"detail": "..."}`. Model failures are logged
//! in full but reported to the client only as a generic server error.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::error::LlmError;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("File must be an image")]
    NotAnImage,

    #[error("Missing required file field '{0}'")]
    MissingFile(&'static str),

    #[error("{message}")]
    Multipart { status: StatusCode, message: String },

    #[error("Vision model call failed: {0}")]
    Upstream(#[from] LlmError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotAnImage => StatusCode::BAD_REQUEST,
            ApiError::MissingFile(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Multipart { status, .. } => *status,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Upstream(err) => {
                tracing::error!(error = %err, "Vision model call failed");
                "Internal Server Error".to_string()
            }
            other => {
                tracing::debug!(status = status.as_u16(), error = %other, "Rejecting request");
                other.to_string()
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NotAnImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::MissingFile("file").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(LlmError::RateLimited("quota".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::NotAnImage.to_string(), "File must be an image");
        assert_eq!(
            ApiError::MissingFile("file").to_string(),
            "Missing required file field 'file'"
        );
    }

    #[test]
    fn test_upstream_response_hides_details() {
        let response = ApiError::from(LlmError::ApiError {
            code: 403,
            message: "API key not valid".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
