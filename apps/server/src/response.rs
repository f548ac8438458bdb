//! Mapping of pre-stream failures to JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vidprompt_core::{Error, cors::add_cors};

/// Error returned by handlers before any streaming has started.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation { .. } | Error::MissingTranscript { .. } => StatusCode::BAD_REQUEST,
            Error::VideoNotFound { .. } => StatusCode::NOT_FOUND,
            Error::Upstream { .. } | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::MissingApiKey { .. } | Error::Io(_) | Error::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            Error::VideoNotFound { .. } => "Video not found".to_string(),
            Error::Upstream { .. } | Error::Http(_) => "Completion API request failed".to_string(),
            Error::MissingApiKey { .. } | Error::Io(_) | Error::Json(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %self.0, "request rejected");
        }

        add_cors((status, Json(json!({ "error": self.message() }))).into_response())
    }
}
