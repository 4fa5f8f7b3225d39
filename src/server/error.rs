//! Error-to-HTTP response conversion.
//!
//! Wraps the crate-level [`Error`] so route handlers can return
//! `Result<T, AppError>` directly. Responses never expose backend URLs or
//! transport detail; those stay in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::Error;

/// Wrapper implementing `IntoResponse` for the crate error type.
pub struct AppError(Error);

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

/// Client-safe message for an error. Server-side failures get a fixed text;
/// the underlying detail is logged, not returned.
pub(crate) fn public_message(err: &Error) -> String {
    match err {
        Error::NotFound { .. } => err.to_string(),
        Error::Cancelled => "request timed out before the recording was located".into(),
        Error::Upstream(_) => "failed to query DVR servers".into(),
        Error::BadGateway(_) => "failed to fetch video from DVR server".into(),
        Error::Validation(_) => err.to_string(),
        Error::Internal(_) => "internal error".into(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Server error in API handler");
        }

        let code = match &self.0 {
            Error::NotFound { .. } => "not_found",
            Error::Cancelled => "cancelled",
            Error::Upstream(_) => "upstream_error",
            Error::BadGateway(_) => "bad_gateway",
            Error::Validation(_) => "validation_error",
            Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": public_message(&self.0),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
