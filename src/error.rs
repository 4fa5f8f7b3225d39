//! Unified error type for the dvrgate application.
//!
//! All modules funnel their failures into [`Error`], which carries enough
//! context for API handlers to derive an HTTP status code via
//! [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in dvrgate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "recording").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The caller's deadline or cancellation fired before the operation
    /// completed.
    #[error("operation cancelled before completion")]
    Cancelled,

    /// Every backend query ended in a transport-level failure with no
    /// definitive verdict.
    #[error("upstream query failed: {0}")]
    Upstream(String),

    /// The resolved backend was unreachable at stream time.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// Request data failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Cancelled => 408,
            Error::Upstream(_) => 502,
            Error::BadGateway(_) => 502,
            Error::Validation(_) => 400,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Upstream`].
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::Upstream(message.into())
    }

    /// Convenience constructor for [`Error::BadGateway`].
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Error::BadGateway(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("recording", "REC1");
        assert_eq!(err.to_string(), "recording not found: REC1");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn cancelled_maps_to_request_timeout() {
        let err = Error::Cancelled;
        assert_eq!(err.http_status(), 408);
    }

    #[test]
    fn upstream_display() {
        let err = Error::upstream("connect error");
        assert_eq!(err.to_string(), "upstream query failed: connect error");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn bad_gateway_maps_to_502() {
        let err = Error::bad_gateway("connection refused");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn validation_display() {
        let err = Error::Validation("record_id is required".into());
        assert_eq!(err.to_string(), "validation error: record_id is required");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn internal_maps_to_500() {
        let err = Error::Internal("unexpected state".into());
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn result_alias() {
        fn ok_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(ok_fn().unwrap(), 42);
    }
}
