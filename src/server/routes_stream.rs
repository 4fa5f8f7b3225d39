//! Stream proxy route.
//!
//! `GET /stream/{identifier}.mp4` relays the recording from its resolved
//! backend. The handler only recovers the identifier and the Range header;
//! the relay does the rest.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Response};

use super::error::AppError;
use super::AppContext;
use crate::error::Error;
use crate::relay;

/// GET /stream/{filename}
pub async fn stream_recording(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Response<Body>, AppError> {
    let record_id = filename.strip_suffix(".mp4").unwrap_or(&filename);
    if record_id.is_empty() {
        return Err(Error::Validation("missing recording identifier".into()).into());
    }

    // Forwarded verbatim; absence means "fetch the whole resource".
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    tracing::info!(record_id, range = range.unwrap_or("-"), "Stream request");

    relay::proxy_stream(&ctx.cache, &ctx.store, record_id, range)
        .await
        .map_err(Into::into)
}
