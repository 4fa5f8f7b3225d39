//! JSON API routes: recording lookup (single and batch), health, and the
//! public config summary.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::error::public_message;
use super::AppContext;

// ---------------------------------------------------------------------------
// Request/Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct PlayRequest {
    #[serde(default)]
    pub record_id: Option<String>,

    /// When non-empty the request is a batch lookup.
    #[serde(default)]
    pub record_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlayQuery {
    pub record_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub success: bool,

    /// Opaque proxy path the client should stream from; the backend's real
    /// address is never exposed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchPlayResponse {
    pub success: bool,
    pub results: Vec<RecordingResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordingResult {
    pub record_id: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

fn proxy_path(record_id: &str) -> String {
    format!("/stream/{record_id}.mp4")
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/play
pub async fn play_post(State(ctx): State<AppContext>, Json(req): Json<PlayRequest>) -> Response {
    if !req.record_ids.is_empty() {
        let cancel = CancellationToken::new();
        let (status, body) = handle_batch(&ctx, req.record_ids, &cancel).await;
        return (status, Json(body)).into_response();
    }

    let (status, body) = handle_single(&ctx, req.record_id.as_deref()).await;
    (status, Json(body)).into_response()
}

/// GET /api/play?record_id=...
pub async fn play_get(
    State(ctx): State<AppContext>,
    Query(query): Query<PlayQuery>,
) -> (StatusCode, Json<PlayResponse>) {
    let (status, body) = handle_single(&ctx, query.record_id.as_deref()).await;
    (status, Json(body))
}

/// GET /health
pub async fn health_check(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "dvr_servers": ctx.store.servers().len(),
    }))
}

/// Public configuration summary. Only non-sensitive values: no server URLs.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub server_port: u16,
    pub dvr_count: usize,
    pub retry_enabled: bool,
    pub retry_count: u32,
    pub version: &'static str,
}

/// GET /api/config
pub async fn config_summary(State(ctx): State<AppContext>) -> Json<ConfigResponse> {
    let dvr = ctx.store.dvr();
    Json(ConfigResponse {
        server_port: ctx.config.server.port,
        dvr_count: ctx.store.servers().len(),
        retry_enabled: dvr.max_retries > 1,
        retry_count: dvr.max_retries,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /api/config/reload
pub async fn reload_config(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    let reloaded = ctx.store.reload();
    Json(json!({
        "reloaded": reloaded,
        "dvr_servers": ctx.store.servers().len(),
    }))
}

// ---------------------------------------------------------------------------
// Lookup logic
// ---------------------------------------------------------------------------

async fn handle_single(ctx: &AppContext, record_id: Option<&str>) -> (StatusCode, PlayResponse) {
    let record_id = record_id.unwrap_or("").trim();
    if record_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            PlayResponse {
                success: false,
                proxy_url: None,
                message: Some("record_id is required".into()),
            },
        );
    }

    tracing::info!(record_id, "Lookup request");

    let cancel = CancellationToken::new();
    match ctx.resolver.resolve(record_id, &cancel).await {
        Ok(url) => {
            ctx.cache.put(record_id, url);
            (
                StatusCode::OK,
                PlayResponse {
                    success: true,
                    proxy_url: Some(proxy_path(record_id)),
                    message: None,
                },
            )
        }
        Err(err) => {
            let status = StatusCode::from_u16(err.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                PlayResponse {
                    success: false,
                    proxy_url: None,
                    message: Some(public_message(&err)),
                },
            )
        }
    }
}

/// Batch lookups resolve sequentially so one request cannot multiply the
/// probe fan-out; the cancellation token is checked between items.
pub(crate) async fn handle_batch(
    ctx: &AppContext,
    record_ids: Vec<String>,
    cancel: &CancellationToken,
) -> (StatusCode, BatchPlayResponse) {
    tracing::info!(count = record_ids.len(), "Batch lookup request");

    let mut results = Vec::with_capacity(record_ids.len());
    let mut found = 0usize;

    for (i, record_id) in record_ids.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!(processed = i, total = record_ids.len(), "Batch lookup cancelled");
            return (
                StatusCode::REQUEST_TIMEOUT,
                BatchPlayResponse {
                    success: false,
                    results,
                    message: Some("request timeout".into()),
                },
            );
        }

        match ctx.resolver.resolve(record_id, cancel).await {
            Ok(url) => {
                ctx.cache.put(record_id.as_str(), url);
                found += 1;
                results.push(RecordingResult {
                    record_id: record_id.clone(),
                    found: true,
                    proxy_url: Some(proxy_path(record_id)),
                });
            }
            Err(crate::error::Error::Cancelled) => {
                return (
                    StatusCode::REQUEST_TIMEOUT,
                    BatchPlayResponse {
                        success: false,
                        results,
                        message: Some("request timeout".into()),
                    },
                );
            }
            Err(_) => {
                results.push(RecordingResult {
                    record_id: record_id.clone(),
                    found: false,
                    proxy_url: None,
                });
            }
        }
    }

    tracing::info!(total = record_ids.len(), found, "Batch lookup completed");
    (
        StatusCode::OK,
        BatchPlayResponse {
            success: true,
            results,
            message: Some("batch query completed".into()),
        },
    )
}
