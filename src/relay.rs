//! Streaming reverse proxy to the resolved backend.
//!
//! Looks the recording up in the resolution cache, fetches it from the
//! backend with the client's Range header forwarded verbatim, and streams
//! the response body through without ever buffering the whole file. Browser
//! video players depend on byte-exact Range semantics to seek, so the
//! backend's status code and content headers pass through untouched.

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Response, StatusCode};
use futures::TryStreamExt;

use crate::cache::ResolutionCache;
use crate::config::ConfigStore;
use crate::error::{Error, Result};

/// Headers that describe the connection between two hops rather than the
/// payload. The serving stack owns framing; copying these through a
/// re-framed response would corrupt it.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name)
}

/// Fetch a cached recording from its backend and relay it to the client.
///
/// * Cache miss is reported as not-found without touching the network; the
///   caller cannot distinguish "never resolved" from "expired", and does not
///   need to.
/// * The TLS policy is read fresh from the config store at proxy time.
/// * The relay client sets a connect timeout but no overall request timeout;
///   a video stream outlives any fixed deadline.
/// * Unlike the probe, the relay follows redirects, performing the real
///   fetch wherever the backend points it.
pub async fn proxy_stream(
    cache: &ResolutionCache,
    store: &ConfigStore,
    record_id: &str,
    range: Option<&str>,
) -> Result<Response<Body>> {
    let Some(url) = cache.get(record_id) else {
        tracing::warn!(record_id, "Stream request for unresolved or expired recording");
        return Err(Error::not_found("recording", record_id));
    };

    let policy = store.policy();
    let client = reqwest::Client::builder()
        .connect_timeout(policy.timeout)
        .danger_accept_invalid_certs(policy.skip_tls_verify)
        .build()
        .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;

    let mut request = client.get(&url);
    if let Some(range) = range {
        request = request.header(reqwest::header::RANGE, range);
    }

    let backend = request.send().await.map_err(|e| {
        tracing::warn!(record_id, error = %e, "Backend fetch failed");
        Error::bad_gateway(format!("backend fetch failed: {e}"))
    })?;

    tracing::info!(
        record_id,
        status = %backend.status(),
        content_length = ?backend.content_length(),
        range = range.is_some(),
        "Relaying stream"
    );

    let status = StatusCode::from_u16(backend.status().as_u16())
        .map_err(|e| Error::Internal(format!("invalid backend status: {e}")))?;

    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in backend.headers() {
            if is_hop_by_hop(name.as_str()) {
                continue;
            }
            // The probe client and the server speak different `http` major
            // versions, so headers are carried over by raw bytes.
            let Ok(name) = HeaderName::from_bytes(name.as_str().as_bytes()) else {
                continue;
            };
            let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) else {
                continue;
            };
            headers.append(name, value);
        }
    }

    // An interrupted copy (client disconnect, backend drop) ends the stream;
    // a partially delivered range is a normal outcome of seeking, never
    // retried here.
    let record_id = record_id.to_string();
    let stream = backend.bytes_stream().inspect_err(move |e| {
        tracing::warn!(record_id = %record_id, error = %e, "Stream interrupted");
    });

    builder
        .body(Body::from_stream(stream))
        .map_err(|e| Error::Internal(format!("failed to build relay response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_headers_are_hop_by_hop() {
        assert!(is_hop_by_hop("connection"));
        assert!(is_hop_by_hop("transfer-encoding"));
    }

    #[test]
    fn content_headers_pass_through() {
        assert!(!is_hop_by_hop("content-range"));
        assert!(!is_hop_by_hop("content-length"));
        assert!(!is_hop_by_hop("accept-ranges"));
        assert!(!is_hop_by_hop("content-type"));
    }
}
