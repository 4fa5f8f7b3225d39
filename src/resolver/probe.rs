//! Single-server existence probe.
//!
//! One probe asks one candidate server whether it holds a given recording,
//! with bounded retries. The check is a HEAD request so no body is ever
//! transferred; redirects are not followed because a redirect already proves
//! the recording exists and the relay handles the real fetch later.

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::config::QueryPolicy;
use crate::error::{Error, Result};

/// Outcome of probing one server for one recording.
#[derive(Debug)]
pub(crate) enum ProbeOutcome {
    /// The server holds the recording; carries the probed URL.
    Found(String),
    /// The server definitively does not hold the recording (404).
    NotFound,
    /// No verdict after exhausting retries; carries the last error.
    Transient(Error),
    /// The resolution was cancelled before a verdict.
    Cancelled,
}

/// Build the probe client for one resolution call.
///
/// The policy is read fresh per call, so the client must be too: timeout and
/// TLS settings bake into the client at construction.
pub(crate) fn build_client(policy: &QueryPolicy) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(policy.timeout)
        .redirect(reqwest::redirect::Policy::none())
        .danger_accept_invalid_certs(policy.skip_tls_verify)
        .build()
        .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))
}

/// Join a server base URL and a recording filename.
///
/// The base is normalized to end with exactly one path separator.
pub(crate) fn probe_url(base: &str, filename: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), filename)
}

/// Probe one server, retrying transient failures up to the policy's attempt
/// budget with linear backoff (attempt n waits n times the base delay).
///
/// A 404 returns immediately without consuming a retry; retrying a
/// confirmed-absent resource is wasted work. Cancellation is observed before
/// every attempt and during backoff sleeps and in-flight requests.
pub(crate) async fn probe_server(
    client: &reqwest::Client,
    url: &str,
    policy: &QueryPolicy,
    cancel: &CancellationToken,
) -> ProbeOutcome {
    let mut last_err: Option<Error> = None;

    for attempt in 0..policy.max_retries {
        if cancel.is_cancelled() {
            return ProbeOutcome::Cancelled;
        }

        if attempt > 0 {
            tracing::debug!(url, attempt, "Retrying probe");
            let delay = policy.backoff_base * attempt;
            tokio::select! {
                _ = cancel.cancelled() => return ProbeOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return ProbeOutcome::Cancelled,
            r = client.head(url).send() => r,
        };

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url, attempt, error = %e, "Probe request failed");
                last_err = Some(Error::upstream(format!("probe request failed: {e}")));
                continue;
            }
        };

        let status = response.status();
        tracing::debug!(url, attempt, status = %status, "Probe response");

        // A redirect is a positive signal; the relay performs the real fetch
        // against the probed URL and follows it there.
        if status.is_success() || status.is_redirection() {
            return ProbeOutcome::Found(url.to_string());
        }

        if status == StatusCode::NOT_FOUND {
            return ProbeOutcome::NotFound;
        }

        last_err = Some(Error::upstream(format!("unexpected status {status}")));
    }

    ProbeOutcome::Transient(
        last_err.unwrap_or_else(|| Error::upstream("probe retries exhausted")),
    )
}
