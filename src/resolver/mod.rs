//! Concurrent multi-server recording resolution.
//!
//! [`Resolver::resolve`] fans one probe out per configured backend server,
//! races the results, and returns the first positive match. Which server wins
//! when several hold the recording is inherently non-deterministic; callers
//! and tests must not assume a specific winner.

mod probe;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use probe::ProbeOutcome;

use crate::config::ConfigStore;
use crate::error::{Error, Result};

/// Fixed suffix joined to a recording identifier to form the probe filename.
const RECORDING_SUFFIX: &str = ".mp4";

struct ProbeReport {
    server: usize,
    outcome: ProbeOutcome,
}

/// Locates recordings across the configured candidate servers.
pub struct Resolver {
    store: Arc<ConfigStore>,
}

impl Resolver {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Resolve a recording identifier to the URL of a backend that holds it.
    ///
    /// The candidate server list and query policy are read fresh from the
    /// config store on every call. All servers are probed concurrently and
    /// the first positive result wins; the remaining probes are cancelled.
    ///
    /// Errors: [`Error::NotFound`] when no server holds the recording,
    /// [`Error::Cancelled`] when the caller's token fires first, and
    /// [`Error::Upstream`] when at least one server failed at the transport
    /// level and none gave a definitive verdict.
    pub async fn resolve(&self, record_id: &str, cancel: &CancellationToken) -> Result<String> {
        let servers = self.store.servers();
        let policy = self.store.policy();

        let filename = format!("{record_id}{RECORDING_SUFFIX}");
        tracing::debug!(
            record_id,
            servers = servers.len(),
            timeout = ?policy.timeout,
            max_retries = policy.max_retries,
            "Resolving recording"
        );

        if servers.is_empty() {
            tracing::warn!(record_id, "No DVR servers configured");
            return Err(Error::not_found("recording", record_id));
        }

        let client = probe::build_client(&policy)?;

        // Losing probes are cancelled as soon as a winner is chosen: the
        // guard fires the scope token when this function returns or the
        // caller drops the future.
        let scope = cancel.child_token();
        let _guard = scope.clone().drop_guard();

        // Sized to the fan-out so every probe can report without blocking,
        // even after the receiver is gone.
        let (tx, mut rx) = mpsc::channel::<ProbeReport>(servers.len());

        for (server, base) in servers.iter().enumerate() {
            let url = probe::probe_url(base, &filename);
            let client = client.clone();
            let policy = policy.clone();
            let token = scope.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let outcome = probe::probe_server(&client, &url, &policy, &token).await;
                let _ = tx.send(ProbeReport { server, outcome }).await;
            });
        }
        drop(tx);

        let total = servers.len();
        let mut last_transient: Option<Error> = None;

        for _ in 0..total {
            let report = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::warn!(record_id, "Resolution cancelled");
                    return Err(Error::Cancelled);
                }
                report = rx.recv() => match report {
                    Some(report) => report,
                    None => break,
                },
            };

            match report.outcome {
                ProbeOutcome::Found(url) => {
                    tracing::info!(
                        record_id,
                        server = report.server + 1,
                        total,
                        "Recording found"
                    );
                    return Ok(url);
                }
                ProbeOutcome::NotFound => {
                    tracing::debug!(record_id, server = report.server + 1, total, "Not on server");
                }
                ProbeOutcome::Transient(err) => {
                    tracing::warn!(
                        record_id,
                        server = report.server + 1,
                        total,
                        error = %err,
                        "Server probe gave no verdict"
                    );
                    last_transient = Some(err);
                }
                ProbeOutcome::Cancelled => {}
            }
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tracing::warn!(record_id, "Recording not found on any server");
        match last_transient {
            // A transport failure is more informative than a generic miss:
            // the recording may exist on a server we could not reach.
            Some(err) => Err(err),
            None => Err(Error::not_found("recording", record_id)),
        }
    }
}
