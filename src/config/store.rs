//! Runtime-mutable configuration store.
//!
//! The resolver and relay never hold a config snapshot across calls; they ask
//! the [`ConfigStore`] for the current server list and [`QueryPolicy`] at the
//! start of every operation, so edits and reloads apply to the next request
//! without restarting anything in flight.

use std::path::PathBuf;
use std::time::Duration;

use parking_lot::RwLock;

use super::types::{Config, DvrConfig};

/// Per-resolution query parameters, snapshotted from [`DvrConfig`].
#[derive(Debug, Clone)]
pub struct QueryPolicy {
    /// Per-attempt HTTP timeout.
    pub timeout: Duration,
    /// Total attempts per server (the first attempt counts).
    pub max_retries: u32,
    /// Base delay for linear backoff; attempt n waits n times this.
    pub backoff_base: Duration,
    /// Accept untrusted/self-signed backend certificates.
    pub skip_tls_verify: bool,
}

impl From<&DvrConfig> for QueryPolicy {
    fn from(dvr: &DvrConfig) -> Self {
        Self {
            timeout: dvr.timeout(),
            max_retries: dvr.max_retries.max(1),
            backoff_base: dvr.backoff_base(),
            skip_tls_verify: dvr.skip_tls_verify,
        }
    }
}

/// Mutable runtime configuration shared across requests.
///
/// Fields sit behind [`RwLock`] so readers never block each other and writes
/// are short-lived.
#[derive(Debug)]
pub struct ConfigStore {
    servers: RwLock<Vec<String>>,
    dvr: RwLock<DvrConfig>,
    /// Path the store was loaded from (None = no reload support).
    config_path: Option<PathBuf>,
}

impl ConfigStore {
    /// Build a new store from the given config and optional file path.
    pub fn new(config: &Config, config_path: Option<PathBuf>) -> Self {
        Self {
            servers: RwLock::new(config.dvr_servers.clone()),
            dvr: RwLock::new(config.dvr.clone()),
            config_path,
        }
    }

    /// Snapshot of the current candidate server list.
    pub fn servers(&self) -> Vec<String> {
        self.servers.read().clone()
    }

    /// Replace the candidate server list.
    pub fn set_servers(&self, servers: Vec<String>) {
        *self.servers.write() = servers;
    }

    /// Snapshot of the current query policy.
    pub fn policy(&self) -> QueryPolicy {
        QueryPolicy::from(&*self.dvr.read())
    }

    /// Snapshot of the current DVR section.
    pub fn dvr(&self) -> DvrConfig {
        self.dvr.read().clone()
    }

    /// Replace the DVR section.
    pub fn set_dvr(&self, dvr: DvrConfig) {
        *self.dvr.write() = dvr;
    }

    /// Re-read the config file on disk into the store.
    ///
    /// Best effort: parse failures are logged and leave the current values
    /// untouched. Returns true when a reload happened.
    pub fn reload(&self) -> bool {
        let Some(ref path) = self.config_path else {
            return false;
        };

        match Config::load(path) {
            Ok(config) => {
                self.set_servers(config.dvr_servers);
                self.set_dvr(config.dvr);
                tracing::info!("Config reloaded from {}", path.display());
                true
            }
            Err(e) => {
                tracing::warn!("Failed to reload config from {}: {e}", path.display());
                false
            }
        }
    }
}
