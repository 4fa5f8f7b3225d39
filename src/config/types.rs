//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML and carries the
//! server, DVR query, and CORS sections plus the backend server list. Every
//! section defaults sensibly so a completely empty file is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,

    pub dvr: DvrConfig,

    /// Base URLs of the candidate DVR backend servers. All are queried
    /// concurrently on every resolution; order carries no precedence.
    pub dvr_servers: Vec<String>,

    pub cors: CorsConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

/// DVR query policy: how backend servers are probed and how long resolved
/// URLs stay cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DvrConfig {
    /// Per-attempt HTTP timeout in seconds. Applies independently to each
    /// attempt of each probe, not pro-rata across retries.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per server (the first attempt counts).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for linear retry backoff; attempt n waits n times this.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Accept untrusted/self-signed certificates when probing and relaying.
    /// Accepted trade-off for private DVR networks.
    pub skip_tls_verify: bool,

    /// Seconds a resolved URL stays in the cache before it expires.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    500
}
fn default_cache_ttl_secs() -> u64 {
    6 * 60 * 60
}

impl Default for DvrConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            skip_tls_verify: false,
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl DvrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// CORS settings for the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,

    /// Allowed origins: `*` or a comma-separated list.
    pub allow_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_origins: "*".into(),
        }
    }
}
