//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] from a config
//! with test-friendly probe timing. The [`with_server`] constructor starts
//! Axum on a random port for HTTP-level testing; backend DVR servers are
//! stood up with wiremock in the individual tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use dvrgate::config::Config;
use dvrgate::server::{build_router, AppContext};

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
}

/// A config with probe timing suited to tests: short timeout, short backoff.
pub fn test_config(servers: Vec<String>) -> Config {
    let mut config = Config::default();
    config.dvr_servers = servers;
    config.dvr.timeout_secs = 2;
    config.dvr.backoff_ms = 10;
    config
}

impl TestHarness {
    /// Create a new harness for the given backend server list.
    pub fn new(servers: Vec<String>) -> Self {
        Self::with_config(test_config(servers), None)
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            ctx: AppContext::new(config, config_path),
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(servers: Vec<String>) -> (Self, SocketAddr) {
        Self::with_server_config(test_config(servers), None).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(
        config: Config,
        config_path: Option<PathBuf>,
    ) -> (Self, SocketAddr) {
        let harness = Self::with_config(config, config_path);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}
