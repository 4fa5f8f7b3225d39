//! HTTP server: shared application context, router, and lifecycle.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::{self, ResolutionCache};
use crate::config::{Config, ConfigStore, CorsConfig};
use crate::resolver::Resolver;

pub mod error;
pub mod routes_api;
pub mod routes_stream;

/// Seconds between expired-entry sweeps of the resolution cache.
const CACHE_SWEEP_INTERVAL_SECS: u64 = 60;

/// Application context shared by all request handlers (via Axum state).
///
/// Cheaply cloneable: only `Arc`s inside.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable startup configuration.
    pub config: Arc<Config>,
    /// Runtime-mutable server list and query policy.
    pub store: Arc<ConfigStore>,
    /// Identifier -> resolved URL cache.
    pub cache: Arc<ResolutionCache>,
    /// Recording resolver.
    pub resolver: Arc<Resolver>,
}

impl AppContext {
    /// Build a context from a loaded config and the path it came from.
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        let store = Arc::new(ConfigStore::new(&config, config_path));
        let cache = Arc::new(ResolutionCache::new(config.dvr.cache_ttl()));
        let resolver = Arc::new(Resolver::new(store.clone()));
        Self {
            config: Arc::new(config),
            store,
            cache,
            resolver,
        }
    }
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let mut app = Router::new()
        .route("/health", get(routes_api::health_check))
        .route(
            "/api/play",
            get(routes_api::play_get).post(routes_api::play_post),
        )
        .route("/api/config", get(routes_api::config_summary))
        .route("/api/config/reload", post(routes_api::reload_config))
        .route("/stream/{filename}", get(routes_stream::stream_recording));

    if ctx.config.cors.enabled {
        app = app.layer(cors_layer(&ctx.config.cors));
    }

    app.layer(TraceLayer::new_for_http()).with_state(ctx)
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if cors.allow_origins.trim() == "*" {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = cors
            .allow_origins
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Start the HTTP server and run until a shutdown signal.
pub async fn start_server(config: Config, config_path: Option<PathBuf>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::new(config, config_path);

    let sweeper = cache::start_cleanup_task(ctx.cache.clone(), CACHE_SWEEP_INTERVAL_SECS);

    for (i, server) in ctx.store.servers().iter().enumerate() {
        tracing::info!("DVR server [{}]: {}", i + 1, server);
    }

    let app = build_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
