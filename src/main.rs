mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use dvrgate::config::Config;
use dvrgate::server;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "dvrgate=trace,tower_http=debug".to_string()
        } else {
            "dvrgate=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config))
        }
        Commands::Resolve { record_id } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve_once(&record_id, cli.config))
        }
        Commands::Validate { config } => validate_config(config.or(cli.config)),
        Commands::Version => {
            println!("dvrgate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path.as_deref())?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    for warning in config.validate() {
        tracing::warn!("Config: {warning}");
    }

    tracing::info!(
        "Starting dvrgate on {}:{} with {} DVR servers",
        config.server.host,
        config.server.port,
        config.dvr_servers.len()
    );

    server::start_server(config, config_path).await
}

async fn resolve_once(record_id: &str, config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load_or_default(config_path.as_deref())?;
    let ctx = server::AppContext::new(config, config_path);

    let cancel = CancellationToken::new();
    match ctx.resolver.resolve(record_id, &cancel).await {
        Ok(url) => {
            println!("found:      {url}");
            println!("proxy path: /stream/{record_id}.mp4");
            Ok(())
        }
        Err(e) => anyhow::bail!("{e}"),
    }
}

fn validate_config(path: Option<PathBuf>) -> Result<()> {
    let config = match path {
        Some(ref p) => {
            println!("Validating config: {}", p.display());
            Config::load(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("✓ Configuration parsed");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  DVR servers: {}", config.dvr_servers.len());
    println!(
        "  Probe: timeout {}s, {} attempts, backoff base {}ms",
        config.dvr.timeout_secs, config.dvr.max_retries, config.dvr.backoff_ms
    );
    println!("  Cache TTL: {}s", config.dvr.cache_ttl_secs);

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("  No warnings");
    }
    for warning in warnings {
        println!("  ! {warning}");
    }

    Ok(())
}
