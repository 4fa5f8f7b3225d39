use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dvrgate")]
#[command(author, version, about = "DVR recording locator and streaming proxy")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Resolve a recording identifier against the configured DVR servers
    Resolve {
        /// Recording identifier
        #[arg(required = true)]
        record_id: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default search when omitted)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
