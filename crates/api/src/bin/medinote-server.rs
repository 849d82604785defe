//! medinote-server binary entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use medinote_api::ApiServer;
use medinote_common::{tracing::init_tracing, SystemConfig};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "medinote-server")]
#[command(version)]
#[command(about = "Medinote health chatbot HTTP server")]
struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, env = "MEDINOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to, overrides the configuration
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to, overrides the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref().unwrap_or("info"))?;

    let mut config = SystemConfig::load_or_default(cli.config.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {:#}", e);
        e
    })?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    info!("Starting medinote-server on {}", config.server.bind_address());
    ApiServer::new(&config).await?.run().await
}
