//! Hock server: serve the stubs of a fixture file until interrupted.
//!
//! Usage:
//!   hock-server --config fixture.yaml [--port 7000] [--host 127.0.0.1]
//!
//! On shutdown, expectations that were not satisfied are logged and the
//! process exits non-zero.

use anyhow::Context;
use clap::Parser;
use hock::{Hock, HockConfig};
use std::net::SocketAddr;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Hock server - HTTP test double driven by a fixture file
#[derive(Parser, Debug)]
#[command(name = "hock-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Fixture file (YAML or JSON)
    #[arg(short, long, env = "HOCK_CONFIG")]
    config: Option<String>,

    /// Port to listen on (overrides the fixture)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides the fixture)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => HockConfig::from_file(path)
            .with_context(|| format!("Failed to load fixture {path}"))?,
        None => HockConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let hock = Hock::with_config(&config)?;
    let server = hock.listen(addr).await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");
    server.close();

    let outcome = hock.done().await;
    if let Err(e) = &outcome {
        warn!("{}", e);
    }
    outcome?;
    Ok(())
}
