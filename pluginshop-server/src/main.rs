//! Plugin Shop license server
//!
//! Issues license keys, validates them and tracks device activations over
//! a small JSON API. State lives in memory and is lost on restart.
//!
//! Usage:
//!   pluginshop-server --port 4100

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pluginshop_license::SystemClock;
use pluginshop_server::{AppState, ServerConfig, config::DEFAULT_PORT, serve};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "pluginshop-server")]
#[command(about = "Plugin Shop license issuance and activation API")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// HTTP port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Enable verbose debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Plugin Shop license server starting...");
    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };
    let state = AppState::new(Arc::new(SystemClock));

    serve(&config, state).await
}
