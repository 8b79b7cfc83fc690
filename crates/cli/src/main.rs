//! Herald entry point.
//!
//! This binary is the composition root. It
//!
//! 1. loads and validates [`config::AppConfig`],
//! 2. installs the `tracing` subscriber (JSON or text, plus an OTLP exporter
//!    when `telemetry.otlp_endpoint` is set),
//! 3. builds the GitHub and Discord clients, the two command handlers and the
//!    event controller,
//! 4. serves the webhook routes until Ctrl+C or SIGTERM.
//!
//! Configuration errors abort before the server binds.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

mod app;
mod config;
mod telemetry;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "herald", version, about = "Posts GitHub issue and pull request notifications to Discord")]
struct Args {
    /// Configuration file, layered over `herald.toml`.
    #[arg(long, env = "HERALD_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Validate configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("Configuration rejected")?;
    if args.check {
        println!("Configuration OK");
        return Ok(());
    }

    let telemetry = telemetry::init(&config.logging, &config.telemetry)?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Herald");

    let address = config.server.socket_addr()?;
    let router = app::build_router(&config)?;
    let result = listener::serve(address, router, listener::shutdown_signal()).await;

    telemetry.shutdown();
    result.context("HTTP server failed")
}
