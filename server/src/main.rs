//! MotionGen server: text-to-motion video generation over HTTP.
//!
//! Thin transport over the engine facade: submissions return immediately
//! with a request identifier and callers poll `/status/{id}` until the
//! artifact is ready at `/download/{id}`.

use anyhow::{Context, Result};
use clap::Parser;
use motiongen_engine::{Engine, EngineConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments for the MotionGen server.
#[derive(Parser, Debug)]
#[command(name = "motiongen-server")]
#[command(about = "MotionGen server - drives motion generation back-ends over HTTP")]
#[command(version)]
struct CliArgs {
    /// HTTP port for the API server
    #[arg(long, short = 'p', default_value = "8000", env = "MOTIONGEN_PORT")]
    port: u16,

    /// Engine configuration file (TOML)
    #[arg(long, short = 'c', env = "MOTIONGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter applied when RUST_LOG is unset
    #[arg(long, default_value = "info", env = "MOTIONGEN_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    common::logging::init(&args.log_level);

    let config = match &args.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default_paths(),
    };
    let engine = Engine::new(config).context("initializing engine")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("MotionGen server listening on {}", addr);

    axum::serve(listener, motiongen_server::router(engine)).await?;
    Ok(())
}
