//! # packcalc-api — Binary Entry Point
//!
//! Parses flags, resolves configuration, and serves the calculator API
//! until SIGINT or SIGTERM.

use anyhow::{anyhow, Context};
use clap::Parser;

use packcalc_api::config::{Cli, ServerConfig};
use packcalc_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(&cli).context("failed to load configuration")?;

    packcalc_api::logging::init_tracing(config.log_format)
        .map_err(|e| anyhow!("failed to initialize tracing: {e}"))?;

    let state = AppState::from_config(config.clone()).context("failed to build application state")?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %addr,
        pack_sizes = %state.store.read(),
        rate_limit_rps = config.rate_limit_rps,
        rate_limit_burst = config.rate_limit_burst,
        max_items = config.max_items,
        metrics_enabled = config.metrics_enabled,
        "order pack calculator listening"
    );

    let app = packcalc_api::app(state);
    packcalc_api::server::serve(
        listener,
        app,
        packcalc_api::server::shutdown_signal(),
        config.shutdown_grace_period,
    )
    .await
    .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}
