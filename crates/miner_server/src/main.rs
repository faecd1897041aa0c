use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use miner_server::{build_router, config::load_settings, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = load_settings(config_path.as_deref())?;

    let app = build_router(AppState::new(settings.stats_interval));

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "miner API listening");
    info!("stats relay at ws://{addr}/ws");
    axum::serve(listener, app).await?;
    Ok(())
}
