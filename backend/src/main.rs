use anyhow::{Context, Result};
use backend::{api, server};
use clap::Parser;
use mimicbot::core::{init_tracing, BotConfig};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "backend")]
#[command(about = "mimicbot game server")]
struct Args {
    /// Path to config.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides server.bind
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();

    let config = BotConfig::load(args.config.as_deref()).context("loading configuration")?;
    let state = server::connect(&config).await?;

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!("API listening on {}", bind);

    axum::serve(listener, api::router(state)).await?;
    Ok(())
}
