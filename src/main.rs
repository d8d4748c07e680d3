//! mimicbot command line
//!
//! Account maintenance and offline analysis. The game server itself is the
//! `backend` binary.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mimicbot::core::{init_tracing, BotConfig};
use mimicbot::engine::{analyze_transcript, HttpOracle};
use mimicbot::game::Variant;
use mimicbot::networking::{ClientSettings, LichessClient, Platform};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "mimicbot")]
#[command(about = "Bot account tools and game rating analysis")]
struct Args {
    /// Path to config.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upgrade the configured account to a bot account (irreversible)
    Upgrade,

    /// Estimate both players' ratings over a finished game
    Analyze {
        /// Space-separated UCI moves
        #[arg(short, long)]
        moves: String,

        /// Variant key
        #[arg(long, default_value = "standard")]
        variant: String,

        /// Starting FEN for chess960 or from-position games
        #[arg(long)]
        fen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();
    let config = BotConfig::load(args.config.as_deref()).context("loading configuration")?;

    match args.command {
        Command::Upgrade => {
            let mut settings = ClientSettings::new(&config.url, &config.token);
            settings.max_retries = config.engine.max_retries;
            let client = LichessClient::new(settings)?;

            let account = client.account().await?;
            if account.title.as_deref() == Some("BOT") {
                bail!("{} is already a bot account", account.username);
            }
            client.upgrade_to_bot().await?;
            info!("Upgraded {} to a bot account", account.username);
        }
        Command::Analyze { moves, variant, fen } => {
            let variant = Variant::from_key(&variant)?;
            let moves: Vec<String> = moves.split_whitespace().map(str::to_string).collect();
            let oracle = HttpOracle::connect(&config.engine.oracle_url, config.engine.oracle_timeout)
                .await
                .context("connecting to the oracle")?;

            let series = analyze_transcript(&oracle, variant, fen.as_deref(), &moves).await?;
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
    }
    Ok(())
}
