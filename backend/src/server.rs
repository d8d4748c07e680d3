//! Process bootstrap: config to shared state

use crate::api::AppState;
use anyhow::{Context, Result};
use mimicbot::bot::{AdmissionController, SessionContext, SessionTiming};
use mimicbot::core::BotConfig;
use mimicbot::engine::{BoundedOracle, HttpOracle, MoveSelector, Oracle, SamplingConfig};
use mimicbot::networking::{ClientSettings, LichessClient, Platform};
use std::sync::Arc;
use tracing::info;

/// Wire a platform and an oracle into the state the router serves
pub fn app_state(config: &BotConfig, platform: Arc<dyn Platform>, oracle: Arc<dyn Oracle>, bot_id: String) -> AppState {
    let oracle: Arc<dyn Oracle> = Arc::new(BoundedOracle::new(oracle, config.engine.max_concurrent_calls));
    let selector = MoveSelector::new(oracle, SamplingConfig::from(&config.engine));

    AppState {
        ctx: Arc::new(SessionContext {
            platform,
            selector,
            bot_id,
            base_url: config.url.clone(),
            timing: SessionTiming::from_config(config),
        }),
        admission: AdmissionController::new(config.challenge.concurrency),
        challenge_policy: Arc::new(config.challenge.clone()),
        session_time_limit: config.session_time_limit,
    }
}

/// Connect to the platform and the oracle
///
/// Fails before serving anything if the token is rejected or the oracle's
/// calibration is unusable.
pub async fn connect(config: &BotConfig) -> Result<AppState> {
    let mut settings = ClientSettings::new(&config.url, &config.token);
    settings.max_retries = config.engine.max_retries;
    let client = LichessClient::new(settings).context("building platform client")?;

    let account = client.account().await.context("fetching bot account")?;
    info!("[PLATFORM] logged in as {}", account.username);

    let oracle = HttpOracle::connect(&config.engine.oracle_url, config.engine.oracle_timeout)
        .await
        .context("connecting to the oracle")?;

    Ok(app_state(config, Arc::new(client), Arc::new(oracle), account.id))
}
