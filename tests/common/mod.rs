//! Shared test doubles: an in-memory platform and a scripted oracle

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use mimicbot::bot::{SessionContext, SessionTiming};
use mimicbot::engine::{
    Calibration, LatentRating, MoveSelector, MoveToken, Oracle, OracleResult, Prediction, SamplingConfig,
};
use mimicbot::game::DeadlineConfig;
use mimicbot::networking::model::Account;
use mimicbot::networking::{LineStream, Platform, PlatformError, PlatformResult};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

pub const BOT_ID: &str = "mimicbot";
pub const GAME_ID: &str = "game0001";

/// One scripted stream: lines (or transport errors) then end of stream
pub type Script = Vec<PlatformResult<String>>;

#[derive(Default)]
pub struct FakePlatform {
    pub streams: Mutex<VecDeque<Script>>,
    pub stream_opens: Mutex<usize>,
    /// Every submission attempt, failed ones included
    pub move_attempts: Mutex<Vec<String>>,
    /// Errors returned by the next submissions, in order
    pub move_failures: Mutex<VecDeque<PlatformError>>,
    pub chats: Mutex<Vec<(String, String)>>,
    pub aborts: Mutex<Vec<String>>,
    pub resigns: Mutex<Vec<String>>,
    pub ongoing: Mutex<Vec<String>>,
    pub liveness_checks: Mutex<usize>,
    pub accepted: Mutex<Vec<String>>,
    pub declined: Mutex<Vec<(String, String)>>,
}

impl FakePlatform {
    pub fn with_streams(streams: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            streams: Mutex::new(streams.into()),
            ..Self::default()
        })
    }

    pub fn moves(&self) -> Vec<String> {
        self.move_attempts.lock().clone()
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn account(&self) -> PlatformResult<Account> {
        Ok(Account {
            id: BOT_ID.to_string(),
            username: "MimicBot".to_string(),
            title: Some("BOT".to_string()),
        })
    }

    async fn game_stream(&self, _game_id: &str) -> PlatformResult<LineStream> {
        *self.stream_opens.lock() += 1;
        let script = self
            .streams
            .lock()
            .pop_front()
            .ok_or_else(|| PlatformError::Connection("no stream scripted".to_string()))?;
        Ok(stream::iter(script).boxed())
    }

    async fn make_move(&self, _game_id: &str, uci: &str) -> PlatformResult<()> {
        self.move_attempts.lock().push(uci.to_string());
        match self.move_failures.lock().pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn chat(&self, _game_id: &str, room: &str, text: &str) -> PlatformResult<()> {
        self.chats.lock().push((room.to_string(), text.to_string()));
        Ok(())
    }

    async fn abort(&self, game_id: &str) -> PlatformResult<()> {
        self.aborts.lock().push(game_id.to_string());
        Ok(())
    }

    async fn resign(&self, game_id: &str) -> PlatformResult<()> {
        self.resigns.lock().push(game_id.to_string());
        Ok(())
    }

    async fn ongoing_games(&self) -> PlatformResult<Vec<String>> {
        *self.liveness_checks.lock() += 1;
        Ok(self.ongoing.lock().clone())
    }

    async fn accept_challenge(&self, challenge_id: &str) -> PlatformResult<()> {
        self.accepted.lock().push(challenge_id.to_string());
        Ok(())
    }

    async fn decline_challenge(&self, challenge_id: &str, reason: &str) -> PlatformResult<()> {
        self.declined.lock().push((challenge_id.to_string(), reason.to_string()));
        Ok(())
    }

    async fn upgrade_to_bot(&self) -> PlatformResult<()> {
        Ok(())
    }
}

/// Oracle answering from a list of `(uci, probability)` pairs per history length
///
/// Histories without an entry get an empty distribution.
pub struct ScriptedOracle {
    pub book: Vec<Vec<(&'static str, f64)>>,
    pub calls: Mutex<Vec<usize>>,
}

impl ScriptedOracle {
    pub fn new(book: Vec<Vec<(&'static str, f64)>>) -> Arc<Self> {
        Arc::new(Self {
            book,
            calls: Mutex::new(Vec::new()),
        })
    }
}

pub fn calibration() -> Calibration {
    Calibration {
        mean: 1500.0,
        scale: 350.0,
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn calibration(&self) -> Calibration {
        calibration()
    }

    async fn predict(&self, history: &[MoveToken]) -> OracleResult<Prediction> {
        let plies = history.len() - 1;
        self.calls.lock().push(plies);
        let moves = self
            .book
            .get(plies)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(uci, p)| MoveToken::from_uci_str(uci).map(|t| (t, *p)))
                    .collect()
            })
            .unwrap_or_default();
        let latent = (0..history.len())
            .map(|i| LatentRating {
                mean: i as f64 * 0.1,
                scale: 1.0,
            })
            .collect();
        Ok(Prediction { moves, latent })
    }
}

pub fn timing() -> SessionTiming {
    SessionTiming {
        deadlines: DeadlineConfig::default(),
        rate_limiting_delay: Duration::ZERO,
        reconnect_delay: Duration::ZERO,
    }
}

pub fn context(platform: Arc<FakePlatform>, oracle: Arc<ScriptedOracle>, timing: SessionTiming) -> SessionContext {
    SessionContext {
        platform,
        selector: MoveSelector::new(oracle, SamplingConfig::default()),
        bot_id: BOT_ID.to_string(),
        base_url: "https://lichess.org/".to_string(),
        timing,
    }
}

pub fn game_full(bot_white: bool, moves: &str, wtime: u64) -> PlatformResult<String> {
    let (white, black) = if bot_white { (BOT_ID, "human") } else { ("human", BOT_ID) };
    Ok(json!({
        "type": "gameFull",
        "id": GAME_ID,
        "rated": false,
        "variant": {"key": "standard", "name": "Standard"},
        "speed": "blitz",
        "white": {"id": white, "name": white, "rating": 1500},
        "black": {"id": black, "name": black, "rating": 1500},
        "initialFen": "startpos",
        "state": {
            "type": "gameState",
            "moves": moves,
            "wtime": wtime,
            "btime": 60000,
            "winc": 0,
            "binc": 0,
            "status": "started"
        }
    })
    .to_string())
}

pub fn game_state(moves: &str, status: &str, winner: Option<&str>) -> PlatformResult<String> {
    let mut state = json!({
        "type": "gameState",
        "moves": moves,
        "wtime": 60000,
        "btime": 60000,
        "winc": 0,
        "binc": 0,
        "status": status
    });
    if let Some(winner) = winner {
        state["winner"] = json!(winner);
    }
    Ok(state.to_string())
}

pub fn heartbeat() -> PlatformResult<String> {
    Ok(String::new())
}
