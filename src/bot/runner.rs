//! Session runner
//!
//! Drives one [`GameSession`] over the platform's game stream until the game
//! ends. Each loop iteration is one processing step: read a unit, fold it into
//! the session, and if it is the bot's turn select and submit a move.
//!
//! # Reconnect Policy
//!
//! A transport failure during a step does not end the session if either
//!
//! - a move was attempted in that step (the next snapshot resyncs it), or
//! - the platform still lists the game as ongoing.
//!
//! The stream is then reopened; its first unit is a fresh full snapshot. In every
//! other case the session ends as [`SessionEnd::TransportFailed`]. A clean end of
//! stream always ends the session.
//!
//! # Deadlines
//!
//! On heartbeats of a started game the runner checks the abort and terminate
//! deadlines and aborts or resigns the game when they have passed.

use crate::core::config::BotConfig;
use crate::engine::history::EncodedHistory;
use crate::engine::policy::MoveSelector;
use crate::engine::rating::RatingPair;
use crate::game::ending::GameResult;
use crate::game::error::{SessionError, SessionResult};
use crate::game::session::{DeadlineConfig, DeltaOutcome, GameSession, Ingested, SessionStatus};
use crate::networking::client::{LineStream, Platform, PlatformError};
use crate::networking::model::StreamEvent;
use crate::bot::admission::AdmissionSlot;
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Chat room the rating side channel posts to
const RATING_CHAT_ROOM: &str = "player";

/// Timing knobs of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub deadlines: DeadlineConfig,
    /// Pause after each submitted move
    pub rate_limiting_delay: Duration,
    /// Pause before reopening a dropped stream
    pub reconnect_delay: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            deadlines: DeadlineConfig::default(),
            rate_limiting_delay: Duration::ZERO,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

impl SessionTiming {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            deadlines: DeadlineConfig {
                abort_after: config.abort_time,
                terminate_grace: config.terminate_grace,
            },
            rate_limiting_delay: config.rate_limiting_delay,
            reconnect_delay: config.reconnect_delay,
        }
    }
}

/// Everything a session needs from the process
pub struct SessionContext {
    pub platform: Arc<dyn Platform>,
    pub selector: MoveSelector,
    /// Bot account id, decides which colour we play
    pub bot_id: String,
    /// Platform base URL, for log lines
    pub base_url: String,
    pub timing: SessionTiming,
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Over,
    Aborted,
    TransportFailed,
    /// Abort or terminate deadline passed and the game was aborted/resigned
    DeadlineExit,
    /// Stream ended while the game was still running
    StreamClosed,
}

/// Summary of a finished session
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub game_id: String,
    pub end: SessionEnd,
    pub moves_played: usize,
    /// Rating estimates reported with each of our moves, in order
    pub ratings: Vec<RatingPair>,
    /// Classification of the ending, when the platform reported one
    pub result: Option<GameResult>,
    pub resyncs: u32,
}

enum Flow {
    Continue,
    Exit(SessionEnd),
}

enum StepError {
    Transport(PlatformError),
    Fatal(SessionError),
}

impl From<PlatformError> for StepError {
    fn from(e: PlatformError) -> Self {
        if e.is_transport() {
            StepError::Transport(e)
        } else {
            StepError::Fatal(SessionError::Platform(e))
        }
    }
}

impl From<SessionError> for StepError {
    fn from(e: SessionError) -> Self {
        StepError::Fatal(e)
    }
}

struct SessionRunner<'a> {
    ctx: &'a SessionContext,
    session: GameSession,
    history: EncodedHistory,
    lines: Option<LineStream>,
    pending_snapshot: Option<DeltaOutcome>,
    ratings: Vec<RatingPair>,
    moves_played: usize,
}

/// Play one game to the end
///
/// Returns an error only for fatal failures: a stream that does not open with a
/// full snapshot, or a move selection that found no legal move.
pub async fn play_game(ctx: &SessionContext, game_id: &str) -> SessionResult<SessionReport> {
    let mut lines = ctx.platform.game_stream(game_id).await?;

    let full = loop {
        match lines.next().await {
            Some(Ok(line)) if line.trim().is_empty() => continue,
            Some(Ok(line)) => match serde_json::from_str::<StreamEvent>(&line)? {
                StreamEvent::GameFull(full) => break full,
                _ => {
                    return Err(SessionError::Protocol {
                        message: format!("stream of {game_id} did not open with a full snapshot"),
                    })
                }
            },
            Some(Err(e)) => return Err(e.into()),
            None => {
                return Err(SessionError::Protocol {
                    message: format!("stream of {game_id} closed before the snapshot"),
                })
            }
        }
    };

    let session = GameSession::from_full(&full, &ctx.bot_id, ctx.timing.deadlines, Instant::now())?;
    let history = EncodedHistory::new(session.variant(), session.initial_fen())?;
    info!("+++ {}", session);

    let runner = SessionRunner {
        ctx,
        session,
        history,
        lines: Some(lines),
        pending_snapshot: Some(DeltaOutcome {
            changed: true,
            resynced: false,
            skipped: Vec::new(),
        }),
        ratings: Vec::new(),
        moves_played: 0,
    };
    runner.run().await
}

impl SessionRunner<'_> {
    async fn run(mut self) -> SessionResult<SessionReport> {
        let end = loop {
            let mut move_attempted = false;
            match self.step(&mut move_attempted).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(end)) => break end,
                Err(StepError::Fatal(e)) => {
                    error!("[SESSION] {} failed: {}", self.session.id(), e);
                    return Err(e);
                }
                Err(StepError::Transport(e)) => {
                    let game_id = self.session.id().to_string();
                    let stay = move_attempted || still_ongoing(self.ctx, &game_id).await;
                    info!(
                        "[SESSION] {} transport error: {}, move_attempted = {}, stay_in_game = {}",
                        self.session.id(),
                        e,
                        move_attempted,
                        stay
                    );
                    if !stay {
                        break SessionEnd::TransportFailed;
                    }
                    self.lines = None;
                    if !self.ctx.timing.reconnect_delay.is_zero() {
                        tokio::time::sleep(self.ctx.timing.reconnect_delay).await;
                    }
                }
            }
        };

        Ok(self.finish(end))
    }

    async fn step(&mut self, move_attempted: &mut bool) -> Result<Flow, StepError> {
        if let Some(outcome) = self.pending_snapshot.take() {
            return self.on_delta(outcome, move_attempted).await;
        }

        if self.lines.is_none() {
            let reopened = self.ctx.platform.game_stream(self.session.id()).await?;
            debug!("[SESSION] {} stream reopened", self.session.id());
            self.lines = Some(reopened);
        }
        let Some(lines) = self.lines.as_mut() else {
            return Ok(Flow::Continue);
        };

        let line = match lines.next().await {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(e.into()),
            None => return Ok(Flow::Exit(self.end_of_stream())),
        };

        let ingested = match self.session.ingest(&line, Instant::now()) {
            Ok(ingested) => ingested,
            Err(SessionError::Malformed(e)) => {
                warn!("[SESSION] {} skipping malformed unit: {}", self.session.id(), e);
                return Ok(Flow::Continue);
            }
            Err(e) => return Err(e.into()),
        };

        match ingested {
            Ingested::Heartbeat => self.on_heartbeat().await,
            Ingested::Delta(outcome) => self.on_delta(outcome, move_attempted).await,
            Ingested::Chat { username, text } => {
                debug!("[SESSION] {} chat {}: {}", self.session.id(), username, text);
                Ok(Flow::Continue)
            }
            Ingested::OpponentGone(gone) => {
                info!("[SESSION] {} opponent gone: {}", self.session.id(), gone);
                Ok(Flow::Continue)
            }
            Ingested::Ignored => Ok(Flow::Continue),
        }
    }

    async fn on_delta(&mut self, outcome: DeltaOutcome, move_attempted: &mut bool) -> Result<Flow, StepError> {
        if outcome.resynced {
            debug!("[SESSION] {} accepted non-extending move list", self.session.id());
        }

        if self.session.status() == SessionStatus::Started && self.session.is_my_turn() {
            *move_attempted = true;
            self.play_move().await?;
        }

        self.session.mark_processed();
        Ok(Flow::Continue)
    }

    async fn play_move(&mut self) -> Result<(), StepError> {
        let game_id = self.session.id().to_string();
        let choice = self
            .ctx
            .selector
            .select_move(&mut self.history, self.session.moves())
            .await
            .map_err(SessionError::from)?;

        self.ctx.platform.make_move(&game_id, &choice.uci).await?;
        self.moves_played += 1;
        self.ratings.push(choice.rating);
        info!(
            "[SESSION] {} played {} (rejected {} candidates)",
            game_id, choice.uci, choice.rejected
        );

        match serde_json::to_string(&choice.rating) {
            Ok(text) => {
                if let Err(e) = self.ctx.platform.chat(&game_id, RATING_CHAT_ROOM, &text).await {
                    warn!("[SESSION] {} rating chat failed: {}", game_id, e);
                }
            }
            Err(e) => warn!("[SESSION] {} rating not serializable: {}", game_id, e),
        }

        if !self.ctx.timing.rate_limiting_delay.is_zero() {
            tokio::time::sleep(self.ctx.timing.rate_limiting_delay).await;
        }
        Ok(())
    }

    async fn on_heartbeat(&mut self) -> Result<Flow, StepError> {
        if self.session.status() != SessionStatus::Started {
            return Ok(Flow::Continue);
        }

        let now = Instant::now();
        let game_id = self.session.id().to_string();
        if self.session.should_abort(now) {
            info!("[SESSION] {} abort deadline passed", game_id);
            if let Err(e) = self.ctx.platform.abort(&game_id).await {
                warn!("[SESSION] {} abort failed: {}", game_id, e);
            }
            return Ok(Flow::Exit(SessionEnd::DeadlineExit));
        }
        if self.session.should_terminate(now) {
            info!("[SESSION] {} terminate deadline passed", game_id);
            let result = if self.session.is_abortable() {
                self.ctx.platform.abort(&game_id).await
            } else {
                self.ctx.platform.resign(&game_id).await
            };
            if let Err(e) = result {
                warn!("[SESSION] {} leaving game failed: {}", game_id, e);
            }
            return Ok(Flow::Exit(SessionEnd::DeadlineExit));
        }
        Ok(Flow::Continue)
    }

    fn end_of_stream(&self) -> SessionEnd {
        match self.session.status() {
            SessionStatus::Over => SessionEnd::Over,
            SessionStatus::Aborted => SessionEnd::Aborted,
            SessionStatus::Started => SessionEnd::StreamClosed,
        }
    }

    fn finish(self, end: SessionEnd) -> SessionReport {
        let game_id = self.session.id().to_string();
        let result = self.session.status().is_terminal().then(|| self.session.on_terminal());
        if let Some(result) = &result {
            info!("[SESSION] {} {}", game_id, result);
        }

        let white: Vec<i64> = self.ratings.iter().map(|r| r.white.mean.round() as i64).collect();
        let black: Vec<i64> = self.ratings.iter().map(|r| r.black.mean.round() as i64).collect();
        info!("[SESSION] {} rating series white {:?} black {:?}", game_id, white, black);
        info!("--- {} Game over ({:?})", self.session.url(&self.ctx.base_url), end);

        SessionReport {
            game_id,
            end,
            moves_played: self.moves_played,
            ratings: self.ratings,
            result,
            resyncs: self.session.resyncs(),
        }
    }
}

/// Liveness check; an error counts as not ongoing
async fn still_ongoing(ctx: &SessionContext, game_id: &str) -> bool {
    match ctx.platform.ongoing_games().await {
        Ok(games) => games.iter().any(|id| id == game_id),
        Err(e) => {
            warn!("[SESSION] {} liveness check failed: {}", game_id, e);
            false
        }
    }
}

/// Run a session on its own task under a wall-clock limit
///
/// The slot is dropped when the task ends, however it ends.
pub fn spawn_session(ctx: Arc<SessionContext>, slot: AdmissionSlot, time_limit: Duration) -> JoinHandle<Option<SessionReport>> {
    tokio::spawn(async move {
        let game_id = slot.game_id().to_string();
        let outcome = tokio::time::timeout(time_limit, play_game(&ctx, &game_id)).await;
        drop(slot);
        match outcome {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                error!("[SESSION] {} ended with error: {}", game_id, e);
                None
            }
            Err(_) => {
                warn!("[SESSION] {} exceeded time limit of {:?}", game_id, time_limit);
                None
            }
        }
    })
}
