//! Per-game session state machine
//!
//! A [`GameSession`] is created from the first unit of a game stream (the full
//! snapshot) and folds every later unit into a local model of the game:
//!
//! - the accepted move list and a board rebuilt from it
//! - the clock, and the abort/terminate deadlines derived from it
//! - the game status, which only ever moves from `Started` to a terminal state
//! - the move list as of the last fully processed step, for change detection
//!
//! # Turn Detection
//!
//! [`GameSession::is_my_turn`] holds when the move list differs from the last
//! processed snapshot and the side to move is the bot's colour. Once the caller
//! has acted on a position it calls [`GameSession::mark_processed`], after which
//! the same snapshot never reports a turn again.
//!
//! # Deadlines
//!
//! Both deadlines are recomputed on every state delta and are never set directly:
//!
//! - terminate: now + side-to-move's remaining time + its increment + grace
//! - abort: now + the configured abort window (only acted on while abortable)

use crate::game::board::{Board, Variant};
use crate::game::ending::GameResult;
use crate::game::error::{SessionError, SessionResult};
use crate::networking::model::{GameFull, GameStateEvent, StreamEvent};
use shakmaty::Color;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Lifecycle status; terminal states never revert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Started,
    Over,
    Aborted,
}

impl SessionStatus {
    /// Map a platform status string
    pub fn from_platform(status: &str) -> Self {
        match status {
            "created" | "started" => SessionStatus::Started,
            "aborted" | "noStart" => SessionStatus::Aborted,
            _ => SessionStatus::Over,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != SessionStatus::Started
    }
}

/// Remaining time and increments for both sides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    pub wtime: Duration,
    pub btime: Duration,
    pub winc: Duration,
    pub binc: Duration,
}

impl Clock {
    pub fn from_state(state: &GameStateEvent) -> Self {
        Self {
            wtime: Duration::from_millis(state.wtime),
            btime: Duration::from_millis(state.btime),
            winc: Duration::from_millis(state.winc),
            binc: Duration::from_millis(state.binc),
        }
    }

    pub fn remaining(&self, color: Color) -> Duration {
        if color.is_white() { self.wtime } else { self.btime }
    }

    pub fn increment(&self, color: Color) -> Duration {
        if color.is_white() { self.winc } else { self.binc }
    }
}

/// Timing constants a session derives its deadlines from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineConfig {
    /// Abort window, from `abort_time`
    pub abort_after: Duration,
    /// Slack on top of the side-to-move's clock
    pub terminate_grace: Duration,
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            abort_after: Duration::from_secs(20),
            terminate_grace: Duration::from_secs(60),
        }
    }
}

/// What a single ingested unit did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingested {
    /// Empty line: liveness ping only
    Heartbeat,
    /// A state delta was applied
    Delta(DeltaOutcome),
    /// Chat message from `username`
    Chat { username: String, text: String },
    /// Opponent left (`true`) or came back
    OpponentGone(bool),
    /// Event type the session does not act on
    Ignored,
}

/// Result of folding a state delta into the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaOutcome {
    /// Move list differs from the last processed snapshot
    pub changed: bool,
    /// The new move list did not extend the previous one
    pub resynced: bool,
    /// Platform moves that failed to replay and were skipped
    pub skipped: Vec<String>,
}

/// One game between the bot and an opponent
#[derive(Debug, Clone)]
pub struct GameSession {
    id: String,
    is_white: bool,
    variant: Variant,
    initial_fen: Option<String>,
    white_name: String,
    black_name: String,
    status: SessionStatus,
    winner: Option<Color>,
    platform_status: String,
    moves: Vec<String>,
    moves_str: String,
    clock: Clock,
    board: Board,
    deadlines: DeadlineConfig,
    abort_deadline: Instant,
    terminate_deadline: Instant,
    prior_moves: Option<String>,
    resyncs: u32,
}

impl GameSession {
    /// Create a session from the full snapshot that opens every stream
    ///
    /// `bot_id` is the bot account id; it decides which colour the bot plays.
    pub fn from_full(full: &GameFull, bot_id: &str, deadlines: DeadlineConfig, now: Instant) -> SessionResult<Self> {
        let variant = Variant::from_key(&full.variant.key)?;
        let is_white = full
            .white
            .id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(bot_id));
        let initial_fen = full.initial_fen.clone().filter(|fen| fen != "startpos");
        let board = Board::new(variant, initial_fen.as_deref())?;

        let mut session = Self {
            id: full.id.clone(),
            is_white,
            variant,
            initial_fen,
            white_name: full.white.display_name(),
            black_name: full.black.display_name(),
            status: SessionStatus::Started,
            winner: None,
            platform_status: String::new(),
            moves: Vec::new(),
            moves_str: String::new(),
            clock: Clock::default(),
            board,
            deadlines,
            abort_deadline: now + deadlines.abort_after,
            terminate_deadline: now + deadlines.terminate_grace,
            prior_moves: None,
            resyncs: 0,
        };
        session.apply_state(&full.state, now)?;
        Ok(session)
    }

    /// Parse and fold one raw stream line
    pub fn ingest(&mut self, line: &str, now: Instant) -> SessionResult<Ingested> {
        if line.trim().is_empty() {
            return Ok(Ingested::Heartbeat);
        }
        let event: StreamEvent = serde_json::from_str(line)?;
        self.ingest_event(event, now)
    }

    /// Fold one decoded stream event
    ///
    /// A repeated full snapshot (after a reconnect) is applied as a delta.
    pub fn ingest_event(&mut self, event: StreamEvent, now: Instant) -> SessionResult<Ingested> {
        match event {
            StreamEvent::GameFull(full) => {
                if full.id != self.id {
                    return Err(SessionError::Protocol {
                        message: format!("snapshot for {} on stream of {}", full.id, self.id),
                    });
                }
                Ok(Ingested::Delta(self.apply_state(&full.state, now)?))
            }
            StreamEvent::GameState(state) => Ok(Ingested::Delta(self.apply_state(&state, now)?)),
            StreamEvent::ChatLine(chat) => Ok(Ingested::Chat {
                username: chat.username,
                text: chat.text,
            }),
            StreamEvent::OpponentGone(gone) => Ok(Ingested::OpponentGone(gone.gone)),
            StreamEvent::Unknown => Ok(Ingested::Ignored),
        }
    }

    /// Replace moves, clock and status from a delta and rebuild the board
    pub fn apply_state(&mut self, state: &GameStateEvent, now: Instant) -> SessionResult<DeltaOutcome> {
        let new_moves: Vec<String> = state.moves.split_whitespace().map(str::to_string).collect();
        let resynced = !new_moves.starts_with(&self.moves);
        if resynced {
            self.resyncs += 1;
            warn!(
                "[SESSION] {} move list no longer extends the previous one ({} -> {} plies), resyncing",
                self.id,
                self.moves.len(),
                new_moves.len()
            );
        }

        let (board, skipped) = Board::replay(
            self.variant,
            self.initial_fen.as_deref(),
            new_moves.iter().map(String::as_str),
        )?;
        if !skipped.is_empty() {
            debug!("[SESSION] {} skipped unplayable moves {:?}", self.id, skipped);
        }

        self.board = board;
        self.moves = new_moves;
        self.moves_str = state.moves.trim().to_string();
        self.clock = Clock::from_state(state);
        self.platform_status = state.status.clone();
        self.winner = match state.winner.as_deref() {
            Some("white") => Some(Color::White),
            Some("black") => Some(Color::Black),
            _ => None,
        };

        let next = SessionStatus::from_platform(&state.status);
        if !self.status.is_terminal() {
            self.status = next;
        }

        self.compute_deadlines(now);

        Ok(DeltaOutcome {
            changed: self.is_changed(),
            resynced,
            skipped,
        })
    }

    /// Recompute both deadlines from the current clock
    pub fn compute_deadlines(&mut self, now: Instant) {
        let side = self.board.turn();
        self.terminate_deadline =
            now + self.clock.remaining(side) + self.clock.increment(side) + self.deadlines.terminate_grace;
        self.abort_deadline = now + self.deadlines.abort_after;
    }

    /// The move list differs from the last processed snapshot
    pub fn is_changed(&self) -> bool {
        self.prior_moves.as_deref() != Some(self.moves_str.as_str())
    }

    pub fn is_my_turn(&self) -> bool {
        self.is_changed() && self.board.white_to_move() == self.is_white
    }

    /// Record the current snapshot as fully processed
    pub fn mark_processed(&mut self) {
        self.prior_moves = Some(self.moves_str.clone());
    }

    /// Fewer than two plies played; the platform still allows an abort
    pub fn is_abortable(&self) -> bool {
        self.moves.len() < 2
    }

    pub fn should_abort(&self, now: Instant) -> bool {
        self.is_abortable() && now >= self.abort_deadline
    }

    pub fn should_terminate(&self, now: Instant) -> bool {
        now >= self.terminate_deadline
    }

    /// Classify the ending for the game-over log
    pub fn on_terminal(&self) -> GameResult {
        GameResult::classify(
            &self.platform_status,
            self.winner,
            &self.board,
            !self.clock.wtime.is_zero(),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_white(&self) -> bool {
        self.is_white
    }

    pub fn color(&self) -> Color {
        Color::from_white(self.is_white)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn initial_fen(&self) -> Option<&str> {
        self.initial_fen.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn abort_deadline(&self) -> Instant {
        self.abort_deadline
    }

    pub fn terminate_deadline(&self) -> Instant {
        self.terminate_deadline
    }

    /// Number of non-extending move lists seen so far
    pub fn resyncs(&self) -> u32 {
        self.resyncs
    }

    /// Game URL on the platform
    pub fn url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.id)
    }
}

impl std::fmt::Display for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Game {} {} vs {} ({})",
            self.id, self.white_name, self.black_name, self.variant
        )
    }
}
