//! Game module - board adapter and per-game session state
//!
//! # Module Organization
//!
//! - `board` - [`Board`] wraps `shakmaty` for setup, legality and endings
//! - `session` - [`GameSession`] folds the game stream into local state and
//!   decides when it is the bot's turn
//! - `ending` - classification of finished games for the game-over log
//! - `error` - board and session error types
//!
//! Nothing in here performs I/O; the async loop driving a session lives in
//! `bot::runner`.

pub mod board;
pub mod ending;
pub mod error;
pub mod session;

pub use board::{Board, BoardTermination, Variant};
pub use ending::{DrawReason, Ending, GameResult};
pub use error::{BoardError, BoardResult, SessionError, SessionResult};
pub use session::{Clock, DeadlineConfig, DeltaOutcome, GameSession, Ingested, SessionStatus};
