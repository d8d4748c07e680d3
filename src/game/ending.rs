//! Game ending classification
//!
//! Turns the platform's final `status`/`winner` pair plus the final board into a
//! [`Ending`] for the game-over log line. Purely observational: nothing here
//! changes session state.

use crate::game::board::{Board, BoardTermination};
use shakmaty::Color;
use std::fmt;

/// How a finished game was decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ending {
    Checkmate,
    /// `loser` resigned
    Resignation { loser: Color },
    Aborted,
    Draw(DrawReason),
    /// `flagged` ran out of time; `opponent_could_mate` is false when the game was
    /// drawn because the other side lacked mating material
    Timeout { flagged: Color, opponent_could_mate: bool },
    /// Any other platform status, e.g. `variantEnd` or `cheat`
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    FiftyMoves,
    Repetition,
    InsufficientMaterial,
    Stalemate,
    Agreement,
}

/// Ending plus winner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub winner: Option<Color>,
    pub ending: Ending,
}

impl GameResult {
    /// Classify a finished game
    ///
    /// `white_time_left` decides who flagged when the platform reports a timeout
    /// without a winner.
    pub fn classify(status: &str, winner: Option<Color>, board: &Board, white_time_left: bool) -> Self {
        let ending = match status {
            "mate" => Ending::Checkmate,
            "resign" => Ending::Resignation {
                loser: winner.map(|w| !w).unwrap_or(board.turn()),
            },
            "aborted" => Ending::Aborted,
            "draw" | "stalemate" => Ending::Draw(draw_reason(board)),
            "outoftime" | "timeout" => {
                let flagged = match winner {
                    Some(w) => !w,
                    None if white_time_left => Color::Black,
                    None => Color::White,
                };
                Ending::Timeout {
                    flagged,
                    opponent_could_mate: winner.is_some(),
                }
            }
            other => Ending::Other(other.to_string()),
        };
        Self { winner, ending }
    }
}

fn draw_reason(board: &Board) -> DrawReason {
    match board.termination() {
        Some(BoardTermination::FiftyMoves) => DrawReason::FiftyMoves,
        Some(BoardTermination::ThreefoldRepetition) => DrawReason::Repetition,
        Some(BoardTermination::InsufficientMaterial) => DrawReason::InsufficientMaterial,
        Some(BoardTermination::Stalemate) => DrawReason::Stalemate,
        _ => DrawReason::Agreement,
    }
}

fn side(color: Color) -> &'static str {
    if color.is_white() { "White" } else { "Black" }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ending::Checkmate => write!(f, "Game won by checkmate."),
            Ending::Resignation { loser } => write!(f, "{} resigned.", side(*loser)),
            Ending::Aborted => write!(f, "Game aborted."),
            Ending::Draw(DrawReason::FiftyMoves) => write!(f, "Game drawn by 50-move rule."),
            Ending::Draw(DrawReason::Repetition) => write!(f, "Game drawn by threefold repetition."),
            Ending::Draw(DrawReason::InsufficientMaterial) => {
                write!(f, "Game drawn from insufficient material.")
            }
            Ending::Draw(DrawReason::Stalemate) => write!(f, "Game drawn by stalemate."),
            Ending::Draw(DrawReason::Agreement) => write!(f, "Game drawn by agreement."),
            Ending::Timeout {
                flagged,
                opponent_could_mate: true,
            } => write!(f, "{} forfeited on time.", side(*flagged)),
            Ending::Timeout {
                flagged,
                opponent_could_mate: false,
            } => write!(
                f,
                "{} ran out of time, but {} did not have enough material to mate.",
                side(*flagged),
                side(!*flagged)
            ),
            Ending::Other(status) => write!(f, "Game ended by {status}"),
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.winner, &self.ending) {
            (Some(w), _) => write!(f, "{} won! {}", side(w), self.ending),
            (None, Ending::Draw(_) | Ending::Timeout { .. }) => {
                write!(f, "Game ended in a draw. {}", self.ending)
            }
            (None, _) => write!(f, "Game adjourned. {}", self.ending),
        }
    }
}
