//! Encoded game history
//!
//! [`EncodedHistory`] is the token sequence the oracle reads: the start token
//! followed by one token per accepted half-move. It owns its own board so
//! candidate moves can be checked against exactly the position the tokens
//! describe, and it remembers which platform move strings it has consumed so it
//! can catch up with (or roll back to) the platform's move list.

use crate::engine::token::{MoveToken, START_TOKEN};
use crate::game::board::{Board, Variant};
use crate::game::error::BoardResult;
use shakmaty::uci::UciMove;
use shakmaty::Move;
use tracing::debug;

/// What a call to [`EncodedHistory::sync_with`] changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Plies dropped because the platform never accepted them
    pub truncated: usize,
    /// Plies appended from the platform's list
    pub appended: usize,
    /// Platform moves that could not be replayed
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EncodedHistory {
    variant: Variant,
    initial_fen: Option<String>,
    tokens: Vec<MoveToken>,
    board: Board,
    consumed: Vec<String>,
}

impl EncodedHistory {
    pub fn new(variant: Variant, initial_fen: Option<&str>) -> BoardResult<Self> {
        Ok(Self {
            variant,
            initial_fen: initial_fen.map(str::to_string),
            tokens: vec![START_TOKEN],
            board: Board::new(variant, initial_fen)?,
            consumed: Vec::new(),
        })
    }

    pub fn tokens(&self) -> &[MoveToken] {
        &self.tokens
    }

    /// Half-moves encoded so far
    pub fn plies(&self) -> usize {
        self.tokens.len() - 1
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Bring the history in line with the platform's move list
    ///
    /// Moves past the common prefix are appended. If the history holds moves the
    /// platform does not list, it is rebuilt from the common prefix first.
    pub fn sync_with(&mut self, moves: &[String]) -> BoardResult<SyncReport> {
        let common = self
            .consumed
            .iter()
            .zip(moves)
            .take_while(|(ours, theirs)| ours == theirs)
            .count();

        let mut report = SyncReport::default();
        if common < self.consumed.len() {
            report.truncated = self.consumed.len() - common;
            let keep = self.consumed[..common].to_vec();
            *self = Self::new(self.variant, self.initial_fen.as_deref())?;
            for uci in &keep {
                self.consume(uci);
            }
            debug!("[POLICY] history rolled back by {} plies", report.truncated);
        }

        for uci in &moves[common..] {
            if self.consume(uci) {
                report.appended += 1;
            } else {
                report.skipped.push(uci.clone());
            }
        }
        Ok(report)
    }

    /// Append a legal move the bot chose
    pub fn commit(&mut self, m: Move, token: MoveToken) -> BoardResult<()> {
        let uci = self.board.uci(m);
        self.board.play(m)?;
        self.tokens.push(token);
        self.consumed.push(uci);
        Ok(())
    }

    /// Replay one platform move; returns whether it produced a token
    fn consume(&mut self, uci: &str) -> bool {
        self.consumed.push(uci.to_string());
        let Ok(m) = self.board.parse_uci(uci) else {
            return false;
        };
        let Some(token) = MoveToken::encode(&UciMove::from_move(m, self.board.castling_mode())) else {
            return false;
        };
        if self.board.play(m).is_err() {
            return false;
        }
        self.tokens.push(token);
        true
    }
}
