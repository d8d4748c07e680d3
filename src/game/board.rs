//! Board adapter over `shakmaty`
//!
//! Everything the session engine needs from chess rules goes through [`Board`]:
//! position setup from a variant and optional FEN, UCI parsing with legality
//! checks, move application, and classification of positions that end the game
//! on the board. No I/O happens here.
//!
//! Repetition is not tracked by `shakmaty`, so the adapter keeps its own count of
//! EPD keys for every position reached since setup.

use crate::game::error::{BoardError, BoardResult};
use shakmaty::fen::{Epd, Fen};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};
use std::collections::HashMap;
use std::fmt;

/// Variants the bot can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    Standard,
    Chess960,
    FromPosition,
}

impl Variant {
    /// Parse a platform variant key (`standard`, `chess960`, `fromPosition`)
    pub fn from_key(key: &str) -> BoardResult<Self> {
        match key {
            "standard" => Ok(Variant::Standard),
            "chess960" => Ok(Variant::Chess960),
            "fromPosition" => Ok(Variant::FromPosition),
            other => Err(BoardError::UnsupportedVariant {
                key: other.to_string(),
            }),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Chess960 => "chess960",
            Variant::FromPosition => "fromPosition",
        }
    }

    /// Castling notation used by the platform for this variant
    pub fn castling_mode(self) -> CastlingMode {
        match self {
            Variant::Chess960 => CastlingMode::Chess960,
            Variant::Standard | Variant::FromPosition => CastlingMode::Standard,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Game-ending positions recognised on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardTermination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoves,
    ThreefoldRepetition,
}

/// A position plus the history needed for repetition detection
#[derive(Debug, Clone)]
pub struct Board {
    position: Chess,
    mode: CastlingMode,
    seen: HashMap<String, u32>,
}

impl Board {
    /// Set up the starting position of a game
    ///
    /// Standard games ignore `initial_fen` (the platform sends `"startpos"`).
    /// Chess960 and from-position games use it when present.
    pub fn new(variant: Variant, initial_fen: Option<&str>) -> BoardResult<Self> {
        let mode = variant.castling_mode();
        let fen = match (variant, initial_fen) {
            (Variant::Standard, _) | (_, None) | (_, Some("startpos")) => None,
            (_, Some(fen)) => Some(fen),
        };

        let position = match fen {
            None => Chess::default(),
            Some(fen) => {
                let invalid = |message: String| BoardError::InvalidFen {
                    fen: fen.to_string(),
                    message,
                };
                let parsed: Fen = fen.parse().map_err(|e| invalid(format!("{e}")))?;
                parsed
                    .into_position::<Chess>(mode)
                    .map_err(|e| invalid(format!("{e}")))?
            }
        };

        let mut board = Self {
            position,
            mode,
            seen: HashMap::new(),
        };
        board.record_position();
        Ok(board)
    }

    /// Rebuild a board by replaying a move list
    ///
    /// Moves that fail to parse or are illegal are skipped. Returns the board and
    /// the moves that were skipped.
    pub fn replay<'a, I>(variant: Variant, initial_fen: Option<&str>, moves: I) -> BoardResult<(Self, Vec<String>)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut board = Self::new(variant, initial_fen)?;
        let mut skipped = Vec::new();
        for uci in moves {
            if board.push_uci(uci).is_err() {
                skipped.push(uci.to_string());
            }
        }
        Ok((board, skipped))
    }

    pub fn castling_mode(&self) -> CastlingMode {
        self.mode
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn white_to_move(&self) -> bool {
        self.position.turn().is_white()
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// Parse a UCI string into a move that is legal here
    pub fn parse_uci(&self, uci: &str) -> BoardResult<Move> {
        let parsed: UciMove = uci.parse().map_err(|_| BoardError::UnparseableMove {
            uci: uci.to_string(),
        })?;
        self.to_legal(parsed).ok_or_else(|| BoardError::IllegalMove {
            uci: uci.to_string(),
        })
    }

    /// Resolve a UCI move against the position, `None` if illegal
    pub fn to_legal(&self, uci: UciMove) -> Option<Move> {
        uci.to_move(&self.position).ok()
    }

    pub fn is_legal(&self, m: Move) -> bool {
        self.position.is_legal(m)
    }

    /// Apply a legal move
    pub fn play(&mut self, m: Move) -> BoardResult<()> {
        if !self.position.is_legal(m) {
            return Err(BoardError::IllegalMove { uci: self.uci(m) });
        }
        self.position.play_unchecked(m);
        self.record_position();
        Ok(())
    }

    /// Parse and apply a UCI move
    pub fn push_uci(&mut self, uci: &str) -> BoardResult<Move> {
        let m = self.parse_uci(uci)?;
        self.position.play_unchecked(m);
        self.record_position();
        Ok(m)
    }

    /// UCI notation of a move in this board's castling mode
    pub fn uci(&self, m: Move) -> String {
        UciMove::from_move(m, self.mode).to_string()
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    pub fn has_legal_moves(&self) -> bool {
        !self.position.legal_moves().is_empty()
    }

    /// Whether `color` could never deliver mate, used to split timeout results
    pub fn has_insufficient_material(&self, color: Color) -> bool {
        self.position.has_insufficient_material(color)
    }

    /// Classify the position if it ends the game on the board
    pub fn termination(&self) -> Option<BoardTermination> {
        if self.position.is_checkmate() {
            Some(BoardTermination::Checkmate)
        } else if self.position.is_stalemate() {
            Some(BoardTermination::Stalemate)
        } else if self.position.is_insufficient_material() {
            Some(BoardTermination::InsufficientMaterial)
        } else if self.position.halfmoves() >= 100 {
            Some(BoardTermination::FiftyMoves)
        } else if self.repetitions() >= 3 {
            Some(BoardTermination::ThreefoldRepetition)
        } else {
            None
        }
    }

    /// How often the current position has occurred
    pub fn repetitions(&self) -> u32 {
        self.seen.get(&self.epd_key()).copied().unwrap_or(0)
    }

    fn epd_key(&self) -> String {
        Epd::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    fn record_position(&mut self) {
        *self.seen.entry(self.epd_key()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_start_has_white_to_move() {
        //! A standard board starts with white to move and 20 legal moves
        let board = Board::new(Variant::Standard, Some("startpos")).unwrap();
        assert!(board.white_to_move());
        assert_eq!(board.position().legal_moves().len(), 20);
    }

    #[test]
    fn test_replay_skips_illegal_moves() {
        //! Illegal moves in the platform's list are skipped, not fatal
        let (board, skipped) =
            Board::replay(Variant::Standard, None, ["e2e4", "e2e4", "e7e5", "zz99"]).unwrap();

        assert_eq!(skipped, vec!["e2e4".to_string(), "zz99".to_string()]);
        assert!(board.white_to_move());
    }

    #[test]
    fn test_parse_uci_rejects_illegal() {
        //! Legality is checked against the current position
        let board = Board::new(Variant::Standard, None).unwrap();
        assert!(board.parse_uci("e2e4").is_ok());
        assert!(matches!(
            board.parse_uci("e2e5"),
            Err(BoardError::IllegalMove { .. })
        ));
        assert!(matches!(
            board.parse_uci("nonsense"),
            Err(BoardError::UnparseableMove { .. })
        ));
    }

    #[test]
    fn test_from_position_uses_fen() {
        //! From-position games start from the supplied FEN
        let fen = "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1";
        let board = Board::new(Variant::FromPosition, Some(fen)).unwrap();
        assert!(!board.white_to_move());
        assert_eq!(board.fen(), fen);
    }

    #[test]
    fn test_invalid_fen_is_rejected() {
        //! A broken FEN fails setup instead of falling back to the start position
        let result = Board::new(Variant::FromPosition, Some("not a fen"));
        assert!(matches!(result, Err(BoardError::InvalidFen { .. })));
    }

    #[test]
    fn test_unsupported_variant() {
        //! Variants other than standard/chess960/fromPosition are rejected
        assert!(Variant::from_key("atomic").is_err());
        assert_eq!(Variant::from_key("chess960").unwrap(), Variant::Chess960);
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        //! Checkmate is classified on the board
        let (board, skipped) =
            Board::replay(Variant::Standard, None, ["f2f3", "e7e5", "g2g4", "d8h4"]).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(board.termination(), Some(BoardTermination::Checkmate));
        assert!(!board.has_legal_moves());
    }

    #[test]
    fn test_threefold_repetition() {
        //! Knight shuffles repeat the start position a third time
        let moves = ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"];
        let (board, _) = Board::replay(Variant::Standard, None, moves).unwrap();
        assert_eq!(board.repetitions(), 3);
        assert_eq!(board.termination(), Some(BoardTermination::ThreefoldRepetition));
    }

    #[test]
    fn test_insufficient_material() {
        //! Bare kings are a dead position
        let board = Board::new(Variant::FromPosition, Some("4k3/8/8/8/8/8/8/4K3 w - - 0 1")).unwrap();
        assert_eq!(board.termination(), Some(BoardTermination::InsufficientMaterial));
    }

    #[test]
    fn test_castling_notation_follows_variant() {
        //! Standard games castle as e1g1; the move resolves either way
        let (board, _) = Board::replay(
            Variant::Standard,
            None,
            ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"],
        )
        .unwrap();
        let castle = board.parse_uci("e1g1").unwrap();
        assert_eq!(board.uci(castle), "e1g1");
        assert!(board.parse_uci("e1h1").is_ok());
    }
}
