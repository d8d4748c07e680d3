//! Move vocabulary shared with the oracle
//!
//! Every move the oracle can predict is a [`MoveToken`]. Token 0 marks the start
//! of a game. A plain move from square `f` to square `t` (0..64, a1 = 0) is
//! `1 + f * 64 + t`. Promotions get their own block of 4096 ids per piece, in
//! the order knight, bishop, rook, queen.
//!
//! Castling is encoded by the king's from/to squares in the notation of the
//! game's castling mode, which is also what the platform reports.

use serde::{Deserialize, Serialize};
use shakmaty::uci::UciMove;
use shakmaty::{Role, Square};
use std::fmt;

const SQUARE_PAIRS: u32 = 64 * 64;
const PROMOTION_ROLES: [Role; 4] = [Role::Knight, Role::Bishop, Role::Rook, Role::Queen];

/// Start-of-game token
pub const START_TOKEN: MoveToken = MoveToken(0);

/// Number of distinct tokens, including the start token
pub const VOCAB_SIZE: usize = 1 + (1 + PROMOTION_ROLES.len()) * SQUARE_PAIRS as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveToken(pub u32);

impl MoveToken {
    /// Token for a UCI move, `None` for drops and null moves
    pub fn encode(uci: &UciMove) -> Option<Self> {
        let UciMove::Normal { from, to, promotion } = *uci else {
            return None;
        };
        let pair = from.to_u32() * 64 + to.to_u32();
        let block = match promotion {
            None => 0,
            Some(role) => 1 + PROMOTION_ROLES.iter().position(|r| *r == role)? as u32,
        };
        Some(MoveToken(1 + block * SQUARE_PAIRS + pair))
    }

    /// Inverse of [`MoveToken::encode`]; `None` for the start token and out-of-range ids
    pub fn decode(self) -> Option<UciMove> {
        if self == START_TOKEN || self.0 as usize >= VOCAB_SIZE {
            return None;
        }
        let raw = self.0 - 1;
        let block = raw / SQUARE_PAIRS;
        let pair = raw % SQUARE_PAIRS;
        let promotion = match block {
            0 => None,
            n => Some(PROMOTION_ROLES[n as usize - 1]),
        };
        Some(UciMove::Normal {
            from: Square::new(pair / 64),
            to: Square::new(pair % 64),
            promotion,
        })
    }

    pub fn from_uci_str(uci: &str) -> Option<Self> {
        uci.parse::<UciMove>().ok().as_ref().and_then(Self::encode)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Some(uci) => write!(f, "{}({})", self.0, uci),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocab_size() {
        //! Start token plus five blocks of square pairs
        assert_eq!(VOCAB_SIZE, 20_481);
    }

    #[test]
    fn test_known_tokens() {
        //! e2e4 is 1 + 12 * 64 + 28
        let e2e4 = MoveToken::from_uci_str("e2e4").unwrap();
        assert_eq!(e2e4.id(), 1 + 12 * 64 + 28);
        assert_eq!(e2e4.decode().unwrap().to_string(), "e2e4");
    }

    #[test]
    fn test_promotions_use_separate_blocks() {
        //! Each promotion piece has its own id and decodes back to the same piece
        let knight = MoveToken::from_uci_str("a7a8n").unwrap();
        let queen = MoveToken::from_uci_str("a7a8q").unwrap();
        let plain = MoveToken::from_uci_str("a7a8").unwrap();
        assert_ne!(knight, queen);
        assert_ne!(queen, plain);
        assert_eq!(queen.decode().unwrap().to_string(), "a7a8q");
        assert_eq!(knight.decode().unwrap().to_string(), "a7a8n");
        assert!((queen.0 as usize) < VOCAB_SIZE);
    }

    #[test]
    fn test_start_and_out_of_range_do_not_decode() {
        //! Only real move ids decode
        assert!(START_TOKEN.decode().is_none());
        assert!(MoveToken(VOCAB_SIZE as u32).decode().is_none());
        assert!(MoveToken::from_uci_str("0000").is_none());
    }
}
