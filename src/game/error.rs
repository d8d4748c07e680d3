//! Error types for game module
//!
//! Board errors come from position setup and move parsing. Session errors cover
//! everything that can end a session early: protocol violations on the stream,
//! fatal move selection failures and platform failures the reconnect policy gave
//! up on.

use crate::engine::PolicyError;
use crate::networking::PlatformError;

/// Errors raised by the board adapter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// FEN could not be parsed or describes an impossible position
    #[error("Invalid FEN `{fen}`: {message}")]
    InvalidFen { fen: String, message: String },

    /// Move string is not UCI
    #[error("Unparseable move `{uci}`")]
    UnparseableMove { uci: String },

    /// Move is well-formed but not legal in the current position
    #[error("Illegal move `{uci}`")]
    IllegalMove { uci: String },

    /// Variant key the board adapter does not play
    #[error("Unsupported variant: {key}")]
    UnsupportedVariant { key: String },
}

/// Errors that end a session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The stream broke the NDJSON protocol
    #[error("Protocol violation: {message}")]
    Protocol { message: String },

    /// A stream unit was not valid JSON for any known event
    #[error("Malformed stream unit: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Board(#[from] BoardError),

    /// Move selection failed fatally
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Result type alias for board operations
pub type BoardResult<T> = Result<T, BoardError>;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
