//! Error types for the engine module
//!
//! `OracleError` covers everything that can go wrong talking to the prediction
//! service, including a calibration that makes the rating transform meaningless.
//! `PolicyError` is what move selection returns; `NoLegalMove` is fatal for the
//! session that hit it.

use thiserror::Error;

/// Errors from the move/rating oracle
#[derive(Error, Debug)]
pub enum OracleError {
    /// Request could not be sent or the response body was cut short
    #[error("Oracle request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Oracle answered with a non-success status
    #[error("Oracle returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response did not match the expected shape
    #[error("Oracle response could not be decoded: {message}")]
    Decode { message: String },

    /// Distribution length does not match the move vocabulary
    #[error("Oracle distribution has {got} entries, expected {expected}")]
    VocabularyMismatch { expected: usize, got: usize },

    /// Calibration constants are unusable
    #[error("Invalid oracle calibration: mean {mean}, scale {scale}")]
    InvalidCalibration { mean: f64, scale: f64 },

    /// The concurrency gate was closed while waiting for a permit
    #[error("Oracle concurrency gate closed")]
    GateClosed,
}

/// Errors from move selection
#[derive(Error, Debug)]
pub enum PolicyError {
    /// None of the sampled candidates is legal: oracle and encoding disagree
    #[error("No legal move among {tried} sampled candidates")]
    NoLegalMove { tried: usize },

    /// A move could not be expressed as a token
    #[error("Move `{uci}` has no token in the move vocabulary")]
    UnencodableMove { uci: String },

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Board(#[from] crate::game::BoardError),
}

/// Result type alias for oracle calls
pub type OracleResult<T> = Result<T, OracleError>;

/// Result type alias for move selection
pub type PolicyResult<T> = Result<T, PolicyError>;
