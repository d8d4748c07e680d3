//! Engine module - move vocabulary, oracle access, move selection and ratings
//!
//! # Module Organization
//!
//! - `token` - [`MoveToken`] vocabulary shared with the oracle
//! - `history` - [`EncodedHistory`], the per-session token sequence and its board
//! - `oracle` - the [`Oracle`] contract, the HTTP client and the concurrency gate
//! - `policy` - [`MoveSelector`]: top-N truncation, sharpening and retry-until-legal sampling
//! - `rating` - destandardization of the oracle's rating latents
//! - `error` - oracle and policy errors

pub mod error;
pub mod history;
pub mod oracle;
pub mod policy;
pub mod rating;
pub mod token;

pub use error::{OracleError, OracleResult, PolicyError, PolicyResult};
pub use history::{EncodedHistory, SyncReport};
pub use oracle::{BoundedOracle, HttpOracle, Oracle, Prediction};
pub use policy::{MoveChoice, MoveSelector, SamplingConfig};
pub use rating::{
    analyze_full, analyze_transcript, side_assignment, Calibration, LatentRating, RatingEstimate, RatingPair,
    RatingSeries,
};
pub use token::{MoveToken, START_TOKEN, VOCAB_SIZE};
