//! Rating transform
//!
//! The oracle predicts the players' ratings in a whitened space: one
//! `(mean, scale)` pair per position of the encoded history. This module maps
//! them back into rating units with the oracle's calibration constants
//! `M` (global mean) and `S` (global scale):
//!
//! ```text
//! mean     = latent.mean * S + M
//! variance = (sqrt(latent.scale) * S)^2
//! ```
//!
//! Entries alternate between the sides. Which of the last two entries belongs to
//! White depends only on how many entries there are; [`side_assignment`] is the
//! single place that convention lives.

use crate::engine::error::{OracleError, OracleResult, PolicyResult};
use crate::engine::history::EncodedHistory;
use crate::engine::oracle::Oracle;
use crate::game::board::Variant;
use crate::game::error::BoardError;
use serde::{Deserialize, Serialize};

/// Calibration constants of the oracle's rating head
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub mean: f64,
    pub scale: f64,
}

impl Calibration {
    /// Reject constants that cannot destandardize anything
    pub fn new(mean: f64, scale: f64) -> OracleResult<Self> {
        if !mean.is_finite() || !scale.is_finite() || scale <= 0.0 {
            return Err(OracleError::InvalidCalibration { mean, scale });
        }
        Ok(Self { mean, scale })
    }
}

/// One whitened prediction as emitted by the oracle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatentRating {
    pub mean: f64,
    pub scale: f64,
}

/// Rating in real units; serialized as `{"m": .., "s": ..}` where `s` is the variance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingEstimate {
    #[serde(rename = "m")]
    pub mean: f64,
    #[serde(rename = "s")]
    pub variance: f64,
}

/// Latest estimate for each side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingPair {
    #[serde(rename = "weloParams")]
    pub white: RatingEstimate,
    #[serde(rename = "beloParams")]
    pub black: RatingEstimate,
}

/// Per-ply estimates for a whole game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSeries {
    pub white: Vec<RatingEstimate>,
    pub black: Vec<RatingEstimate>,
}

pub fn destandardize(latent: LatentRating, calibration: Calibration) -> RatingEstimate {
    let deviation = latent.scale.max(0.0).sqrt() * calibration.scale;
    RatingEstimate {
        mean: latent.mean * calibration.scale + calibration.mean,
        variance: deviation * deviation,
    }
}

/// The oracle's prior: mean `M`, variance `S^2`
pub fn default_estimate(calibration: Calibration) -> RatingEstimate {
    RatingEstimate {
        mean: calibration.mean,
        variance: calibration.scale * calibration.scale,
    }
}

pub fn default_pair(calibration: Calibration) -> RatingPair {
    let prior = default_estimate(calibration);
    RatingPair {
        white: prior,
        black: prior,
    }
}

/// Offsets from the end of the latent series for `(white, black)`
///
/// Even counts put White second-to-last; odd counts put White last.
pub fn side_assignment(count: usize) -> (isize, isize) {
    if count % 2 == 0 { (-2, -1) } else { (-1, -2) }
}

/// Latest pair from a latent series, `None` with fewer than two entries
pub fn latest_pair(latent: &[LatentRating], calibration: Calibration) -> Option<RatingPair> {
    let count = latent.len();
    if count < 2 {
        return None;
    }
    let (white, black) = side_assignment(count);
    let at = |offset: isize| latent[(count as isize + offset) as usize];
    Some(RatingPair {
        white: destandardize(at(white), calibration),
        black: destandardize(at(black), calibration),
    })
}

/// Whole-game series with the prior prepended for both sides
///
/// After prepending, even positions belong to White and odd ones to Black.
pub fn analyze_full(latent: &[LatentRating], calibration: Calibration) -> RatingSeries {
    let prior = default_estimate(calibration);
    let all = [prior, prior]
        .into_iter()
        .chain(latent.iter().map(|l| destandardize(*l, calibration)));

    let mut series = RatingSeries::default();
    for (index, estimate) in all.enumerate() {
        if index % 2 == 0 {
            series.white.push(estimate);
        } else {
            series.black.push(estimate);
        }
    }
    series
}

/// Encode a finished transcript, query the oracle once and return the full series
///
/// Unlike a live game, every move of the transcript must be legal.
pub async fn analyze_transcript(
    oracle: &dyn Oracle,
    variant: Variant,
    initial_fen: Option<&str>,
    moves: &[String],
) -> PolicyResult<RatingSeries> {
    let mut history = EncodedHistory::new(variant, initial_fen)?;
    let report = history.sync_with(moves)?;
    if let Some(uci) = report.skipped.first() {
        return Err(BoardError::IllegalMove { uci: uci.clone() }.into());
    }
    let prediction = oracle.predict(history.tokens()).await?;
    Ok(analyze_full(&prediction.latent, oracle.calibration()))
}
