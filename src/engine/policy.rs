//! Move selection policy
//!
//! Turns one oracle prediction into one legal move:
//!
//! 1. Catch the encoded history up with the platform's move list
//! 2. Ask the oracle once for the next-ply distribution and rating latents
//! 3. Keep the `top_n` most probable tokens
//! 4. Renormalize, clamp entries under `p_threshold` to `p_floor`, renormalize again
//! 5. Draw a full weighted permutation of the kept tokens without replacement
//! 6. Commit the first candidate in that order that is legal on the board
//!
//! If no candidate is legal the oracle and the encoding disagree; selection
//! fails with [`PolicyError::NoLegalMove`] and nothing is submitted.

use crate::core::config::PolicyConfig;
use crate::engine::error::{PolicyError, PolicyResult};
use crate::engine::history::EncodedHistory;
use crate::engine::oracle::{Oracle, Prediction};
use crate::engine::rating::{self, RatingPair};
use crate::engine::token::MoveToken;
use rand::distr::weighted::WeightedIndex;
use rand::Rng;
use shakmaty::Move;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sampling constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub top_n: usize,
    pub p_threshold: f64,
    pub p_floor: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            p_threshold: 0.2,
            p_floor: 1e-8,
        }
    }
}

impl From<&PolicyConfig> for SamplingConfig {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            top_n: config.top_n,
            p_threshold: config.p_threshold,
            p_floor: config.p_floor,
        }
    }
}

/// A committed move and the rating estimate reported with it
#[derive(Debug, Clone, PartialEq)]
pub struct MoveChoice {
    pub mv: Move,
    pub uci: String,
    pub token: MoveToken,
    pub rating: RatingPair,
    /// Candidates rejected as illegal before this one
    pub rejected: usize,
}

/// Highest-probability tokens, best first; ties go to the lower token id
pub fn rank(prediction: &Prediction, top_n: usize) -> Vec<(MoveToken, f64)> {
    let mut ranked: Vec<(MoveToken, f64)> = prediction
        .moves
        .iter()
        .copied()
        .filter(|(_, p)| p.is_finite() && *p >= 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    ranked.truncate(top_n);
    ranked
}

/// Renormalize, clamp low entries to the floor, renormalize again
///
/// An all-zero input becomes uniform.
pub fn sharpen(probabilities: &[f64], threshold: f64, floor: f64) -> Vec<f64> {
    fn normalize(values: &mut [f64]) {
        let total: f64 = values.iter().sum();
        if total > 0.0 {
            values.iter_mut().for_each(|v| *v /= total);
        } else if !values.is_empty() {
            let uniform = 1.0 / values.len() as f64;
            values.iter_mut().for_each(|v| *v = uniform);
        }
    }

    let mut weights = probabilities.to_vec();
    normalize(&mut weights);
    for weight in weights.iter_mut() {
        if *weight < threshold {
            *weight = floor;
        }
    }
    normalize(&mut weights);
    weights
}

/// Weighted permutation of `0..weights.len()` without replacement
///
/// Indices are drawn one at a time from a [`WeightedIndex`], zeroing each drawn
/// weight, so earlier positions follow the weights. Zero weights go last in
/// index order.
pub fn sample_order<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Vec<usize> {
    let positive = weights.iter().filter(|w| **w > 0.0).count();
    let mut order = Vec::with_capacity(weights.len());

    if positive > 0 {
        match WeightedIndex::new(weights.iter().map(|w| w.max(0.0))) {
            Ok(mut distribution) => {
                while order.len() < positive {
                    let index = rng.sample(&distribution);
                    if order.contains(&index) {
                        continue;
                    }
                    order.push(index);
                    if order.len() < positive && distribution.update_weights(&[(index, &0.0)]).is_err() {
                        break;
                    }
                }
            }
            Err(e) => warn!("[POLICY] unusable sampling weights: {}", e),
        }
    }

    for index in 0..weights.len() {
        if !order.contains(&index) {
            order.push(index);
        }
    }
    order
}

/// Pick and commit a move from an existing prediction
///
/// The rating reported is the latest pair from the latents when the history
/// already holds a ply (an opponent move preceded this call), otherwise the
/// oracle's prior.
pub fn choose_from_prediction<R: Rng + ?Sized>(
    history: &mut EncodedHistory,
    prediction: &Prediction,
    sampling: SamplingConfig,
    default_rating: RatingPair,
    calibration: rating::Calibration,
    rng: &mut R,
) -> PolicyResult<MoveChoice> {
    let rating = if history.plies() > 0 {
        rating::latest_pair(&prediction.latent, calibration).unwrap_or(default_rating)
    } else {
        default_rating
    };

    let ranked = rank(prediction, sampling.top_n);
    let probabilities: Vec<f64> = ranked.iter().map(|(_, p)| *p).collect();
    let weights = sharpen(&probabilities, sampling.p_threshold, sampling.p_floor);
    let order = sample_order(&weights, rng);

    for (rejected, index) in order.iter().enumerate() {
        let token = ranked[*index].0;
        let Some(candidate) = token.decode() else {
            continue;
        };
        let Some(mv) = history.board().to_legal(candidate) else {
            debug!("[POLICY] candidate {} is illegal here", token);
            continue;
        };
        let uci = history.board().uci(mv);
        history.commit(mv, token)?;
        return Ok(MoveChoice {
            mv,
            uci,
            token,
            rating,
            rejected,
        });
    }

    warn!("[POLICY] none of {} candidates is legal", order.len());
    Err(PolicyError::NoLegalMove { tried: order.len() })
}

/// Move selection bound to an oracle
#[derive(Clone)]
pub struct MoveSelector {
    oracle: Arc<dyn Oracle>,
    sampling: SamplingConfig,
    default_rating: RatingPair,
}

impl MoveSelector {
    /// The default rating is read from the oracle once, here
    pub fn new(oracle: Arc<dyn Oracle>, sampling: SamplingConfig) -> Self {
        let default_rating = rating::default_pair(oracle.calibration());
        Self {
            oracle,
            sampling,
            default_rating,
        }
    }

    pub fn oracle(&self) -> &Arc<dyn Oracle> {
        &self.oracle
    }

    pub fn default_rating(&self) -> RatingPair {
        self.default_rating
    }

    /// Select a move for the position after `moves`
    ///
    /// Only valid when it is the bot's turn. On success the move is already
    /// appended to `history`.
    pub async fn select_move(&self, history: &mut EncodedHistory, moves: &[String]) -> PolicyResult<MoveChoice> {
        let report = history.sync_with(moves)?;
        if report.truncated > 0 || !report.skipped.is_empty() {
            debug!(
                "[POLICY] history sync truncated {} appended {} skipped {:?}",
                report.truncated, report.appended, report.skipped
            );
        }

        let prediction = self.oracle.predict(history.tokens()).await?;
        let mut rng = rand::rng();
        choose_from_prediction(
            history,
            &prediction,
            self.sampling,
            self.default_rating,
            self.oracle.calibration(),
            &mut rng,
        )
    }
}
