//! Move/rating oracle
//!
//! The oracle is an external prediction service. Given the encoded history it
//! returns a probability for every token of the move vocabulary plus a whitened
//! rating estimate per position. It is stateless from the bot's side and may be
//! called from many sessions at once.
//!
//! - [`Oracle`] is the contract the policy depends on
//! - [`HttpOracle`] talks JSON to the service over `reqwest`
//! - [`BoundedOracle`] caps in-flight predictions with a semaphore
//!
//! # Wire Format
//!
//! ```text
//! GET  {base}/calibration  ->  {"mean": 1500.0, "scale": 350.0}
//! POST {base}/predict      <-  {"tokens": [0, 797, ...]}
//!                          ->  {"probabilities": [..VOCAB_SIZE..], "ratings": [[m, s], ...]}
//! ```

use crate::engine::error::{OracleError, OracleResult};
use crate::engine::rating::{Calibration, LatentRating};
use crate::engine::token::{MoveToken, VOCAB_SIZE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

/// One oracle answer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    /// `(token, probability)` for the next ply; tokens missing here have probability zero
    pub moves: Vec<(MoveToken, f64)>,
    /// One whitened rating estimate per position of the history
    pub latent: Vec<LatentRating>,
}

impl Prediction {
    /// Build from a dense, full-vocabulary distribution
    pub fn from_dense(probabilities: &[f64], latent: Vec<LatentRating>) -> OracleResult<Self> {
        if probabilities.len() != VOCAB_SIZE {
            return Err(OracleError::VocabularyMismatch {
                expected: VOCAB_SIZE,
                got: probabilities.len(),
            });
        }
        let moves = probabilities
            .iter()
            .enumerate()
            .filter(|(_, p)| **p > 0.0)
            .map(|(id, p)| (MoveToken(id as u32), *p))
            .collect();
        Ok(Self { moves, latent })
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Rating calibration, fixed for the lifetime of the oracle
    fn calibration(&self) -> Calibration;

    async fn predict(&self, history: &[MoveToken]) -> OracleResult<Prediction>;
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    tokens: &'a [MoveToken],
}

#[derive(Deserialize)]
struct PredictResponse {
    probabilities: Vec<f64>,
    #[serde(default)]
    ratings: Vec<(f64, f64)>,
}

#[derive(Deserialize)]
struct CalibrationResponse {
    mean: f64,
    scale: f64,
}

/// Oracle served over HTTP
#[derive(Debug, Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    base: String,
    calibration: Calibration,
}

impl HttpOracle {
    /// Connect and fetch the calibration
    ///
    /// Fails if the service is unreachable or reports unusable constants, so a
    /// bad model never gets as far as a game.
    pub async fn connect(base: &str, timeout: Duration) -> OracleResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base = base.trim_end_matches('/').to_string();

        let response = client.get(format!("{base}/calibration")).send().await?;
        let raw: CalibrationResponse = decode(response).await?;
        let calibration = Calibration::new(raw.mean, raw.scale)?;

        debug!("[ORACLE] connected to {} (M={}, S={})", base, calibration.mean, calibration.scale);
        Ok(Self {
            client,
            base,
            calibration,
        })
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> OracleResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(OracleError::Http {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| OracleError::Decode {
        message: e.to_string(),
    })
}

#[async_trait]
impl Oracle for HttpOracle {
    fn calibration(&self) -> Calibration {
        self.calibration
    }

    async fn predict(&self, history: &[MoveToken]) -> OracleResult<Prediction> {
        let response = self
            .client
            .post(format!("{}/predict", self.base))
            .json(&PredictRequest { tokens: history })
            .send()
            .await?;
        let raw: PredictResponse = decode(response).await?;
        let latent = raw
            .ratings
            .into_iter()
            .map(|(mean, scale)| LatentRating { mean, scale })
            .collect();
        Prediction::from_dense(&raw.probabilities, latent)
    }
}

/// Limits how many predictions run at once across all sessions
pub struct BoundedOracle {
    inner: Arc<dyn Oracle>,
    permits: Semaphore,
}

impl BoundedOracle {
    pub fn new(inner: Arc<dyn Oracle>, max_concurrent_calls: usize) -> Self {
        Self {
            inner,
            permits: Semaphore::new(max_concurrent_calls.max(1)),
        }
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl Oracle for BoundedOracle {
    fn calibration(&self) -> Calibration {
        self.inner.calibration()
    }

    async fn predict(&self, history: &[MoveToken]) -> OracleResult<Prediction> {
        let _permit = self.permits.acquire().await.map_err(|_| OracleError::GateClosed)?;
        self.inner.predict(history).await
    }
}
