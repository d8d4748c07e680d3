//! Game platform client
//!
//! [`Platform`] is the set of remote calls a session and the challenge handler
//! make. [`LichessClient`] implements it over HTTP with `reqwest`; tests swap in
//! an in-memory implementation.
//!
//! Every call can fail in transport. [`PlatformError::is_transport`] tells the
//! reconnect policy which failures are worth riding out.

use crate::networking::model::{Account, OngoingGames};
use crate::networking::stream::ndjson_lines;
use async_trait::async_trait;
use futures::stream::{BoxStream, TryStreamExt};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from platform calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Read or connect timed out
    #[error("Platform request timed out: {0}")]
    Timeout(String),

    /// Connection refused, reset or otherwise unusable
    #[error("Platform connection failed: {0}")]
    Connection(String),

    /// Response body broke off mid-stream
    #[error("Platform response body failed: {0}")]
    Body(String),

    /// Non-success status
    #[error("Platform returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response did not decode
    #[error("Platform response could not be decoded: {0}")]
    Decode(String),
}

impl PlatformError {
    /// Failures the reconnect policy treats as transient
    pub fn is_transport(&self) -> bool {
        !matches!(self, PlatformError::Decode(_))
    }

    /// Failures a request may be repeated after
    ///
    /// Narrower than [`is_transport`](Self::is_transport): a 4xx answer such as
    /// "not your turn" is final, except for rate limiting.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlatformError::Timeout(_) | PlatformError::Connection(_) | PlatformError::Body(_) => true,
            PlatformError::Http { status, .. } => *status >= 500 || *status == 429,
            PlatformError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PlatformError::Timeout(e.to_string())
        } else if e.is_body() {
            PlatformError::Body(e.to_string())
        } else if e.is_decode() {
            PlatformError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            PlatformError::Http {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            PlatformError::Connection(e.to_string())
        }
    }
}

/// Result type alias for platform calls
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Lines of a game stream; empty strings are heartbeats
pub type LineStream = BoxStream<'static, PlatformResult<String>>;

#[async_trait]
pub trait Platform: Send + Sync {
    /// The authenticated account
    async fn account(&self) -> PlatformResult<Account>;

    /// Open the NDJSON stream of one game
    async fn game_stream(&self, game_id: &str) -> PlatformResult<LineStream>;

    async fn make_move(&self, game_id: &str, uci: &str) -> PlatformResult<()>;

    async fn chat(&self, game_id: &str, room: &str, text: &str) -> PlatformResult<()>;

    async fn abort(&self, game_id: &str) -> PlatformResult<()>;

    async fn resign(&self, game_id: &str) -> PlatformResult<()>;

    /// Ids of the games the account is currently playing
    async fn ongoing_games(&self) -> PlatformResult<Vec<String>>;

    async fn accept_challenge(&self, challenge_id: &str) -> PlatformResult<()>;

    /// Decline with one of the platform's reason keys
    async fn decline_challenge(&self, challenge_id: &str, reason: &str) -> PlatformResult<()>;

    /// Turn the account into a bot account; irreversible on the platform
    async fn upgrade_to_bot(&self) -> PlatformResult<()>;
}

/// Settings for [`LichessClient`]
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub token: String,
    /// Extra attempts for a move submission that failed with a retryable error
    pub max_retries: u32,
    /// Pause between move submission attempts
    pub retry_delay: Duration,
    /// Longest silence tolerated on any read, streams included
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ClientSettings {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            token: token.to_string(),
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
            read_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the platform's bot API
#[derive(Debug, Clone)]
pub struct LichessClient {
    client: reqwest::Client,
    base: String,
    token: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl LichessClient {
    pub fn new(settings: ClientSettings) -> PlatformResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mimicbot/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .build()?;
        Ok(Self {
            client,
            base: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token,
            max_retries: settings.max_retries,
            retry_delay: settings.retry_delay,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> PlatformResult<reqwest::Response> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn post(&self, path: &str) -> PlatformResult<()> {
        self.send(self.client.post(self.url(path))).await.map(|_| ())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> PlatformResult<T> {
        let response = self.send(self.client.get(self.url(path))).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| PlatformError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Platform for LichessClient {
    async fn account(&self) -> PlatformResult<Account> {
        self.get_json("api/account").await
    }

    async fn game_stream(&self, game_id: &str) -> PlatformResult<LineStream> {
        let path = format!("api/bot/game/stream/{game_id}");
        let response = self.send(self.client.get(self.url(&path))).await?;
        debug!("[PLATFORM] stream opened for {}", game_id);
        Ok(ndjson_lines(response.bytes_stream().map_err(PlatformError::from)))
    }

    async fn make_move(&self, game_id: &str, uci: &str) -> PlatformResult<()> {
        let path = format!("api/bot/game/{game_id}/move/{uci}");
        let mut attempt = 0;
        loop {
            match self.post(&path).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("[PLATFORM] move {} in {} failed ({}), retry {}", uci, game_id, e, attempt);
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn chat(&self, game_id: &str, room: &str, text: &str) -> PlatformResult<()> {
        let request = self
            .client
            .post(self.url(&format!("api/bot/game/{game_id}/chat")))
            .form(&[("room", room), ("text", text)]);
        self.send(request).await.map(|_| ())
    }

    async fn abort(&self, game_id: &str) -> PlatformResult<()> {
        info!("[PLATFORM] aborting {}", game_id);
        self.post(&format!("api/bot/game/{game_id}/abort")).await
    }

    async fn resign(&self, game_id: &str) -> PlatformResult<()> {
        info!("[PLATFORM] resigning {}", game_id);
        self.post(&format!("api/bot/game/{game_id}/resign")).await
    }

    async fn ongoing_games(&self) -> PlatformResult<Vec<String>> {
        let games: OngoingGames = self.get_json("api/account/playing").await?;
        Ok(games.now_playing.into_iter().map(|g| g.game_id).collect())
    }

    async fn accept_challenge(&self, challenge_id: &str) -> PlatformResult<()> {
        self.post(&format!("api/challenge/{challenge_id}/accept")).await
    }

    async fn decline_challenge(&self, challenge_id: &str, reason: &str) -> PlatformResult<()> {
        let request = self
            .client
            .post(self.url(&format!("api/challenge/{challenge_id}/decline")))
            .form(&[("reason", reason)]);
        self.send(request).await.map(|_| ())
    }

    async fn upgrade_to_bot(&self) -> PlatformResult<()> {
        self.post("api/bot/account/upgrade").await
    }
}
