//! Bot configuration
//!
//! Loads [`BotConfig`] from a JSON file and layers environment overrides on top.
//!
//! # File Location
//!
//! The first of these that exists wins:
//!
//! 1. An explicit path handed to [`BotConfig::load`]
//! 2. `$MIMICBOT_CONFIG`
//! 3. `config.json` in the user's configuration directory
//!    (e.g. `~/.config/mimicbot/config.json`)
//! 4. `config.json` in the working directory
//!
//! A `.env` file is read first, so `MIMICBOT_TOKEN` and `MIMICBOT_URL` can live
//! there instead of in the JSON.
//!
//! # Durations
//!
//! Every duration field is a human-readable string (`"20s"`, `"30m"`, `"250ms"`).

use crate::core::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Config filename
const CONFIG_FILENAME: &str = "config.json";

/// Environment variable naming an explicit config path
pub const CONFIG_PATH_ENV: &str = "MIMICBOT_CONFIG";
/// Environment variable overriding the API token
pub const TOKEN_ENV: &str = "MIMICBOT_TOKEN";
/// Environment variable overriding the platform base URL
pub const URL_ENV: &str = "MIMICBOT_URL";

mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

/// Top-level configuration for the bot process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Personal API token of the bot account
    pub token: String,

    /// Base URL of the game platform
    pub url: String,

    /// How long an opponent may take over the first move before the game is aborted
    #[serde(with = "duration_str")]
    pub abort_time: Duration,

    /// Pause after each submitted move
    #[serde(with = "duration_str")]
    pub rate_limiting_delay: Duration,

    /// Wall-clock ceiling for one session task
    #[serde(with = "duration_str")]
    pub session_time_limit: Duration,

    /// Slack added to the side-to-move's clock when computing the terminate deadline
    #[serde(with = "duration_str")]
    pub terminate_grace: Duration,

    /// Delay before reopening a dropped game stream
    #[serde(with = "duration_str")]
    pub reconnect_delay: Duration,

    pub challenge: ChallengePolicy,
    pub engine: PolicyConfig,
    pub server: ServerConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            url: "https://lichess.org/".to_string(),
            abort_time: Duration::from_secs(20),
            rate_limiting_delay: Duration::ZERO,
            session_time_limit: Duration::from_secs(30 * 60),
            terminate_grace: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(1),
            challenge: ChallengePolicy::default(),
            engine: PolicyConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Which inbound challenges the bot accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengePolicy {
    /// Maximum number of games played at once
    pub concurrency: usize,
    /// Accepted variant keys (`standard`, `chess960`, `fromPosition`)
    pub variants: Vec<String>,
    /// Accepted speed names (`bullet`, `blitz`, `rapid`, `classical`, `correspondence`)
    pub time_controls: Vec<String>,
    /// Accepted modes (`casual`, `rated`)
    pub modes: Vec<String>,
    /// Bounds on the initial clock, in seconds
    pub min_base: u64,
    pub max_base: u64,
    /// Bounds on the increment, in seconds
    pub min_increment: u64,
    pub max_increment: u64,
    /// Opponent rating band
    pub min_rating: Option<u32>,
    pub max_rating: Option<u32>,
    /// Whether challenges from other bots are accepted
    pub accept_bot: bool,
    /// Only accept challenges from other bots
    pub only_bot: bool,
}

impl Default for ChallengePolicy {
    fn default() -> Self {
        Self {
            concurrency: 1,
            variants: vec!["standard".to_string()],
            time_controls: ["bullet", "blitz", "rapid", "classical"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            modes: vec!["casual".to_string(), "rated".to_string()],
            min_base: 0,
            max_base: u64::MAX,
            min_increment: 0,
            max_increment: 180,
            min_rating: None,
            max_rating: None,
            accept_bot: true,
            only_bot: false,
        }
    }
}

/// Move selection and oracle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Number of highest-probability candidates kept before sampling
    pub top_n: usize,
    /// Candidates below this renormalized probability are clamped to `p_floor`
    pub p_threshold: f64,
    /// Probability mass left on clamped candidates
    pub p_floor: f64,
    /// Base URL of the move/rating prediction service
    pub oracle_url: String,
    #[serde(with = "duration_str")]
    pub oracle_timeout: Duration,
    /// In-flight predictions allowed across all sessions
    pub max_concurrent_calls: usize,
    /// Extra attempts for a move submission that failed in transport
    pub max_retries: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            p_threshold: 0.2,
            p_floor: 1e-8,
            oracle_url: "http://127.0.0.1:9000/".to_string(),
            oracle_timeout: Duration::from_secs(10),
            max_concurrent_calls: 4,
            max_retries: 2,
        }
    }
}

/// HTTP surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Resolve the config file path
///
/// Falls back to a local `config.json` if no other candidate exists.
fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    if let Some(proj_dirs) = ProjectDirs::from("org", "mimicbot", "mimicbot") {
        let candidate = proj_dirs.config_dir().join(CONFIG_FILENAME);
        if candidate.exists() {
            return candidate;
        }
    }
    PathBuf::from(CONFIG_FILENAME)
}

impl BotConfig {
    /// Load, override from the environment, and validate.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        dotenvy::dotenv().ok();

        let path = resolve_config_path(explicit);
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_json_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;

        info!("[CONFIG] Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse without touching the environment or validating
    pub fn from_json_str(contents: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            debug!("[CONFIG] Token taken from {}", TOKEN_ENV);
            self.token = token;
        }
        if let Ok(url) = std::env::var(URL_ENV) {
            debug!("[CONFIG] URL taken from {}", URL_ENV);
            self.url = url;
        }
    }

    /// Reject values the bot cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                message: message.into(),
            }
        }

        if self.token.trim().is_empty() {
            return Err(invalid("token", "must not be empty"));
        }
        if self.challenge.concurrency == 0 {
            return Err(invalid("challenge.concurrency", "must be at least 1"));
        }
        if self.engine.top_n == 0 {
            return Err(invalid("engine.top_n", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.engine.p_threshold) {
            return Err(invalid("engine.p_threshold", "must lie in [0, 1]"));
        }
        if !(self.engine.p_floor > 0.0 && self.engine.p_floor <= 1.0) {
            return Err(invalid("engine.p_floor", "must lie in (0, 1]"));
        }
        if self.engine.max_concurrent_calls == 0 {
            return Err(invalid("engine.max_concurrent_calls", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid() -> BotConfig {
        BotConfig {
            token: "lip_test".to_string(),
            ..BotConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_documented_values() {
        //! Policy constants default to top-10 / 0.2 threshold / 1e-8 floor
        let config = BotConfig::default();
        assert_eq!(config.engine.top_n, 10);
        assert_eq!(config.engine.p_threshold, 0.2);
        assert_eq!(config.engine.p_floor, 1e-8);
        assert_eq!(config.terminate_grace, Duration::from_secs(60));
        assert_eq!(config.session_time_limit, Duration::from_secs(1800));
        assert_eq!(config.challenge.concurrency, 1);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        //! Missing fields fall back to defaults and durations parse from strings
        let config = BotConfig::from_json_str(
            r#"{"token": "abc", "abort_time": "45s", "engine": {"top_n": 5}}"#,
        )
        .expect("Should parse");

        assert_eq!(config.token, "abc");
        assert_eq!(config.abort_time, Duration::from_secs(45));
        assert_eq!(config.engine.top_n, 5);
        assert_eq!(config.engine.p_threshold, 0.2);
        assert_eq!(config.url, "https://lichess.org/");
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        //! A malformed duration string is a serialization error, not a silent default
        let result = BotConfig::from_json_str(r#"{"abort_time": "soon"}"#);
        assert!(matches!(result, Err(ConfigError::Serialization(_))));
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        //! An unauthenticated bot cannot play
        let config = BotConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "token", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_policy() {
        //! Sampling constants outside their ranges are fatal
        let mut config = valid();
        config.engine.p_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.engine.p_floor = 0.0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.engine.top_n = 0;
        assert!(config.validate().is_err());

        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_load_from_explicit_path() {
        //! An explicit path is read and validated
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"token": "from-file", "challenge": {{"concurrency": 3}}}}"#)
            .expect("write config");

        let config = BotConfig::load(Some(file.path())).expect("Should load");
        assert_eq!(config.challenge.concurrency, 3);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        //! A missing file surfaces the path in the error
        let result = BotConfig::load(Some(Path::new("/definitely/not/here.json")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_round_trip_serialization_keeps_durations_readable() {
        //! Durations serialize as humantime strings
        let json = serde_json::to_string(&valid()).expect("Should serialize");
        assert!(json.contains("\"abort_time\":\"20s\""));
    }
}
