//! Core module - process-wide infrastructure shared by every session
//!
//! Holds the pieces every other module leans on but that carry no game logic of
//! their own:
//!
//! - [`config`] - the [`BotConfig`] loaded from `config.json` plus environment overrides
//! - [`error`] - configuration error type and result alias
//! - [`logging`] - `tracing` subscriber installation
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use mimicbot::core::{init_tracing, BotConfig};
//!
//! init_tracing("info");
//! let config = BotConfig::load(None)?;
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BotConfig, ChallengePolicy, PolicyConfig, ServerConfig};
pub use error::{ConfigError, ConfigResult};
pub use logging::init_tracing;
