//! Error types for core module
//!
//! Configuration loading is the only fallible core operation. Every variant is
//! fatal at startup: no session may run against a half-valid configuration.

use thiserror::Error;

/// Errors that can occur while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file I/O error
    #[error("Config I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config serialization/deserialization error
    #[error("Config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A field holds a value the bot cannot run with
    #[error("Invalid config field `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Result type alias for core operations
pub type ConfigResult<T> = Result<T, ConfigError>;
