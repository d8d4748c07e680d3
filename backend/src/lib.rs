//! Bot server: the HTTP surface that dispatches game sessions
//!
//! - `api` - axum router and handlers
//! - `server` - building the shared state from a [`mimicbot::core::BotConfig`]

pub mod api;
pub mod server;
