//! Networking module - everything that talks to the game platform
//!
//! - `model` - serde types for stream events and REST payloads
//! - `stream` - NDJSON line framing over a byte stream
//! - `client` - the [`Platform`] trait and [`LichessClient`]

pub mod client;
pub mod model;
pub mod stream;

pub use client::{ClientSettings, LichessClient, LineStream, Platform, PlatformError, PlatformResult};
pub use model::{ChallengeEvent, ChallengeInfo, GameFull, GameStateEvent, StreamEvent};
pub use stream::ndjson_lines;
