//! mimicbot - a bot that plays on a live game platform with a human-like move oracle
//!
//! # Module Organization
//!
//! - `core` - configuration, errors, logging
//! - `game` - board adapter and the per-game session state machine
//! - `engine` - move vocabulary, oracle client, move selection policy, rating transform
//! - `networking` - platform wire types, NDJSON framing, platform client
//! - `bot` - admission control, challenge triage, the async session loop

pub mod bot;
pub mod core;
pub mod engine;
pub mod game;
pub mod networking;
