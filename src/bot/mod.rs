//! Bot module - admission, challenge triage and the session loop
//!
//! - `admission` - [`AdmissionController`] bounds concurrent sessions
//! - `challenge` - accept/decline decisions for inbound challenges
//! - `runner` - [`play_game`] drives one session over the game stream

pub mod admission;
pub mod challenge;
pub mod runner;

pub use admission::{AdmissionController, AdmissionError, AdmissionSlot};
pub use challenge::{handle_challenge, triage, Challenge, DeclineReason, Verdict};
pub use runner::{play_game, spawn_session, SessionContext, SessionEnd, SessionReport, SessionTiming};
