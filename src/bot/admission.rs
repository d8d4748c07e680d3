//! Admission control
//!
//! The only state shared between sessions: the set of game ids currently being
//! played. Admitting a game inserts its id under a single lock, after checking
//! for duplicates and for the concurrency ceiling. The returned
//! [`AdmissionSlot`] removes the id again when dropped, so a session that ends
//! normally, fails, times out or panics always frees its slot.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("capacity exceeded ({limit} games already running)")]
    CapacityExceeded { limit: usize },

    #[error("game {game_id} is already active")]
    AlreadyActive { game_id: String },
}

/// Bounded set of active game ids
#[derive(Debug)]
pub struct AdmissionController {
    limit: usize,
    active: Mutex<HashSet<String>>,
}

impl AdmissionController {
    pub fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            limit,
            active: Mutex::new(HashSet::new()),
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Claim a slot for `game_id`
    pub fn admit(self: &Arc<Self>, game_id: &str) -> Result<AdmissionSlot, AdmissionError> {
        let mut active = self.active.lock();
        if active.contains(game_id) {
            return Err(AdmissionError::AlreadyActive {
                game_id: game_id.to_string(),
            });
        }
        if active.len() >= self.limit {
            return Err(AdmissionError::CapacityExceeded { limit: self.limit });
        }
        active.insert(game_id.to_string());
        info!("[ADMISSION] admitted {} ({}/{})", game_id, active.len(), self.limit);

        Ok(AdmissionSlot {
            controller: Arc::clone(self),
            game_id: game_id.to_string(),
        })
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    pub fn is_active(&self, game_id: &str) -> bool {
        self.active.lock().contains(game_id)
    }

    /// Snapshot of active ids, sorted
    pub fn active_games(&self) -> Vec<String> {
        let mut games: Vec<String> = self.active.lock().iter().cloned().collect();
        games.sort();
        games
    }

    fn release(&self, game_id: &str) {
        let mut active = self.active.lock();
        if active.remove(game_id) {
            debug!("[ADMISSION] released {} ({}/{})", game_id, active.len(), self.limit);
        }
    }
}

/// An occupied slot; dropping it frees the slot
#[derive(Debug)]
pub struct AdmissionSlot {
    controller: Arc<AdmissionController>,
    game_id: String,
}

impl AdmissionSlot {
    pub fn game_id(&self) -> &str {
        &self.game_id
    }
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        self.controller.release(&self.game_id);
    }
}
