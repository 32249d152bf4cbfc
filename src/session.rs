//! Per-session player context
//!
//! Passed by reference to whatever needs it instead of living as a global.

use serde::{Deserialize, Serialize};

/// Host identifier for the chosen skier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub u32);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    /// Whether audio is enabled
    pub audio_enabled: bool,
    /// Character picked on the select screen
    pub selected_character: Option<CharacterId>,
    /// Score for the current run; cleared on a new game
    pub session_score: u64,
    /// Best score achieved on this device
    pub device_high_score: u64,
    /// Runs started since launch
    pub games_started: u32,
}

impl SessionContext {
    pub fn new(audio_enabled: bool) -> Self {
        Self {
            audio_enabled,
            ..Default::default()
        }
    }

    /// Called when a new game begins
    pub fn reset(&mut self) {
        self.session_score = 0;
        self.games_started += 1;
    }

    pub fn add_score(&mut self, points: u64) {
        self.session_score = self.session_score.saturating_add(points);
    }

    /// Record the finished run. Returns true on a new device best.
    pub fn record_score(&mut self) -> bool {
        if self.session_score > self.device_high_score {
            log::info!(
                "New device high score: {} (was {})",
                self.session_score,
                self.device_high_score
            );
            self.device_high_score = self.session_score;
            return true;
        }
        false
    }
}
