//! High score leaderboard system
//!
//! Persisted to LocalStorage on the web, in memory natively. Tracks the top
//! 10 runs.

use serde::{Deserialize, Serialize};

use crate::sim::{LevelProgress, Outcome};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// One finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Level the run ended on
    pub level: u32,
    /// Frogs brought home over the whole run
    pub frogs_saved: u32,
    pub outcome: Outcome,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

impl HighScoreEntry {
    pub fn from_run(progress: &LevelProgress, outcome: Outcome, timestamp: f64) -> Self {
        Self {
            score: progress.score,
            level: progress.current_level,
            frogs_saved: progress.frogs_saved,
            outcome,
            timestamp,
        }
    }

    /// Higher score first, then more frogs saved; full ties keep the older run ahead
    fn ranks_above(&self, other: &HighScoreEntry) -> bool {
        (self.score, self.frogs_saved) > (other.score, other.frogs_saved)
    }
}

/// Leaderboard, best run first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "frog_crossing_highscores";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A run with no points never makes the board
    pub fn qualifies(&self, entry: &HighScoreEntry) -> bool {
        if entry.score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|last| entry.ranks_above(last))
    }

    /// Insert a finished run; returns its 1-indexed rank if it made the board
    pub fn add(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(&entry) {
            return None;
        }

        let pos = self
            .entries
            .iter()
            .position(|e| entry.ranks_above(e))
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Runs that cleared every level
    pub fn victories(&self) -> impl Iterator<Item = &HighScoreEntry> {
        self.entries.iter().filter(|e| e.outcome == Outcome::Victory)
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str::<HighScores>(&json) {
                    Ok(scores) => {
                        log::info!("Loaded {} high scores", scores.entries.len());
                        return scores;
                    }
                    Err(e) => log::warn!("Discarding unreadable high scores: {}", e),
                }
            }
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                match storage.set_item(Self::STORAGE_KEY, &json) {
                    Ok(()) => log::info!("High scores saved ({} entries)", self.entries.len()),
                    Err(e) => log::warn!("Failed to save high scores: {:?}", e),
                }
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        log::debug!("High scores kept in memory ({} entries)", self.entries.len());
    }
}
