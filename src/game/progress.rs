//! Best score and stars per level.
//!
//! Saved as JSON in the user's data directory. A missing or unreadable
//! file starts fresh.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelRecord {
    pub best_score: u32,
    pub stars: u8,
}

#[derive(Resource, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub levels: BTreeMap<u32, LevelRecord>,
}

impl LevelProgress {
    pub fn record_for(&self, level: u32) -> Option<LevelRecord> {
        self.levels.get(&level).copied()
    }

    /// Remember a finished level. Returns true if anything improved.
    ///
    /// Score and stars are kept independently, so a later play with more
    /// stars but a lower score still upgrades the stars.
    pub fn record(&mut self, level: u32, score: u32, stars: u8) -> bool {
        let entry = self.levels.entry(level).or_default();
        let improved = score > entry.best_score || stars > entry.stars;
        entry.best_score = entry.best_score.max(score);
        entry.stars = entry.stars.max(stars);
        improved
    }

    /// Total stars over every level, for unlocking.
    pub fn total_stars(&self) -> u32 {
        self.levels.values().map(|r| u32::from(r.stars)).sum()
    }

    fn file_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("hexpop").join("progress.json"))
    }

    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for level progress");
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No progress file found at {:?}, starting fresh", path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(progress) => {
                    info!("Loaded level progress from {:?}", path);
                    progress
                }
                Err(e) => {
                    warn!("Failed to parse level progress: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read level progress file: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for saving level progress");
            return;
        };
        self.save_to(&path);
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("Failed to create progress directory: {}", e);
            return;
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => match fs::write(path, json) {
                Ok(()) => info!("Saved level progress to {:?}", path),
                Err(e) => warn!("Failed to write level progress: {}", e),
            },
            Err(e) => warn!("Failed to serialize level progress: {}", e),
        }
    }
}

pub(super) fn load_progress(mut progress: ResMut<LevelProgress>) {
    *progress = LevelProgress::load();
}
