//! Game state - score, collected items and the goals that read them.
//!
//! Win: every level goal is complete.
//! Lose: no shots left while a goal is still open.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bubble::{BubbleColor, CollectableKind};

/// Score and collected counters for one play of a level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    pub score: u32,
    pub bubbles_collected: BTreeMap<BubbleColor, u32>,
    pub leaves_collected: u32,
    pub collectables_collected: BTreeMap<CollectableKind, u32>,
}

impl GameState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn bubbles(&self, color: BubbleColor) -> u32 {
        self.bubbles_collected.get(&color).copied().unwrap_or(0)
    }

    pub fn collectables(&self, kind: CollectableKind) -> u32 {
        self.collectables_collected.get(&kind).copied().unwrap_or(0)
    }

    pub(super) fn add_bubbles(&mut self, color: BubbleColor, count: u32) {
        *self.bubbles_collected.entry(color).or_default() += count;
    }

    pub(super) fn add_collectables(&mut self, kind: CollectableKind, count: u32) {
        *self.collectables_collected.entry(kind).or_default() += count;
    }
}

/// A condition the player has to meet to finish a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LevelGoal {
    CollectBubbles { color: BubbleColor, amount: u32 },
    CollectLeaves { amount: u32 },
    CollectCollectables { kind: CollectableKind, amount: u32 },
    ReachScore { score: u32 },
}

impl LevelGoal {
    pub fn is_complete(&self, state: &GameState) -> bool {
        match *self {
            LevelGoal::CollectBubbles { color, amount } => state.bubbles(color) >= amount,
            LevelGoal::CollectLeaves { amount } => state.leaves_collected >= amount,
            LevelGoal::CollectCollectables { kind, amount } => state.collectables(kind) >= amount,
            LevelGoal::ReachScore { score } => state.score >= score,
        }
    }
}

/// How a level ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum GameOutcome {
    Won,
    Lost,
}

/// Score thresholds for one, two and three stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StarScores(pub [u32; 3]);

impl StarScores {
    /// Number of stars earned with `score`.
    pub fn stars(&self, score: u32) -> u8 {
        self.0.iter().filter(|&&threshold| score >= threshold).count() as u8
    }
}
