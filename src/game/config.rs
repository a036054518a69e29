//! Tuning values for shot resolution.
//!
//! Defaults match the shipped game; a JSON file can override any subset.

use bevy::prelude::*;
use serde::Deserialize;
use std::time::Duration;

use super::cluster::MIN_CLUSTER_SIZE;

#[derive(Debug, Clone, PartialEq, Deserialize, Resource)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Smallest same-color group that pops.
    pub match_threshold: usize,
    /// Points per destroyed or fallen tile.
    pub bubble_score: u32,
    /// Reach of a fired special bubble.
    pub special_radius: u32,
    /// Seconds between consecutive explosions of one batch.
    pub explosion_stagger: f32,
    /// Seconds between a tile's explode animation and its removal.
    pub explode_delay: f32,
    /// Seconds floating islands hang before they fall.
    pub floating_removal_delay: f32,
    /// Seconds before a void chain wave looks for matches.
    pub void_chain_delay: f32,
    /// Seconds after a void chain wave before it counts as finished.
    pub void_chain_finish_delay: f32,
    /// Rings searched when ordering a batch before giving up.
    pub max_ordering_rings: u32,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            match_threshold: MIN_CLUSTER_SIZE,
            bubble_score: 10,
            special_radius: 2,
            explosion_stagger: 0.1,
            explode_delay: 0.03,
            floating_removal_delay: 0.2,
            void_chain_delay: 0.3,
            void_chain_finish_delay: 0.2,
            max_ordering_rings: 20,
        }
    }
}

impl ResolutionConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub(super) fn stagger(&self, index: usize) -> Duration {
        secs(self.explosion_stagger * index as f32)
    }

    pub(super) fn explode_delay(&self) -> Duration {
        secs(self.explode_delay)
    }

    pub(super) fn floating_removal_delay(&self) -> Duration {
        secs(self.floating_removal_delay)
    }

    pub(super) fn void_chain_delay(&self) -> Duration {
        secs(self.void_chain_delay)
    }

    pub(super) fn void_chain_finish_delay(&self) -> Duration {
        secs(self.void_chain_finish_delay)
    }
}

/// Negative or NaN values from a hand-edited file clamp to zero.
fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}
