//! Level descriptions and the grid they build.
//!
//! A description is plain data (usually JSON). Building it checks every
//! placement against the staggered layout and fills the grid.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    bubble::{BlockerKind, BoosterKind, BubbleColor, CollectableKind, Cover, TileKind},
    grid::HexGrid,
    hex::HexCoord,
    state::{LevelGoal, StarScores},
};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level needs at least 2 columns, got {0}")]
    TooFewColumns(usize),
    #[error("level needs at least one row")]
    NoRows,
    #[error("tile {0} is outside the grid")]
    OutOfBounds(HexCoord),
    #[error("slot {0} is listed twice")]
    Occupied(HexCoord),
    #[error("tile {coord} asks for random color {index} but the color pool is empty")]
    EmptyColorPool { coord: HexCoord, index: usize },
    #[error("leaf column {0} is outside the top row")]
    LeafOutOfRange(usize),
    #[error("invalid level description: {0}")]
    Json(#[from] serde_json::Error),
}

/// What to put in one slot of a level description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileSpec {
    Color(BubbleColor),
    /// Index into the session's shuffled color pool, wrapped to its size.
    Random(usize),
    Booster(BoosterKind),
    Blocker(BlockerKind),
    Collectable(CollectableKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePlacement {
    pub row: i32,
    pub col: i32,
    pub tile: TileSpec,
    #[serde(default)]
    pub cover: Cover,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDescription {
    pub number: u32,
    pub rows: usize,
    pub columns: usize,
    pub available_colors: Vec<BubbleColor>,
    #[serde(default)]
    pub tiles: Vec<TilePlacement>,
    /// Top-row columns with a leaf hanging above them.
    #[serde(default)]
    pub leaves: Vec<usize>,
    #[serde(default)]
    pub goals: Vec<LevelGoal>,
    #[serde(default)]
    pub star_scores: StarScores,
    pub shots: u32,
}

impl LevelDescription {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A built level: the grid plus everything the goals need.
#[derive(Debug, Clone)]
pub struct Level {
    pub number: u32,
    pub grid: HexGrid,
    /// One flag per top-row column; cleared once the leaf is collected.
    pub leaves: Vec<bool>,
    pub goals: Vec<LevelGoal>,
    pub star_scores: StarScores,
    pub shots: u32,
}

impl Level {
    /// Build the grid of `desc`, resolving random tiles against `colors`.
    pub fn build(desc: &LevelDescription, colors: &[BubbleColor]) -> Result<Self, LevelError> {
        if desc.columns < 2 {
            return Err(LevelError::TooFewColumns(desc.columns));
        }
        if desc.rows == 0 {
            return Err(LevelError::NoRows);
        }

        let mut grid = HexGrid::new(desc.rows, desc.columns);
        for placement in &desc.tiles {
            let coord = HexCoord::new(placement.row, placement.col);
            if coord.row < 0 || coord.row as usize >= desc.rows || !grid.is_valid(coord) {
                return Err(LevelError::OutOfBounds(coord));
            }

            let kind = match placement.tile {
                TileSpec::Color(color) => TileKind::Color(color),
                TileSpec::Random(index) => {
                    if colors.is_empty() {
                        return Err(LevelError::EmptyColorPool { coord, index });
                    }
                    TileKind::Color(colors[index % colors.len()])
                }
                TileSpec::Booster(kind) => TileKind::Booster(kind),
                TileSpec::Blocker(kind) => TileKind::Blocker(kind),
                TileSpec::Collectable(kind) => TileKind::Collectable(kind),
            };

            if grid.insert(coord, kind, placement.cover).is_none() {
                return Err(LevelError::Occupied(coord));
            }
        }

        let mut leaves = vec![false; desc.columns];
        for &col in &desc.leaves {
            let Some(leaf) = leaves.get_mut(col) else {
                return Err(LevelError::LeafOutOfRange(col));
            };
            *leaf = true;
        }

        debug!(
            "Built level {} with {} tiles on a {}x{} grid",
            desc.number,
            grid.len(),
            desc.rows,
            desc.columns
        );

        Ok(Self {
            number: desc.number,
            grid,
            leaves,
            goals: desc.goals.clone(),
            star_scores: desc.star_scores,
            shots: desc.shots,
        })
    }

    pub fn has_leaf(&self, col: i32) -> bool {
        usize::try_from(col)
            .ok()
            .and_then(|c| self.leaves.get(c))
            .copied()
            .unwrap_or(false)
    }

    /// Take the leaf above a top-row column. Returns whether one was there.
    pub(super) fn take_leaf(&mut self, col: i32) -> bool {
        let leaf = usize::try_from(col)
            .ok()
            .and_then(|c| self.leaves.get_mut(c));
        match leaf {
            Some(leaf) if *leaf => {
                *leaf = false;
                true
            }
            _ => false,
        }
    }
}
