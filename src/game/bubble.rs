//! Tiles - the bubbles and blockers that sit on the hex grid.
//!
//! Every tile variant lives in one closed enum. Behavior that differs per
//! variant (booster effects, whether an explosion can destroy it) is a
//! `match` on [`TileKind`] rather than a trait object.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::hex::HexCoord;

/// The different bubble colors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BubbleColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
}

impl BubbleColor {
    /// Get all possible bubble colors.
    pub const ALL: [BubbleColor; 6] = [
        BubbleColor::Red,
        BubbleColor::Blue,
        BubbleColor::Green,
        BubbleColor::Yellow,
        BubbleColor::Purple,
        BubbleColor::Orange,
    ];

    /// Pick a random color from `pool`, or from every color when the pool is empty.
    pub fn random_from(pool: &[BubbleColor], rng: &mut impl Rng) -> Self {
        let pool = if pool.is_empty() { &Self::ALL[..] } else { pool };
        pool[rng.random_range(0..pool.len())]
    }
}

/// Layer on top of a color bubble that has to be removed before the bubble can pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cover {
    #[default]
    None,
    /// Survives one explosion; the explosion only breaks the ice.
    Ice,
    /// Blown away by a neighboring shot or by the bubble's own explosion.
    Cloud,
}

/// Boosters that sit on the grid and go off when hit or destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoosterKind {
    /// Explodes itself and every adjacent tile.
    Bomb,
    /// Clears its whole row.
    HorizontalBomb,
    /// Explodes every bubble with the shot bubble's color.
    ColorBomb,
}

/// Boosters the player buys and fires instead of a regular bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchasableBoosterKind {
    /// Clears the row of the tile it hits.
    HorizontalBomb,
    /// Explodes everything within two tiles of the tile it hits.
    CircleBomb,
    /// Pops the whole same-color group of the tile it hits.
    RainbowBubble,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerKind {
    /// Cannot be exploded; breaks when an adjacent bubble pops.
    Stone,
    /// Keeps the island it belongs to from falling.
    StickyBubble,
    /// Cannot be exploded; only falls.
    IronBubble,
    /// Turns into a bubble of the color that popped next to it.
    VoidBubble,
}

/// Items frozen inside bubbles, counted towards collect goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectableKind {
    Star,
    Gem,
    Key,
}

/// What a tile is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Color(BubbleColor),
    /// Area-effect bubble earned by the player; only ever fired, never laid out.
    Special,
    Booster(BoosterKind),
    PurchasableBooster(PurchasableBoosterKind),
    Blocker(BlockerKind),
    Collectable(CollectableKind),
}

impl TileKind {
    pub fn color(&self) -> Option<BubbleColor> {
        match self {
            TileKind::Color(color) => Some(*color),
            _ => None,
        }
    }

    pub fn is_blocker(&self, kind: BlockerKind) -> bool {
        matches!(self, TileKind::Blocker(k) if *k == kind)
    }
}

/// Unique per grid; a transformed void gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct TileId(pub u32);

/// A tile placed on the grid.
///
/// `coord` always mirrors the slot the tile occupies; only [`HexGrid`](super::grid::HexGrid)
/// writes it.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    pub cover: Cover,
    pub(super) coord: HexCoord,
}

impl Tile {
    pub fn coord(&self) -> HexCoord {
        self.coord
    }

    pub fn color(&self) -> Option<BubbleColor> {
        self.kind.color()
    }

    /// Whether an explosion may destroy this tile directly.
    ///
    /// Stones break only through their neighbors and iron only falls.
    pub fn can_be_destroyed(&self) -> bool {
        !matches!(
            self.kind,
            TileKind::Blocker(BlockerKind::Stone | BlockerKind::IronBubble)
        )
    }

    /// Covers only have an effect on color bubbles.
    pub fn effective_cover(&self) -> Cover {
        if self.color().is_some() {
            self.cover
        } else {
            Cover::None
        }
    }
}
