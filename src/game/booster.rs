//! Booster effects - which tiles go off when a booster is triggered.
//!
//! Resolving a booster never mutates the grid; it returns the coordinates
//! the resolution engine should explode.

use super::{
    bubble::{BoosterKind, PurchasableBoosterKind, TileKind},
    cluster::find_matches,
    grid::HexGrid,
    hex::{HexCoord, TileLayout},
};

/// Everything a tile's effect may look at.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext {
    /// Where the resolving tile sits (or landed, for fired boosters).
    pub at: HexCoord,
    /// Kind of the bubble fired this turn.
    pub shot: TileKind,
    /// Tile the fired bubble hit.
    pub touched: HexCoord,
    /// Reach of a fired special bubble.
    pub special_radius: u32,
}

impl TileKind {
    /// Tiles affected when this tile's effect triggers.
    ///
    /// Plain bubbles, blockers and collectables have no effect.
    pub fn resolve(
        &self,
        grid: &HexGrid,
        ctx: &ResolveContext,
        layout: &dyn TileLayout,
    ) -> Vec<HexCoord> {
        match self {
            TileKind::Booster(kind) => kind.resolve(grid, ctx.at, ctx.shot, layout),
            TileKind::PurchasableBooster(kind) => kind.resolve(grid, ctx.touched),
            TileKind::Special => grid.neighbors_in_radius(ctx.at, ctx.special_radius),
            TileKind::Color(_) | TileKind::Blocker(_) | TileKind::Collectable(_) => Vec::new(),
        }
    }
}

impl BoosterKind {
    /// Tiles exploded by a booster sitting at `at`.
    ///
    /// The result always contains the booster itself. A color bomb only
    /// reaches same-color tiles that `layout` reports as visible.
    pub fn resolve(
        self,
        grid: &HexGrid,
        at: HexCoord,
        shot: TileKind,
        layout: &dyn TileLayout,
    ) -> Vec<HexCoord> {
        match self {
            BoosterKind::Bomb => grid.neighbors_in_radius(at, 1),
            BoosterKind::HorizontalBomb => row_coords(grid, at.row),
            BoosterKind::ColorBomb => {
                let mut tiles: Vec<HexCoord> = match shot.color() {
                    Some(color) => grid
                        .iter()
                        .filter(|t| t.color() == Some(color) && layout.is_visible(t.coord()))
                        .map(|t| t.coord())
                        .collect(),
                    None => Vec::new(),
                };
                tiles.push(at);
                tiles
            }
        }
    }
}

impl PurchasableBoosterKind {
    /// Tiles exploded by a fired booster that hit `touched`.
    pub fn resolve(self, grid: &HexGrid, touched: HexCoord) -> Vec<HexCoord> {
        match self {
            PurchasableBoosterKind::HorizontalBomb => row_coords(grid, touched.row),
            PurchasableBoosterKind::CircleBomb => grid.neighbors_in_radius(touched, 2),
            PurchasableBoosterKind::RainbowBubble => {
                let group = find_matches(grid, touched);
                if group.is_empty() && grid.is_occupied(touched) {
                    vec![touched]
                } else {
                    group
                }
            }
        }
    }
}

fn row_coords(grid: &HexGrid, row: i32) -> Vec<HexCoord> {
    grid.row_tiles(row).map(|t| t.coord()).collect()
}
