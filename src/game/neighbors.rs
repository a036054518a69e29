//! Adjacency queries over the grid.
//!
//! Everything here returns coordinates of occupied slots; a coordinate
//! identifies the tile sitting in it at the time of the call.

use bevy::prelude::*;
use std::collections::HashSet;

use super::{
    grid::HexGrid,
    hex::{HexCoord, TileLayout},
};

/// A free slot the shot bubble could snap into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmptyTileInfo {
    pub coord: HexCoord,
    pub position: Vec2,
}

impl HexGrid {
    /// Occupied neighbors of `coord`, in top-left, top-right, left, right,
    /// bottom-left, bottom-right order.
    pub fn neighbors(&self, coord: HexCoord) -> Vec<HexCoord> {
        coord
            .neighbors()
            .into_iter()
            .filter(|n| self.is_occupied(*n))
            .collect()
    }

    /// The tile itself plus its occupied neighbors.
    fn neighborhood(&self, coord: HexCoord, into: &mut Vec<HexCoord>, seen: &mut HashSet<HexCoord>) {
        let candidates = std::iter::once(coord).chain(coord.neighbors());
        for c in candidates {
            if self.is_occupied(c) && seen.insert(c) {
                into.push(c);
            }
        }
    }

    /// Filled disc around `coord`: the tile, its neighbors, then `radius - 1`
    /// more passes growing through occupied tiles.
    ///
    /// Expansion only travels through occupied slots, so a gap in the grid
    /// stops the disc on that side.
    pub fn neighbors_in_radius(&self, coord: HexCoord, radius: u32) -> Vec<HexCoord> {
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        self.neighborhood(coord, &mut found, &mut seen);

        for _ in 1..radius.max(1) {
            let frontier = found.clone();
            for c in frontier {
                self.neighborhood(c, &mut found, &mut seen);
            }
        }

        found
    }

    /// Occupied tiles at exactly `radius` hex steps from `coord`.
    pub fn ring(&self, coord: HexCoord, radius: u32) -> Vec<HexCoord> {
        coord
            .ring(radius)
            .into_iter()
            .filter(|c| self.is_occupied(*c))
            .collect()
    }

    /// Free, parity-valid slots among `coord` itself and its six neighbors.
    ///
    /// Rows above the grid (negative) and one row below it are reported
    /// too; placement decides what to do with them.
    pub fn empty_neighbors(&self, coord: HexCoord, layout: &impl TileLayout) -> Vec<EmptyTileInfo> {
        std::iter::once(coord)
            .chain(coord.neighbors())
            .filter(|c| self.is_valid(*c) && !self.is_occupied(*c))
            .map(|c| EmptyTileInfo {
                coord: c,
                position: layout.position(c),
            })
            .collect()
    }
}
