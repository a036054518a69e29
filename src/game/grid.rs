//! The hexagonal grid that holds all tiles.
//!
//! Storage is a list of rows of optional tiles. Even rows are `columns`
//! wide and odd rows one slot narrower, matching the staggered layout.
//! Rows appended below the starting layout are allocated full width; the
//! parity rule in [`HexGrid::is_valid`] still decides which slots exist.

use bevy::prelude::*;
use std::collections::BTreeSet;

use super::{
    bubble::{BubbleColor, Cover, Tile, TileId, TileKind},
    hex::HexCoord,
};

/// The main grid holding all tiles of a level.
#[derive(Debug, Clone, Default)]
pub struct HexGrid {
    rows: Vec<Vec<Option<Tile>>>,
    columns: usize,
    next_id: u32,
}

impl HexGrid {
    /// Create an empty grid with `rows` rows of the staggered layout.
    ///
    /// Levels need at least 2 columns; with fewer, odd rows have no slots.
    pub fn new(rows: usize, columns: usize) -> Self {
        let rows = (0..rows)
            .map(|r| {
                let width = if r % 2 == 0 { columns } else { columns.saturating_sub(1) };
                vec![None; width]
            })
            .collect();

        Self {
            rows,
            columns,
            next_id: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of usable columns in a row of the given parity.
    pub fn row_width(&self, row: i32) -> usize {
        if row & 1 == 0 {
            self.columns
        } else {
            self.columns.saturating_sub(1)
        }
    }

    /// Whether `coord.col` exists for a row of that parity.
    ///
    /// Rows are not checked: a slot one row below the grid is valid so
    /// the grid can grow into it.
    pub fn is_valid(&self, coord: HexCoord) -> bool {
        coord.col >= 0 && (coord.col as usize) < self.row_width(coord.row)
    }

    fn slot(&self, coord: HexCoord) -> Option<&Option<Tile>> {
        if coord.row < 0 || !self.is_valid(coord) {
            return None;
        }
        self.rows
            .get(coord.row as usize)
            .and_then(|row| row.get(coord.col as usize))
    }

    fn slot_mut(&mut self, coord: HexCoord) -> Option<&mut Option<Tile>> {
        if coord.row < 0 || !self.is_valid(coord) {
            return None;
        }
        self.rows
            .get_mut(coord.row as usize)
            .and_then(|row| row.get_mut(coord.col as usize))
    }

    /// Get the tile at a position, if any.
    ///
    /// Out-of-range rows and invalid columns read as empty.
    pub fn get(&self, coord: HexCoord) -> Option<&Tile> {
        let tile = self.slot(coord)?.as_ref()?;
        debug_assert_eq!(tile.coord, coord, "tile coordinate out of sync with its slot");
        Some(tile)
    }

    pub fn get_mut(&mut self, coord: HexCoord) -> Option<&mut Tile> {
        let tile = self.slot_mut(coord)?.as_mut()?;
        debug_assert_eq!(tile.coord, coord, "tile coordinate out of sync with its slot");
        Some(tile)
    }

    /// Check if a cell is occupied.
    pub fn is_occupied(&self, coord: HexCoord) -> bool {
        self.get(coord).is_some()
    }

    /// Place a new tile in an empty, existing slot.
    ///
    /// Returns `None` (and leaves the grid untouched) if the slot does not
    /// exist or is taken.
    pub fn insert(&mut self, coord: HexCoord, kind: TileKind, cover: Cover) -> Option<TileId> {
        let id = TileId(self.next_id);
        let slot = self.slot_mut(coord)?;
        if slot.is_some() {
            return None;
        }
        *slot = Some(Tile {
            id,
            kind,
            cover,
            coord,
        });
        self.next_id += 1;
        Some(id)
    }

    /// Remove a tile from a position.
    pub fn remove(&mut self, coord: HexCoord) -> Option<Tile> {
        self.slot_mut(coord)?.take()
    }

    /// Replace the tile at `coord` with a fresh tile of another kind.
    ///
    /// The old tile is gone; the new one gets a new id and no cover.
    pub fn transform(&mut self, coord: HexCoord, kind: TileKind) -> Option<TileId> {
        self.remove(coord)?;
        self.insert(coord, kind, Cover::None)
    }

    /// Append one empty, full-width row at the bottom.
    pub fn append_row(&mut self) {
        self.rows.push(vec![None; self.columns]);
    }

    /// Index of the lowest row that still holds a tile.
    pub fn ground_row(&self) -> Option<usize> {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(Option::is_some))
    }

    /// Iterate over all tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.rows.iter().flatten().flatten()
    }

    /// Tiles of one row, left to right.
    pub fn row_tiles(&self, row: i32) -> impl Iterator<Item = &Tile> {
        let row = usize::try_from(row).ok().and_then(|r| self.rows.get(r));
        row.into_iter().flatten().flatten()
    }

    /// Get the number of tiles in the grid.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Check if the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Colors of all color bubbles still on the grid.
    pub fn colors(&self) -> BTreeSet<BubbleColor> {
        self.iter().filter_map(Tile::color).collect()
    }
}

impl std::fmt::Display for HexGrid {
    /// One line per row, `X` for a tile and `O` for an empty slot.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.rows {
            for slot in row {
                write!(f, "{}", if slot.is_some() { 'X' } else { 'O' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
