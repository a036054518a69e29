//! Cluster detection - same-color matches and floating islands.
//!
//! Both searches are flood fills over [`HexGrid::neighbors`]. Matches only
//! travel through color bubbles of one color; islands travel through any
//! occupied slot.

use std::collections::HashSet;

use super::{grid::HexGrid, hex::HexCoord};

/// Default minimum group size that pops (match-3).
pub const MIN_CLUSTER_SIZE: usize = 3;

/// Find the same-color group around a color bubble.
///
/// A bubble only joins the group if it touches another bubble of the same
/// color, so an isolated origin comes back alone. The origin is always
/// part of the result. Returns an empty list if `origin` is not a color
/// bubble.
pub fn find_matches(grid: &HexGrid, origin: HexCoord) -> Vec<HexCoord> {
    let Some(color) = grid.get(origin).and_then(|t| t.color()) else {
        return Vec::new();
    };

    let same_color_neighbors = |coord: HexCoord| -> Vec<HexCoord> {
        grid.neighbors(coord)
            .into_iter()
            .filter(|n| grid.get(*n).and_then(|t| t.color()) == Some(color))
            .collect()
    };

    let mut matched = Vec::new();
    let mut in_match = HashSet::new();
    let mut stack = vec![origin];

    while let Some(coord) = stack.pop() {
        if in_match.contains(&coord) {
            continue;
        }

        let same = same_color_neighbors(coord);
        if same.is_empty() {
            continue;
        }

        in_match.insert(coord);
        matched.push(coord);

        for neighbor in same {
            if !in_match.contains(&neighbor) {
                stack.push(neighbor);
            }
        }
    }

    if !in_match.contains(&origin) {
        matched.push(origin);
    }

    matched
}

/// Find every group of tiles that is no longer connected to row 0.
///
/// Tiles are partitioned into connected components regardless of kind;
/// only components without a row-0 member are returned.
pub fn floating_islands(grid: &HexGrid) -> Vec<Vec<HexCoord>> {
    let mut islands = Vec::new();
    let mut processed = HashSet::new();

    for tile in grid.iter() {
        let start = tile.coord();
        if processed.contains(&start) {
            continue;
        }

        let island = find_island(grid, start, &mut processed);
        if island.iter().all(|c| c.row != 0) {
            islands.push(island);
        }
    }

    islands
}

/// Flood fill one connected component starting at an occupied slot.
fn find_island(grid: &HexGrid, start: HexCoord, processed: &mut HashSet<HexCoord>) -> Vec<HexCoord> {
    let mut island = Vec::new();
    let mut stack = vec![start];
    processed.insert(start);

    while let Some(coord) = stack.pop() {
        island.push(coord);

        for neighbor in grid.neighbors(coord) {
            if processed.insert(neighbor) {
                stack.push(neighbor);
            }
        }
    }

    island
}
