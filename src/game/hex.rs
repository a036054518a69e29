//! Hexagonal coordinate system using offset coordinates (odd-r).
//!
//! Based on Red Blob Games' excellent guide:
//! https://www.redblobgames.com/grids/hexagons/
//!
//! We use "pointy-top" orientation with "odd-r" offset coordinates.
//! Rows are horizontal, row 0 is the anchor row at the top, and odd rows
//! are shifted right by half a hex. This is the classic bubble shooter layout.

use bevy::prelude::*;

/// Square root of 3, used frequently in hex math.
pub const SQRT_3: f32 = 1.732_050_8;

/// The size (outer radius) of each hexagon in world units.
pub const HEX_SIZE: f32 = 20.0;

/// The Y position of row 0 in world space.
pub const GRID_ORIGIN_Y: f32 = 250.0;

/// Axial directions in cube space, starting East and turning counter-clockwise.
const CUBE_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// Offset hex coordinate (odd-r system).
///
/// - `row` increases downward, row 0 touches the top boundary
/// - `col` increases to the right
/// - Odd rows are shifted right by half a hex width
///
/// Both fields are signed: neighbor arithmetic happily produces row -1 or
/// column -1, and the grid treats those as out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct HexCoord {
    pub row: i32,
    pub col: i32,
}

impl HexCoord {
    /// Create a new hex coordinate.
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub const fn is_odd_row(&self) -> bool {
        self.row & 1 == 1
    }

    /// Get all 6 neighboring hex coordinates.
    ///
    /// Order: top-left, top-right, left, right, bottom-left, bottom-right.
    /// The diagonal pairs depend on row parity because odd rows are shifted.
    pub fn neighbors(&self) -> [HexCoord; 6] {
        let (r, c) = (self.row, self.col);

        if self.is_odd_row() {
            [
                HexCoord::new(r - 1, c),
                HexCoord::new(r - 1, c + 1),
                HexCoord::new(r, c - 1),
                HexCoord::new(r, c + 1),
                HexCoord::new(r + 1, c),
                HexCoord::new(r + 1, c + 1),
            ]
        } else {
            [
                HexCoord::new(r - 1, c - 1),
                HexCoord::new(r - 1, c),
                HexCoord::new(r, c - 1),
                HexCoord::new(r, c + 1),
                HexCoord::new(r + 1, c - 1),
                HexCoord::new(r + 1, c),
            ]
        }
    }

    /// Convert to axial cube coordinates `(q, r)`; `s` is implied by `q + r + s = 0`.
    pub const fn to_cube(self) -> (i32, i32) {
        let q = self.col - (self.row - (self.row & 1)) / 2;
        (q, self.row)
    }

    /// Inverse of [`HexCoord::to_cube`].
    pub const fn from_cube(q: i32, r: i32) -> Self {
        Self::new(r, q + (r - (r & 1)) / 2)
    }

    /// Calculate the hex distance between two coordinates.
    ///
    /// In cube coordinates, this is: (|dq| + |dr| + |ds|) / 2
    pub fn distance(&self, other: HexCoord) -> i32 {
        let (aq, ar) = self.to_cube();
        let (bq, br) = other.to_cube();
        let dq = (aq - bq).abs();
        let dr = (ar - br).abs();
        let ds = ((-aq - ar) - (-bq - br)).abs();
        (dq + dr + ds) / 2
    }

    /// All coordinates at exactly `radius` steps from this one.
    ///
    /// Walks the six sides of the ring in cube space and converts each hex
    /// back through the row-parity offset. Coordinates may be out of any
    /// grid's bounds; callers filter them.
    pub fn ring(&self, radius: u32) -> Vec<HexCoord> {
        if radius == 0 {
            return vec![*self];
        }

        let radius = radius as i32;
        let (q0, r0) = self.to_cube();
        let (start_dq, start_dr) = CUBE_DIRECTIONS[4];
        let mut q = q0 + start_dq * radius;
        let mut r = r0 + start_dr * radius;

        let mut ring = Vec::with_capacity(6 * radius as usize);
        for (dq, dr) in CUBE_DIRECTIONS {
            for _ in 0..radius {
                ring.push(HexCoord::from_cube(q, r));
                q += dq;
                r += dr;
            }
        }
        ring
    }

    /// Convert offset hex coordinates to world position.
    ///
    /// For odd-r offset coordinates (pointy-top):
    /// - x = size * sqrt(3) * (col + 0.5 if odd row)
    /// - y = origin_y - size * 1.5 * row
    pub fn to_pixel_with_offset(&self, size: f32, grid_origin_y: f32) -> Vec2 {
        let row_offset = if self.is_odd_row() { 0.5 } else { 0.0 };
        let x = size * SQRT_3 * (self.col as f32 + row_offset);
        let y = size * 1.5 * self.row as f32;
        Vec2::new(x, grid_origin_y - y)
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Maps grid slots to world positions.
///
/// Placement only uses positions to break ties between candidate slots,
/// so any layout that preserves relative distances works.
pub trait TileLayout {
    fn position(&self, coord: HexCoord) -> Vec2;

    /// Whether the player can currently see the slot. Color bombs ignore
    /// hidden tiles.
    fn is_visible(&self, _coord: HexCoord) -> bool {
        true
    }
}

/// The default pointy-top layout.
#[derive(Resource, Debug, Clone, Copy, Reflect)]
#[reflect(Resource)]
pub struct HexLayout {
    pub size: f32,
    pub origin_y: f32,
    /// On-screen area in layout space. `None` treats every slot as visible.
    pub view: Option<Rect>,
}

impl Default for HexLayout {
    fn default() -> Self {
        Self {
            size: HEX_SIZE,
            origin_y: GRID_ORIGIN_Y,
            view: None,
        }
    }
}

impl TileLayout for HexLayout {
    fn position(&self, coord: HexCoord) -> Vec2 {
        coord.to_pixel_with_offset(self.size, self.origin_y)
    }

    fn is_visible(&self, coord: HexCoord) -> bool {
        self.view.is_none_or(|view| view.contains(self.position(coord)))
    }
}
