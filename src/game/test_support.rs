//! Compact grid fixtures for tests.
//!
//! Each string is one row; even rows hold `columns` characters and odd
//! rows one fewer. `.` is an empty slot.
//!
//! | char | tile |
//! |------|------|
//! | `R` `B` `G` `Y` `P` `O` | color bubbles |
//! | `S` `T` `I` `V` | stone, sticky, iron, void blockers |
//! | `X` `H` `C` | bomb, horizontal bomb, color bomb boosters |
//! | `*` | star collectable |

use super::{
    bubble::{BlockerKind, BoosterKind, BubbleColor, CollectableKind, Cover, TileKind},
    grid::HexGrid,
    hex::HexCoord,
    level::{LevelDescription, TilePlacement, TileSpec},
};

pub fn tile_kind(ch: char) -> Option<TileKind> {
    let kind = match ch {
        'R' => TileKind::Color(BubbleColor::Red),
        'B' => TileKind::Color(BubbleColor::Blue),
        'G' => TileKind::Color(BubbleColor::Green),
        'Y' => TileKind::Color(BubbleColor::Yellow),
        'P' => TileKind::Color(BubbleColor::Purple),
        'O' => TileKind::Color(BubbleColor::Orange),
        'S' => TileKind::Blocker(BlockerKind::Stone),
        'T' => TileKind::Blocker(BlockerKind::StickyBubble),
        'I' => TileKind::Blocker(BlockerKind::IronBubble),
        'V' => TileKind::Blocker(BlockerKind::VoidBubble),
        'X' => TileKind::Booster(BoosterKind::Bomb),
        'H' => TileKind::Booster(BoosterKind::HorizontalBomb),
        'C' => TileKind::Booster(BoosterKind::ColorBomb),
        '*' => TileKind::Collectable(CollectableKind::Star),
        '.' => return None,
        other => panic!("unknown fixture tile {other:?}"),
    };
    Some(kind)
}

pub fn grid_from_rows(rows: &[&str]) -> HexGrid {
    let columns = rows[0].len();
    let mut grid = HexGrid::new(rows.len(), columns);
    for (r, line) in rows.iter().enumerate() {
        assert_eq!(line.len(), grid.row_width(r as i32), "row {r} has the wrong width");
        for (c, ch) in line.chars().enumerate() {
            if let Some(kind) = tile_kind(ch) {
                grid.insert(HexCoord::new(r as i32, c as i32), kind, Cover::None);
            }
        }
    }
    grid
}

/// Level description with the fixture's tiles, every color available,
/// no goals and ten shots.
pub fn description_from_rows(rows: &[&str]) -> LevelDescription {
    let mut tiles = Vec::new();
    for (r, line) in rows.iter().enumerate() {
        for (c, ch) in line.chars().enumerate() {
            let tile = match tile_kind(ch) {
                None => continue,
                Some(TileKind::Color(color)) => TileSpec::Color(color),
                Some(TileKind::Booster(kind)) => TileSpec::Booster(kind),
                Some(TileKind::Blocker(kind)) => TileSpec::Blocker(kind),
                Some(TileKind::Collectable(kind)) => TileSpec::Collectable(kind),
                Some(other) => panic!("{other:?} cannot be laid out"),
            };
            tiles.push(TilePlacement {
                row: r as i32,
                col: c as i32,
                tile,
                cover: Cover::None,
            });
        }
    }

    LevelDescription {
        number: 1,
        rows: rows.len(),
        columns: rows[0].len(),
        available_colors: BubbleColor::ALL.to_vec(),
        tiles,
        leaves: Vec::new(),
        goals: Vec::new(),
        star_scores: Default::default(),
        shots: 10,
    }
}

pub fn sorted(mut coords: Vec<HexCoord>) -> Vec<HexCoord> {
    coords.sort();
    coords
}
