//! Shot resolution - everything that happens after a bubble lands.
//!
//! A shot is placed, touched boosters or same-color matches go off, the
//! resulting batches explode ring by ring around the shot, loose islands
//! fall and finally the level goals are checked. Delays between those
//! stages are simulated on a [`Timeline`]; the engine drains it before
//! returning, so the whole shot resolves synchronously and the caller gets
//! a timed list of [`PlaybackStep`]s to animate.

use bevy::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use super::{
    booster::ResolveContext,
    bubble::{BlockerKind, BubbleColor, CollectableKind, Cover, Tile, TileId, TileKind},
    cluster::{find_matches, floating_islands},
    config::ResolutionConfig,
    grid::HexGrid,
    hex::{HexCoord, TileLayout},
    session::PlaySession,
    state::{GameOutcome, LevelGoal},
    timeline::Timeline,
};

/// Where the engine is in resolving a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum Phase {
    #[default]
    Idle,
    Placing,
    ResolvingBoosters,
    ResolvingMatches,
    Exploding,
    CleaningFloating,
    ChainingVoids,
    GoalCheck,
    GameOver(GameOutcome),
}

/// What the shot bubble hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// A tile on the grid.
    Touched(HexCoord),
    /// The top wall.
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub kind: TileKind,
    pub landing: Landing,
    /// Where the bubble stopped, in layout space.
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShotOutcome {
    Resolved,
    /// No free slot next to the landing point; nothing changed.
    Dropped,
    /// Input was locked or the game is over; nothing changed.
    Rejected,
}

/// Something the presentation layer should show for one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileEffect {
    Placed(TileKind),
    Explode,
    Destroyed,
    CoverRemoved(Cover),
    Transformed(BubbleColor),
    /// Marked as part of a floating island.
    Falling,
    Fell,
    LeafReleased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStep {
    /// Offset from the moment the shot landed.
    pub at: Duration,
    pub coord: HexCoord,
    pub effect: TileEffect,
}

/// Score, collection and end-of-game notifications, in the order they happened.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ScoreIncreased { amount: u32, total: u32 },
    LeafCollected { col: i32 },
    BubblesCollected { color: BubbleColor, count: u32 },
    CollectableCollected { kind: CollectableKind },
    GoalCompleted { index: usize, goal: LevelGoal },
    GameWon,
    GameLost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShotReport {
    pub outcome: ShotOutcome,
    pub placed: Option<HexCoord>,
    pub steps: Vec<PlaybackStep>,
    pub events: Vec<GameEvent>,
    /// Time until the last step; input stays locked this long.
    pub duration: Duration,
    /// Batches whose ring ordering gave up before every tile was placed.
    pub ordering_overruns: u32,
}

impl ShotReport {
    fn unresolved(outcome: ShotOutcome) -> Self {
        Self {
            outcome,
            placed: None,
            steps: Vec::new(),
            events: Vec::new(),
            duration: Duration::ZERO,
            ordering_overruns: 0,
        }
    }
}

/// Resolves shots against the current [`PlaySession`] and keeps input
/// locked while the result plays back.
#[derive(Resource, Debug, Default)]
pub struct ResolutionEngine {
    phase: Phase,
    input_lock: Duration,
}

impl ResolutionEngine {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_input_locked(&self) -> bool {
        !self.input_lock.is_zero()
    }

    pub fn input_lock_remaining(&self) -> Duration {
        self.input_lock
    }

    /// Let playback time pass.
    pub fn advance(&mut self, dt: Duration) {
        self.input_lock = self.input_lock.saturating_sub(dt);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn resolve_shot(
        &mut self,
        session: &mut PlaySession,
        shot: Shot,
        config: &ResolutionConfig,
        layout: &impl TileLayout,
    ) -> ShotReport {
        if self.is_input_locked() || session.is_over() {
            debug!("Rejected shot: input locked or game over");
            return ShotReport::unresolved(ShotOutcome::Rejected);
        }

        self.phase = Phase::Placing;
        let Some(placed) = place_shot(session, &shot, layout) else {
            info!("No free slot near the landing point, dropping shot");
            self.phase = Phase::Idle;
            return ShotReport::unresolved(ShotOutcome::Dropped);
        };

        let touched = match shot.landing {
            Landing::Touched(coord) => Some(coord),
            Landing::Top => None,
        };
        let mut resolution = Resolution::new(session, config, layout, shot.kind, placed, touched);
        resolution.run();
        let report = resolution.finish();

        self.phase = match session.outcome() {
            Some(outcome) => Phase::GameOver(outcome),
            None => Phase::Idle,
        };
        self.input_lock = report.duration;
        report
    }
}

/// Pick the slot for the shot and put it there.
///
/// Returns `None` without touching the grid when there is no free slot.
fn place_shot(session: &mut PlaySession, shot: &Shot, layout: &impl TileLayout) -> Option<HexCoord> {
    let grid = &mut session.level.grid;

    let anchor = match shot.landing {
        Landing::Touched(coord) => coord,
        Landing::Top => nearest_top_slot(grid, shot.position, layout)?,
    };

    let mut nearest = None;
    let mut min_distance = f32::INFINITY;
    for candidate in grid.empty_neighbors(anchor, layout) {
        let row = candidate.coord.row;
        if row < 0 || row as usize > grid.rows() {
            continue;
        }
        let distance = candidate.position.distance(shot.position);
        if distance < min_distance {
            min_distance = distance;
            nearest = Some(candidate.coord);
        }
    }
    let slot = nearest?;

    if slot.row as usize == grid.rows() {
        grid.append_row();
        debug!("Grid grew to {} rows", grid.rows());
    }
    grid.insert(slot, shot.kind, Cover::None)?;
    session.spend_shot();

    info!("Placed {:?} at {}", shot.kind, slot);
    Some(slot)
}

/// Top-row slot closest to `position`; later columns win ties.
fn nearest_top_slot(grid: &HexGrid, position: Vec2, layout: &impl TileLayout) -> Option<HexCoord> {
    let mut nearest = None;
    let mut min_distance = f32::INFINITY;
    for col in 0..grid.row_width(0) as i32 {
        let coord = HexCoord::new(0, col);
        let distance = layout.position(coord).distance(position);
        if distance <= min_distance {
            min_distance = distance;
            nearest = Some(coord);
        }
    }
    nearest
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Explode { transform_voids: bool },
    Fall,
}

#[derive(Debug)]
enum Task {
    Explode {
        coord: HexCoord,
        id: TileId,
    },
    Destroy {
        coord: HexCoord,
        id: TileId,
        batch: usize,
        transform_voids: bool,
    },
    FinishBatch,
    Fall {
        tiles: Vec<(HexCoord, TileId)>,
    },
    ChainVoids,
    ChainFinished,
}

/// Working state for one shot.
struct Resolution<'a> {
    session: &'a mut PlaySession,
    config: &'a ResolutionConfig,
    layout: &'a dyn TileLayout,
    shot: TileKind,
    origin: HexCoord,
    touched: Option<HexCoord>,
    phase: Phase,
    timeline: Timeline<Task>,
    batches: Vec<Vec<HexCoord>>,
    current_batch: Option<usize>,
    /// Voids turned into bubbles, waiting for the next chain wave.
    pending_voids: Vec<(HexCoord, TileId)>,
    should_chain: bool,
    chain_counter: u32,
    steps: Vec<PlaybackStep>,
    events: Vec<GameEvent>,
    ordering_overruns: u32,
}

impl<'a> Resolution<'a> {
    fn new(
        session: &'a mut PlaySession,
        config: &'a ResolutionConfig,
        layout: &'a dyn TileLayout,
        shot: TileKind,
        origin: HexCoord,
        touched: Option<HexCoord>,
    ) -> Self {
        let mut resolution = Self {
            session,
            config,
            layout,
            shot,
            origin,
            touched,
            phase: Phase::Placing,
            timeline: Timeline::default(),
            batches: Vec::new(),
            current_batch: None,
            pending_voids: Vec::new(),
            should_chain: false,
            chain_counter: 0,
            steps: Vec::new(),
            events: Vec::new(),
            ordering_overruns: 0,
        };
        resolution.step(origin, TileEffect::Placed(shot));
        resolution
    }

    fn grid(&self) -> &HexGrid {
        &self.session.level.grid
    }

    fn grid_mut(&mut self) -> &mut HexGrid {
        &mut self.session.level.grid
    }

    fn enter(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!("Resolution phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    fn step(&mut self, coord: HexCoord, effect: TileEffect) {
        self.steps.push(PlaybackStep {
            at: self.timeline.now(),
            coord,
            effect,
        });
    }

    fn in_batch(&self, batch: Option<usize>, coord: HexCoord) -> bool {
        batch
            .and_then(|b| self.batches.get(b))
            .is_some_and(|tiles| tiles.contains(&coord))
    }

    fn tile_id(&self, coord: HexCoord) -> Option<TileId> {
        self.grid().get(coord).map(|t| t.id)
    }

    fn run(&mut self) {
        self.enter(Phase::ResolvingBoosters);
        if !self.resolve_touched_boosters() {
            self.enter(Phase::ResolvingMatches);
            self.peel_touched_clouds();

            if self.shot.color().is_some() {
                let matches = find_matches(self.grid(), self.origin);
                if matches.len() >= self.config.match_threshold {
                    self.destroy_tiles(matches, Removal::Explode { transform_voids: true });
                } else {
                    self.check_goals();
                }
            }
        }

        match self.shot {
            TileKind::Special => {
                let hit = self
                    .grid()
                    .neighbors_in_radius(self.origin, self.config.special_radius);
                self.destroy_tiles(hit, Removal::Explode { transform_voids: false });
            }
            TileKind::PurchasableBooster(kind) => {
                let target = self
                    .touched
                    .or_else(|| self.grid().row_tiles(0).last().map(Tile::coord))
                    .unwrap_or(self.origin);
                let hit = kind.resolve(self.grid(), target);
                self.destroy_tiles(hit, Removal::Explode { transform_voids: false });
                self.destroy_tile(self.origin, self.current_batch, true);
            }
            _ => {}
        }

        while let Some(task) = self.timeline.pop() {
            self.run_task(task);
        }
        debug_assert_eq!(self.chain_counter, 0, "void chain still running after the queue drained");

        self.enter(Phase::GoalCheck);
        self.check_goals();
        if !self.session.is_over() && self.session.shots_left() == 0 {
            self.session.outcome = Some(GameOutcome::Lost);
            self.events.push(GameEvent::GameLost);
            info!(
                "Level {} lost with score {}",
                self.session.level.number, self.session.state.score
            );
        }
    }

    fn finish(self) -> ShotReport {
        self.session.refresh_shooting_colors();
        ShotReport {
            outcome: ShotOutcome::Resolved,
            placed: Some(self.origin),
            steps: self.steps,
            events: self.events,
            duration: self.timeline.now(),
            ordering_overruns: self.ordering_overruns,
        }
    }

    /// Boosters next to the shot go off instead of any match.
    fn resolve_touched_boosters(&mut self) -> bool {
        let boosters: Vec<HexCoord> = self
            .grid()
            .neighbors(self.origin)
            .into_iter()
            .filter(|n| matches!(self.grid().get(*n).map(|t| t.kind), Some(TileKind::Booster(_))))
            .collect();
        if boosters.is_empty() {
            return false;
        }

        for at in boosters {
            let Some(kind) = self.grid().get(at).map(|t| t.kind) else {
                continue;
            };
            let hit = kind.resolve(self.grid(), &self.context(at), self.layout);
            self.destroy_tiles(hit, Removal::Explode { transform_voids: false });
        }
        self.destroy_tile(self.origin, self.current_batch, true);
        true
    }

    fn peel_touched_clouds(&mut self) {
        let clouds: Vec<HexCoord> = self
            .grid()
            .neighbors(self.origin)
            .into_iter()
            .filter(|n| self.grid().get(*n).is_some_and(|t| t.effective_cover() == Cover::Cloud))
            .collect();
        for coord in clouds {
            self.remove_cover(coord);
        }
    }

    fn context(&self, at: HexCoord) -> ResolveContext {
        ResolveContext {
            at,
            shot: self.shot,
            touched: self.touched.unwrap_or(self.origin),
            special_radius: self.config.special_radius,
        }
    }

    fn destroy_tiles(&mut self, tiles: Vec<HexCoord>, removal: Removal) {
        if tiles.is_empty() {
            return;
        }
        let batch = self.batches.len();
        self.batches.push(tiles.clone());
        self.current_batch = Some(batch);

        match removal {
            Removal::Fall => {
                for coord in tiles {
                    self.fall_tile(coord, batch);
                }
                self.session.refresh_shooting_colors();
                self.check_goals();
            }
            Removal::Explode { transform_voids } => {
                self.enter(Phase::Exploding);
                let ordered = self.ring_order(tiles);
                info!("Exploding {} tiles", ordered.len());
                self.schedule_explosions(&ordered, batch, transform_voids);
            }
        }
    }

    /// Sort a batch by distance from the shot, ring by ring.
    ///
    /// Tiles not found within `max_ordering_rings` rings are dropped from
    /// the batch.
    fn ring_order(&mut self, tiles: Vec<HexCoord>) -> Vec<HexCoord> {
        let mut seen = HashSet::new();
        let mut remaining: Vec<HexCoord> = tiles.into_iter().filter(|c| seen.insert(*c)).collect();
        let mut ordered = Vec::with_capacity(remaining.len());

        let mut radius = 0;
        while !remaining.is_empty() {
            for coord in self.grid().ring(self.origin, radius) {
                if let Some(index) = remaining.iter().position(|c| *c == coord) {
                    ordered.push(remaining.swap_remove(index));
                }
            }
            radius += 1;

            if radius >= self.config.max_ordering_rings && !remaining.is_empty() {
                warn!(
                    "Gave up ordering explosions around {} after {} rings, {} tiles left out",
                    self.origin,
                    radius,
                    remaining.len()
                );
                self.ordering_overruns += 1;
                break;
            }
        }

        ordered
    }

    fn schedule_explosions(&mut self, ordered: &[HexCoord], batch: usize, transform_voids: bool) {
        let start = self.timeline.now();
        let last = ordered.len().saturating_sub(1);

        for (i, &coord) in ordered.iter().enumerate() {
            let at = start + self.config.stagger(i);
            let mut done_at = at;

            let destroyable = self
                .grid()
                .get(coord)
                .filter(|t| t.can_be_destroyed())
                .map(|t| t.id);
            if let Some(id) = destroyable {
                done_at = at + self.config.explode_delay();
                self.timeline.schedule_at(at, Task::Explode { coord, id });
                self.timeline.schedule_at(
                    done_at,
                    Task::Destroy {
                        coord,
                        id,
                        batch,
                        transform_voids,
                    },
                );
            }

            if i == last {
                self.timeline.schedule_at(done_at, Task::FinishBatch);
            }
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Explode { coord, id } => {
                let shows = self
                    .grid()
                    .get(coord)
                    .is_some_and(|t| t.id == id && t.effective_cover() != Cover::Ice);
                if shows {
                    self.step(coord, TileEffect::Explode);
                }
            }
            Task::Destroy {
                coord,
                id,
                batch,
                transform_voids,
            } => {
                if self.tile_id(coord) == Some(id) {
                    self.destroy_tile(coord, Some(batch), transform_voids);
                }
            }
            Task::FinishBatch => self.finish_batch(),
            Task::Fall { tiles } => {
                let still_there: Vec<HexCoord> = tiles
                    .into_iter()
                    .filter(|(coord, id)| self.tile_id(*coord) == Some(*id))
                    .map(|(coord, _)| coord)
                    .collect();
                self.destroy_tiles(still_there, Removal::Fall);
            }
            Task::ChainVoids => self.chain_voids(),
            Task::ChainFinished => {
                debug_assert!(self.chain_counter > 0);
                self.chain_counter = self.chain_counter.saturating_sub(1);
            }
        }
    }

    fn finish_batch(&mut self) {
        self.enter(Phase::CleaningFloating);
        self.session.refresh_shooting_colors();

        let falling: Vec<(HexCoord, TileId)> = floating_islands(self.grid())
            .into_iter()
            .filter(|island| !(island.len() >= 2 && self.has_sticky(island)))
            .flatten()
            .filter_map(|coord| self.tile_id(coord).map(|id| (coord, id)))
            .collect();

        if falling.is_empty() {
            self.check_goals();
        } else {
            info!("{} floating tiles will fall", falling.len());
            for &(coord, _) in &falling {
                self.step(coord, TileEffect::Falling);
            }
            self.timeline.schedule_after(
                self.config.floating_removal_delay(),
                Task::Fall { tiles: falling },
            );
        }

        if self.should_chain {
            self.should_chain = false;
            self.chain_counter += 1;
            self.enter(Phase::ChainingVoids);
            self.timeline
                .schedule_after(self.config.void_chain_delay(), Task::ChainVoids);
        }
    }

    fn has_sticky(&self, island: &[HexCoord]) -> bool {
        island.iter().any(|c| {
            self.grid()
                .get(*c)
                .is_some_and(|t| t.kind.is_blocker(BlockerKind::StickyBubble))
        })
    }

    /// Pop whatever the transformed voids now match with.
    fn chain_voids(&mut self) {
        let pending = std::mem::take(&mut self.pending_voids);
        let mut processed: Vec<HexCoord> = Vec::new();

        for (coord, id) in pending {
            if self.tile_id(coord) != Some(id) {
                continue;
            }
            let matches = find_matches(self.grid(), coord);
            let fresh: Vec<HexCoord> = matches
                .iter()
                .filter(|c| !processed.contains(c))
                .copied()
                .collect();
            processed.extend(matches);

            if fresh.len() >= self.config.match_threshold {
                debug!("Void chain pops {} tiles from {}", fresh.len(), coord);
                self.destroy_tiles(fresh, Removal::Explode { transform_voids: true });
            }
        }

        self.timeline
            .schedule_after(self.config.void_chain_finish_delay(), Task::ChainFinished);
    }

    fn destroy_tile(&mut self, coord: HexCoord, batch: Option<usize>, transform_voids: bool) {
        let Some(tile) = self.grid().get(coord).cloned() else {
            return;
        };

        if coord.row == 0
            && tile.effective_cover() != Cover::Ice
            && self.session.level.take_leaf(coord.col)
        {
            self.session.state.leaves_collected += 1;
            self.step(coord, TileEffect::LeafReleased);
            self.events.push(GameEvent::LeafCollected { col: coord.col });
            info!("Leaf collected above column {}", coord.col);
        }

        if let Some(color) = tile.color() {
            if tile.cover == Cover::Ice {
                self.remove_cover(coord);
                return;
            }

            self.destroy_stones(coord, batch);
            if tile.cover == Cover::Cloud {
                self.remove_cover(coord);
            }
            if transform_voids {
                self.transform_voids(coord, color, batch);
            }

            self.session.state.add_bubbles(color, 1);
            self.events
                .push(GameEvent::BubblesCollected { color, count: 1 });
        }

        if let TileKind::Booster(_) = tile.kind {
            let mut hit = tile.kind.resolve(self.grid(), &self.context(coord), self.layout);
            hit.retain(|c| *c != coord && !self.in_batch(batch, *c));
            self.destroy_tiles(hit, Removal::Explode { transform_voids: true });
        }

        self.grid_mut().remove(coord);
        self.step(coord, TileEffect::Destroyed);
        self.collect(&tile);
    }

    fn fall_tile(&mut self, coord: HexCoord, batch: usize) {
        let Some(tile) = self.grid().get(coord).cloned() else {
            return;
        };

        if tile.kind.is_blocker(BlockerKind::StickyBubble) {
            self.destroy_tile(coord, Some(batch), true);
            return;
        }

        self.grid_mut().remove(coord);
        self.step(coord, TileEffect::Fell);
        self.collect(&tile);
        if let Some(color) = tile.color() {
            self.session.state.add_bubbles(color, 1);
            self.events
                .push(GameEvent::BubblesCollected { color, count: 1 });
        }
    }

    /// Stones next to a popped bubble break with it.
    fn destroy_stones(&mut self, coord: HexCoord, batch: Option<usize>) {
        let stones: Vec<HexCoord> = self
            .grid()
            .neighbors(coord)
            .into_iter()
            .filter(|n| {
                self.grid()
                    .get(*n)
                    .is_some_and(|t| t.kind.is_blocker(BlockerKind::Stone))
                    && !self.in_batch(batch, *n)
            })
            .collect();

        for stone in stones {
            debug!("Stone at {} breaks", stone);
            self.destroy_tile(stone, batch, true);
        }
    }

    fn transform_voids(&mut self, coord: HexCoord, color: BubbleColor, batch: Option<usize>) {
        let voids: Vec<HexCoord> = self
            .grid()
            .neighbors(coord)
            .into_iter()
            .filter(|n| {
                self.grid()
                    .get(*n)
                    .is_some_and(|t| t.kind.is_blocker(BlockerKind::VoidBubble))
                    && !self.in_batch(batch, *n)
            })
            .collect();

        let mut transformed = Vec::with_capacity(voids.len());
        for void in voids {
            let Some(id) = self.grid_mut().transform(void, TileKind::Color(color)) else {
                continue;
            };
            self.step(void, TileEffect::Transformed(color));
            if !self.pending_voids.contains(&(void, id)) {
                self.pending_voids.push((void, id));
            }
            transformed.push(void);
        }

        let threshold = self.config.match_threshold;
        if transformed
            .iter()
            .any(|c| find_matches(self.grid(), *c).len() >= threshold)
        {
            self.should_chain = true;
        }
    }

    fn remove_cover(&mut self, coord: HexCoord) {
        let Some(tile) = self.grid_mut().get_mut(coord) else {
            return;
        };
        let cover = std::mem::take(&mut tile.cover);
        if cover != Cover::None {
            self.step(coord, TileEffect::CoverRemoved(cover));
        }
    }

    /// Score and collectable counters for a tile leaving the grid.
    fn collect(&mut self, tile: &Tile) {
        if let TileKind::Collectable(kind) = tile.kind {
            self.session.state.add_collectables(kind, 1);
            self.events.push(GameEvent::CollectableCollected { kind });
        }

        let amount = self.config.bubble_score;
        self.session.state.score += amount;
        self.events.push(GameEvent::ScoreIncreased {
            amount,
            total: self.session.state.score,
        });
    }

    /// Report newly completed goals and decide a win.
    fn check_goals(&mut self) {
        if self.session.is_over() {
            return;
        }

        let session = &mut *self.session;
        for (index, goal) in session.level.goals.iter().enumerate() {
            if !session.goals_completed[index] && goal.is_complete(&session.state) {
                session.goals_completed[index] = true;
                self.events.push(GameEvent::GoalCompleted { index, goal: *goal });
            }
        }

        if session.goals_completed.iter().all(|done| *done) {
            session.outcome = Some(GameOutcome::Won);
            self.events.push(GameEvent::GameWon);
            info!(
                "Level {} won with score {}",
                session.level.number, session.state.score
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        bubble::PurchasableBoosterKind,
        hex::HexLayout,
        level::LevelDescription,
        test_support::description_from_rows,
    };

    const RED: TileKind = TileKind::Color(BubbleColor::Red);

    /// Session over `rows` with a goal that cannot be reached by accident.
    fn session_with(rows: &[&str], edit: impl FnOnce(&mut LevelDescription)) -> PlaySession {
        let mut desc = description_from_rows(rows);
        desc.goals = vec![LevelGoal::ReachScore { score: 100_000 }];
        edit(&mut desc);
        PlaySession::new(&desc, Some(3)).unwrap()
    }

    fn session(rows: &[&str]) -> PlaySession {
        session_with(rows, |_| {})
    }

    fn shot_into(kind: TileKind, touched: HexCoord, target: HexCoord) -> Shot {
        Shot {
            kind,
            landing: Landing::Touched(touched),
            position: HexLayout::default().position(target),
        }
    }

    fn fire(engine: &mut ResolutionEngine, session: &mut PlaySession, shot: Shot) -> ShotReport {
        engine.resolve_shot(session, shot, &ResolutionConfig::default(), &HexLayout::default())
    }

    fn has_step(report: &ShotReport, coord: HexCoord, effect: TileEffect) -> bool {
        report
            .steps
            .iter()
            .any(|s| s.coord == coord && s.effect == effect)
    }

    #[test]
    fn test_cluster_of_four_breaks_stone_and_drops_island() {
        let mut session = session(&["RR.BG", "BRSB"]);
        let mut engine = ResolutionEngine::default();

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(0, 1), HexCoord::new(0, 2)),
        );

        assert_eq!(report.outcome, ShotOutcome::Resolved);
        assert_eq!(report.placed, Some(HexCoord::new(0, 2)));
        assert_eq!(report.steps[0].at, Duration::ZERO);
        assert_eq!(report.steps[0].effect, TileEffect::Placed(RED));

        let grid = &session.level.grid;
        for gone in [(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (1, 0)] {
            assert!(grid.get(HexCoord::new(gone.0, gone.1)).is_none(), "{gone:?}");
        }
        assert!(grid.is_occupied(HexCoord::new(0, 3)));
        assert!(grid.is_occupied(HexCoord::new(1, 3)));

        // Four reds, the stone and the blue that lost its anchor.
        assert_eq!(session.state.score, 60);
        assert_eq!(session.state.bubbles(BubbleColor::Red), 4);
        assert_eq!(session.state.bubbles(BubbleColor::Blue), 1);
        assert!(has_step(&report, HexCoord::new(1, 0), TileEffect::Falling));
        assert!(has_step(&report, HexCoord::new(1, 0), TileEffect::Fell));
        assert_eq!(session.shots_left(), 9);
        assert_eq!(report.ordering_overruns, 0);

        let scores = report
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::ScoreIncreased { .. }))
            .count();
        assert_eq!(scores, 6);
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn test_explosions_follow_rings_around_shot() {
        let mut session = session(&["RR.BG", "BGYB"]);
        let mut engine = ResolutionEngine::default();
        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(0, 1), HexCoord::new(0, 2)),
        );

        let destroyed: Vec<(HexCoord, Duration)> = report
            .steps
            .iter()
            .filter(|s| s.effect == TileEffect::Destroyed)
            .map(|s| (s.coord, s.at))
            .collect();
        assert_eq!(
            destroyed.iter().map(|d| d.0).collect::<Vec<_>>(),
            vec![HexCoord::new(0, 2), HexCoord::new(0, 1), HexCoord::new(0, 0)]
        );
        assert!(destroyed.windows(2).all(|w| w[0].1 < w[1].1));
    }

    #[test]
    fn test_horizontal_bomb_clears_row_without_matching() {
        let mut session = session(&["RBGYP", "BRRP", "GY.H*"]);
        let mut engine = ResolutionEngine::default();

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(2, 1), HexCoord::new(2, 2)),
        );

        assert_eq!(report.placed, Some(HexCoord::new(2, 2)));
        let grid = &session.level.grid;
        assert_eq!(grid.row_tiles(2).count(), 0);
        // The reds above the shot would have matched; boosters take precedence.
        assert!(grid.is_occupied(HexCoord::new(1, 1)));
        assert!(grid.is_occupied(HexCoord::new(1, 2)));
        assert_eq!(session.state.bubbles(BubbleColor::Red), 1);
        assert_eq!(session.state.collectables(CollectableKind::Star), 1);
        assert_eq!(session.state.score, 50);
        assert_eq!(report.ordering_overruns, 0);
    }

    #[test]
    fn test_ice_survives_one_explosion() {
        let mut session = session(&["RR.GB", "BGYP"]);
        session
            .level
            .grid
            .get_mut(HexCoord::new(0, 0))
            .unwrap()
            .cover = Cover::Ice;
        let mut engine = ResolutionEngine::default();

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(0, 1), HexCoord::new(0, 2)),
        );

        let iced = session.level.grid.get(HexCoord::new(0, 0)).unwrap();
        assert_eq!(iced.color(), Some(BubbleColor::Red));
        assert_eq!(iced.cover, Cover::None);
        assert!(has_step(
            &report,
            HexCoord::new(0, 0),
            TileEffect::CoverRemoved(Cover::Ice)
        ));
        assert!(!has_step(&report, HexCoord::new(0, 0), TileEffect::Explode));
        assert_eq!(session.state.score, 20);
        assert_eq!(session.state.bubbles(BubbleColor::Red), 2);
    }

    #[test]
    fn test_leaf_collected_wins_level() {
        let mut session = session_with(&["RR.GB", "BGYP"], |desc| {
            desc.leaves = vec![1];
            desc.goals = vec![LevelGoal::CollectLeaves { amount: 1 }];
        });
        let mut engine = ResolutionEngine::default();

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(0, 1), HexCoord::new(0, 2)),
        );

        assert_eq!(session.state.leaves_collected, 1);
        assert!(!session.level.has_leaf(1));
        assert!(has_step(&report, HexCoord::new(0, 1), TileEffect::LeafReleased));
        assert!(report.events.contains(&GameEvent::GoalCompleted {
            index: 0,
            goal: LevelGoal::CollectLeaves { amount: 1 },
        }));
        assert_eq!(report.events.last(), Some(&GameEvent::GameWon));
        assert_eq!(session.outcome(), Some(GameOutcome::Won));
        assert_eq!(engine.phase(), Phase::GameOver(GameOutcome::Won));
    }

    #[test]
    fn test_void_turns_color_and_chains() {
        let mut session = session(&["RR.VR", "BGBR"]);
        let mut engine = ResolutionEngine::default();

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(0, 1), HexCoord::new(0, 2)),
        );

        assert!(has_step(
            &report,
            HexCoord::new(0, 3),
            TileEffect::Transformed(BubbleColor::Red)
        ));
        // First wave: three reds. Chain wave: the former void and two reds.
        // The rest of row 1 then falls.
        assert!(session.level.grid.is_empty());
        assert_eq!(session.state.bubbles(BubbleColor::Red), 6);
        assert_eq!(session.state.score, 90);

        let chain_pop = report
            .steps
            .iter()
            .find(|s| s.coord == HexCoord::new(0, 4) && s.effect == TileEffect::Destroyed)
            .unwrap();
        assert!(chain_pop.at >= ResolutionConfig::default().void_chain_delay());
    }

    #[test]
    fn test_shot_blows_clouds_off_neighbors() {
        let mut session = session(&["GB.YO", "BPYP"]);
        for coord in [HexCoord::new(0, 0), HexCoord::new(0, 3)] {
            session.level.grid.get_mut(coord).unwrap().cover = Cover::Cloud;
        }
        let mut engine = ResolutionEngine::default();

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(0, 1), HexCoord::new(0, 2)),
        );

        let grid = &session.level.grid;
        assert_eq!(grid.get(HexCoord::new(0, 3)).unwrap().cover, Cover::None);
        assert!(has_step(
            &report,
            HexCoord::new(0, 3),
            TileEffect::CoverRemoved(Cover::Cloud)
        ));
        // Not adjacent to the shot.
        assert_eq!(grid.get(HexCoord::new(0, 0)).unwrap().cover, Cover::Cloud);
        assert_eq!(grid.len(), 9);
        assert_eq!(session.state.score, 0);
        assert_eq!(report.duration, Duration::ZERO);
    }

    #[test]
    fn test_special_shot_clears_disc() {
        let mut session = session(&["RBGYPOR", "BGYPOR", "GYP.RBG", "YPORBG", "PORBGYP"]);
        let mut engine = ResolutionEngine::default();
        let center = HexCoord::new(2, 3);

        fire(
            &mut engine,
            &mut session,
            shot_into(TileKind::Special, HexCoord::new(1, 3), center),
        );

        let grid = &session.level.grid;
        for row in 0..5 {
            for col in 0..grid.row_width(row) as i32 {
                let coord = HexCoord::new(row, col);
                assert_eq!(grid.is_occupied(coord), center.distance(coord) > 2, "{coord}");
            }
        }
        assert_eq!(grid.len(), 14);
        assert_eq!(session.state.score, 190);
    }

    #[test]
    fn test_booster_in_batch_sets_off_its_own_batch() {
        let mut session = session(&["RBGYPO", "BGYPO", "GB.HXY", "YPOBG"]);
        let mut engine = ResolutionEngine::default();

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(2, 1), HexCoord::new(2, 2)),
        );

        let grid = &session.level.grid;
        assert_eq!(grid.row_tiles(2).count(), 0);
        assert_eq!(grid.row_tiles(3).count(), 0);
        assert!(grid.is_occupied(HexCoord::new(1, 2)));
        assert!(!grid.is_occupied(HexCoord::new(1, 3)));
        assert!(!grid.is_occupied(HexCoord::new(1, 4)));
        assert_eq!(grid.len(), 9);

        let destroyed_at = |coord: HexCoord| {
            report
                .steps
                .iter()
                .find(|s| s.coord == coord && s.effect == TileEffect::Destroyed)
                .map(|s| s.at)
                .unwrap()
        };
        assert!(destroyed_at(HexCoord::new(1, 4)) > destroyed_at(HexCoord::new(2, 4)));
        assert!(has_step(&report, HexCoord::new(3, 0), TileEffect::Fell));

        // The bomb's batch leaves the rest of the row to the first batch.
        let explodes = report
            .steps
            .iter()
            .filter(|s| s.coord == HexCoord::new(2, 5) && s.effect == TileEffect::Explode)
            .count();
        assert_eq!(explodes, 1);

        // Row 2, the bomb's four neighbors and the three loose row-3 tiles.
        assert_eq!(session.state.score, 130);
        assert_eq!(session.state.bubbles(BubbleColor::Red), 1);
    }

    #[test]
    fn test_ring_ordering_gives_up_after_limit() {
        let mut session = session(&["RRR.G", "BGYB"]);
        let mut engine = ResolutionEngine::default();
        let config = ResolutionConfig {
            max_ordering_rings: 2,
            ..default()
        };

        let report = engine.resolve_shot(
            &mut session,
            shot_into(RED, HexCoord::new(0, 2), HexCoord::new(0, 3)),
            &config,
            &HexLayout::default(),
        );

        assert_eq!(report.ordering_overruns, 1);
        let grid = &session.level.grid;
        assert!(!grid.is_occupied(HexCoord::new(0, 3)));
        assert!(!grid.is_occupied(HexCoord::new(0, 2)));
        assert!(grid.is_occupied(HexCoord::new(0, 1)));
        assert!(grid.is_occupied(HexCoord::new(0, 0)));
        assert_eq!(session.state.bubbles(BubbleColor::Red), 2);
        assert_eq!(session.state.score, 20);
    }

    #[test]
    fn test_iron_resists_explosion_but_falls() {
        let mut session = session(&["RB.YG", "OIPB"]);
        let mut engine = ResolutionEngine::default();
        let iron = HexCoord::new(1, 1);

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(TileKind::Special, HexCoord::new(0, 1), HexCoord::new(0, 2)),
        );

        assert!(!has_step(&report, iron, TileEffect::Explode));
        assert!(!has_step(&report, iron, TileEffect::Destroyed));
        assert!(has_step(&report, iron, TileEffect::Falling));
        assert!(has_step(&report, iron, TileEffect::Fell));
        assert!(session.level.grid.is_empty());
        assert_eq!(session.state.score, 100);
    }

    #[test]
    fn test_sticky_island_stays() {
        let mut session = session(&["RR.BB", "TG.B"]);
        let mut engine = ResolutionEngine::default();
        fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(0, 1), HexCoord::new(0, 2)),
        );

        assert!(session.level.grid.is_occupied(HexCoord::new(1, 0)));
        assert!(session.level.grid.is_occupied(HexCoord::new(1, 1)));
        assert_eq!(session.state.score, 30);
    }

    #[test]
    fn test_lone_sticky_is_destroyed() {
        let mut session = session(&["RR.BB", "T..B"]);
        let mut engine = ResolutionEngine::default();
        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(0, 1), HexCoord::new(0, 2)),
        );

        assert!(!session.level.grid.is_occupied(HexCoord::new(1, 0)));
        assert!(has_step(&report, HexCoord::new(1, 0), TileEffect::Destroyed));
        assert!(!has_step(&report, HexCoord::new(1, 0), TileEffect::Fell));
        assert_eq!(session.state.score, 40);
    }

    #[test]
    fn test_no_free_slot_drops_shot() {
        let mut session = session(&["RBR", "BR", "RBR"]);
        let before = session.level.grid.len();
        let mut engine = ResolutionEngine::default();

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(1, 0), HexCoord::new(1, 0)),
        );

        assert_eq!(report.outcome, ShotOutcome::Dropped);
        assert_eq!(session.level.grid.len(), before);
        assert_eq!(session.level.grid.rows(), 3);
        assert_eq!(session.shots_left(), 10);
        assert!(!engine.is_input_locked());
    }

    #[test]
    fn test_shot_below_grid_appends_row() {
        let mut session = session(&["RBGYP", "BGYP"]);
        let mut engine = ResolutionEngine::default();
        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(1, 0), HexCoord::new(2, 0)),
        );

        assert_eq!(report.placed, Some(HexCoord::new(2, 0)));
        assert_eq!(session.level.grid.rows(), 3);
        assert_eq!(session.level.grid.ground_row(), Some(2));
    }

    #[test]
    fn test_locked_engine_rejects_until_playback_ends() {
        let mut session = session(&["RR.BG", "BGYB"]);
        let mut engine = ResolutionEngine::default();

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(0, 1), HexCoord::new(0, 2)),
        );
        assert!(engine.is_input_locked());
        assert_eq!(engine.input_lock_remaining(), report.duration);

        let second = shot_into(RED, HexCoord::new(0, 3), HexCoord::new(1, 3));
        let rejected = fire(&mut engine, &mut session, second);
        assert_eq!(rejected.outcome, ShotOutcome::Rejected);
        assert_eq!(session.shots_left(), 9);

        engine.advance(report.duration / 2);
        assert!(engine.is_input_locked());
        engine.advance(report.duration);
        assert!(!engine.is_input_locked());

        let accepted = fire(&mut engine, &mut session, second);
        assert_eq!(accepted.outcome, ShotOutcome::Resolved);
    }

    #[test]
    fn test_last_shot_without_goal_loses() {
        let mut session = session_with(&["RBGYP", "BGYP"], |desc| desc.shots = 1);
        let mut engine = ResolutionEngine::default();

        let report = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(1, 0), HexCoord::new(2, 0)),
        );

        assert_eq!(report.events.last(), Some(&GameEvent::GameLost));
        assert_eq!(session.outcome(), Some(GameOutcome::Lost));
        assert_eq!(engine.phase(), Phase::GameOver(GameOutcome::Lost));

        let late = fire(
            &mut engine,
            &mut session,
            shot_into(RED, HexCoord::new(1, 1), HexCoord::new(2, 1)),
        );
        assert_eq!(late.outcome, ShotOutcome::Rejected);
    }

    #[test]
    fn test_top_landing_with_purchased_bomb() {
        let mut session = session(&["RGB..", "...."]);
        let mut engine = ResolutionEngine::default();
        let shot = Shot {
            kind: TileKind::PurchasableBooster(PurchasableBoosterKind::HorizontalBomb),
            landing: Landing::Top,
            position: HexLayout::default().position(HexCoord::new(0, 3)),
        };

        let report = fire(&mut engine, &mut session, shot);

        assert_eq!(report.placed, Some(HexCoord::new(0, 3)));
        assert!(session.level.grid.is_empty());
        assert_eq!(session.state.score, 40);
    }

    #[test]
    fn test_config_threshold_applies() {
        let mut session = session(&["RR.BG", "BGYB"]);
        let mut engine = ResolutionEngine::default();
        let config = ResolutionConfig {
            match_threshold: 4,
            ..default()
        };

        engine.resolve_shot(
            &mut session,
            shot_into(RED, HexCoord::new(0, 1), HexCoord::new(0, 2)),
            &config,
            &HexLayout::default(),
        );
        assert_eq!(session.level.grid.len(), 9);
        assert_eq!(session.state.score, 0);
    }
}
