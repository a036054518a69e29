//! One play of one level.
//!
//! Holds everything that used to be process-wide: the level being played,
//! its score, the color pools and the random source.

use bevy::prelude::*;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::{
    bubble::BubbleColor,
    level::{Level, LevelDescription, LevelError},
    state::{GameOutcome, GameState},
};

#[derive(Resource, Debug)]
pub struct PlaySession {
    pub level: Level,
    pub state: GameState,
    /// The level's colors in this session's shuffled order.
    available_colors: Vec<BubbleColor>,
    /// Colors the next shot may take.
    shooting_colors: Vec<BubbleColor>,
    rng: StdRng,
    pub(super) shots_left: u32,
    pub(super) outcome: Option<GameOutcome>,
    pub(super) goals_completed: Vec<bool>,
}

impl PlaySession {
    /// Start a session. A seed makes the color shuffle and every shot color
    /// reproducible.
    pub fn new(desc: &LevelDescription, seed: Option<u64>) -> Result<Self, LevelError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut available_colors = desc.available_colors.clone();
        available_colors.shuffle(&mut rng);

        let level = Level::build(desc, &available_colors)?;
        info!(
            "Starting level {} with {} shots and {} goals",
            level.number,
            level.shots,
            level.goals.len()
        );

        let mut session = Self {
            shots_left: level.shots,
            goals_completed: vec![false; level.goals.len()],
            level,
            state: GameState::default(),
            available_colors,
            shooting_colors: Vec::new(),
            rng,
            outcome: None,
        };
        session.refresh_shooting_colors();
        Ok(session)
    }

    pub fn shots_left(&self) -> u32 {
        self.shots_left
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn available_colors(&self) -> &[BubbleColor] {
        &self.available_colors
    }

    pub fn shooting_colors(&self) -> &[BubbleColor] {
        &self.shooting_colors
    }

    /// Which goals have already been reported complete.
    pub fn goals_completed(&self) -> &[bool] {
        &self.goals_completed
    }

    /// Color of the next bubble loaded into the shooter.
    pub fn next_shot_color(&mut self) -> BubbleColor {
        BubbleColor::random_from(&self.shooting_colors, &mut self.rng)
    }

    /// Restrict shot colors to what is still on the grid.
    ///
    /// An empty board (or one with only blockers left) falls back to the
    /// level's full palette.
    pub(super) fn refresh_shooting_colors(&mut self) {
        let on_grid = self.level.grid.colors();
        self.shooting_colors = if on_grid.is_empty() {
            self.available_colors.clone()
        } else {
            on_grid.into_iter().collect()
        };
    }

    /// Charge one shot from the budget.
    pub(super) fn spend_shot(&mut self) {
        self.shots_left = self.shots_left.saturating_sub(1);
    }
}
