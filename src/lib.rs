//! Hex-grid bubble matching and shot resolution for bubble shooters.
//!
//! Add [`HexpopPlugin`] to an `App`, start a level with
//! [`game::start_session`] and send [`game::ShotFired`] messages; results
//! come back as [`game::ShotResolved`] and [`game::resolve::GameEvent`]
//! messages.

pub mod game;

use bevy::prelude::*;

pub struct HexpopPlugin;

impl Plugin for HexpopPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(game::plugin);
    }
}
