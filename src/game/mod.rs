//! The gameplay core of the bubble shooter.
//!
//! This module contains:
//! - Hexagonal grid system (odd-r offset coordinates)
//! - Tiles, boosters and blockers
//! - Match and floating island detection
//! - Shot resolution and its playback timeline
//! - Level descriptions, play sessions and goals

mod booster;
pub mod bubble;
mod cluster;
pub mod config;
pub mod grid;
pub mod hex;
pub mod level;
mod neighbors;
pub mod progress;
pub mod resolve;
pub mod session;
pub mod state;
mod timeline;

#[cfg(test)]
mod test_support;

use bevy::prelude::*;

pub use booster::ResolveContext;
pub use cluster::{MIN_CLUSTER_SIZE, find_matches, floating_islands};
pub use neighbors::EmptyTileInfo;

use config::ResolutionConfig;
use hex::HexLayout;
use level::{LevelDescription, LevelError};
use progress::LevelProgress;
use resolve::{GameEvent, ResolutionEngine, Shot, ShotReport};
use session::PlaySession;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<ResolutionConfig>();
    app.init_resource::<HexLayout>();
    app.init_resource::<ResolutionEngine>();
    app.init_resource::<LevelProgress>();

    app.add_message::<ShotFired>();
    app.add_message::<ShotResolved>();
    app.add_message::<GameEvent>();

    app.add_systems(Startup, progress::load_progress);
    app.add_systems(
        Update,
        (tick_input_lock, resolve_fired_shots)
            .chain()
            .in_set(ResolutionSystems)
            .run_if(resource_exists::<PlaySession>),
    );
}

/// System set for shot resolution; presentation systems run after it.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionSystems;

/// Message sent by the shooter when a bubble stops.
#[derive(Message, Debug, Clone, Copy)]
pub struct ShotFired(pub Shot);

/// Message sent once a shot has been resolved (or turned away).
#[derive(Message, Debug, Clone)]
pub struct ShotResolved(pub ShotReport);

/// Start playing a level, replacing any session in progress.
pub fn start_session(
    world: &mut World,
    desc: &LevelDescription,
    seed: Option<u64>,
) -> Result<(), LevelError> {
    let session = PlaySession::new(desc, seed)?;
    world.insert_resource(session);
    world.resource_mut::<ResolutionEngine>().reset();
    Ok(())
}

/// Leave the current level.
pub fn end_session(world: &mut World) {
    if world.remove_resource::<PlaySession>().is_some() {
        world.resource_mut::<ResolutionEngine>().reset();
        info!("Session ended");
    }
}

fn tick_input_lock(time: Res<Time>, mut engine: ResMut<ResolutionEngine>) {
    engine.advance(time.delta());
}

fn resolve_fired_shots(
    mut shots: MessageReader<ShotFired>,
    mut resolved: MessageWriter<ShotResolved>,
    mut game_events: MessageWriter<GameEvent>,
    mut engine: ResMut<ResolutionEngine>,
    mut session: ResMut<PlaySession>,
    mut progress: ResMut<LevelProgress>,
    config: Res<ResolutionConfig>,
    layout: Res<HexLayout>,
) {
    for ShotFired(shot) in shots.read() {
        let report = engine.resolve_shot(&mut session, *shot, &config, &*layout);
        game_events.write_batch(report.events.iter().copied());

        if report.events.contains(&GameEvent::GameWon) {
            let score = session.state.score;
            let stars = session.level.star_scores.stars(score);
            info!("Level {} cleared with {} stars", session.level.number, stars);
            if progress.record(session.level.number, score, stars) {
                progress.save();
            }
        }

        resolved.write(ShotResolved(report));
    }
}
