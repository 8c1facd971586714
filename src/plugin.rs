use bevy::log::{info, warn};
use bevy::prelude::{App, FixedUpdate, Plugin, Res, ResMut, Resource};
use bevy::time::{Fixed, Time};

use crate::world::World;

/// The level being played, driven on the fixed timestep.
#[derive(Resource)]
pub struct LevelWorld(pub World);

#[derive(Resource, Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum LevelOutcome {
    #[default]
    Playing,
    Won,
    Lost,
}

impl LevelOutcome {
    pub fn of(world: &World) -> Self {
        if world.did_player_win() {
            LevelOutcome::Won
        } else if world.did_player_lose() {
            LevelOutcome::Lost
        } else {
            LevelOutcome::Playing
        }
    }
}

pub struct TileWorldPlugin;

impl Plugin for TileWorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelOutcome>()
            .add_systems(FixedUpdate, advance_level_world);
    }
}

fn advance_level_world(
    time: Res<Time<Fixed>>,
    level: Option<ResMut<LevelWorld>>,
    mut outcome: ResMut<LevelOutcome>,
) {
    let Some(mut level) = level else {
        return;
    };
    let dt = time
        .delta_secs_f64()
        .min(level.0.config().max_frame_length);
    if let Err(e) = level.0.advance_time(dt) {
        warn!("[tileworld] Frame of {}s rejected: {}", dt, e);
        return;
    }
    let next = LevelOutcome::of(&level.0);
    if next != *outcome {
        info!("[tileworld] Level outcome {:?} -> {:?}", *outcome, next);
        *outcome = next;
    }
}
