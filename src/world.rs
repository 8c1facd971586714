use std::collections::BTreeMap;

use bevy::log::{debug, info};
use serde::Serialize;

use crate::actor::{Actor, StepContext};
use crate::components::{ActorId, ActorKind, Facing, SchoolId};
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, Result};
use crate::events::GameEventBus;
use crate::interaction::{Effect, FrameLog, FrameSnapshot};
use crate::physics_core::PixelRect;
use crate::tilemap::TileGrid;
use crate::vector::Vector;

/// Serializable per-actor state for renderers and debugging.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ActorSnapshot {
    pub id: u64,
    pub kind: ActorKind,
    pub position: Vector<f64>,
    pub pixel: Vector<i32>,
    pub size: Vector<i32>,
    pub speed: Vector<f64>,
    pub facing: Facing,
    pub health: i32,
    pub max_health: i32,
    pub ducking: bool,
    pub school: Option<u32>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct WorldSnapshot {
    pub frame: u64,
    pub player: Option<u64>,
    pub won: bool,
    pub lost: bool,
    /// `[left, bottom, right, top]` in pixels, inclusive.
    pub visible_window: [i32; 4],
    pub actors: Vec<ActorSnapshot>,
}

/// A level: the tile grid, the actors living in it and the goal.
pub struct World {
    grid: TileGrid,
    config: PhysicsConfig,
    actors: BTreeMap<ActorId, Actor>,
    next_id: u64,
    player: Option<ActorId>,
    target_tile: Vector<i32>,
    window_size: Vector<i32>,
    events: GameEventBus,
    frame: u64,
    goal_announced: bool,
    loss_announced: bool,
}

impl World {
    pub fn new(
        grid: TileGrid,
        config: PhysicsConfig,
        target_tile: Vector<i32>,
        window_size: Vector<i32>,
    ) -> Result<Self> {
        config.validate()?;
        if !grid.tile_in_world(target_tile) {
            return Err(PhysicsError::OutOfBounds {
                what: "target tile",
                position: target_tile,
            });
        }
        if window_size.x <= 0 || window_size.y <= 0 {
            return Err(PhysicsError::InvalidArgument(format!(
                "visible window must be positive, got {}x{}",
                window_size.x, window_size.y
            )));
        }
        Ok(Self {
            grid,
            config,
            actors: BTreeMap::new(),
            next_id: 0,
            player: None,
            target_tile,
            window_size,
            events: GameEventBus::default(),
            frame: 0,
            goal_announced: false,
            loss_announced: false,
        })
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Authoring access; only use between frames.
    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn target_tile(&self) -> Vector<i32> {
        self.target_tile
    }

    pub fn events(&self) -> &GameEventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut GameEventBus {
        &mut self.events
    }

    /// Adds an actor whose bottom-left pixel lies inside the world. The first
    /// player added becomes the world's player; a second one is rejected.
    pub fn add_actor(&mut self, actor: Actor) -> Result<ActorId> {
        let pixel = actor.position().to_pixels(self.config.meters_per_pixel);
        if !self.grid.pixel_in_world(pixel) {
            return Err(PhysicsError::OutOfBounds {
                what: "actor",
                position: pixel,
            });
        }
        if actor.kind() == ActorKind::Player && self.player.is_some() {
            return Err(PhysicsError::InvalidActor(
                "the world already has a player".to_string(),
            ));
        }

        let id = ActorId(self.next_id);
        self.next_id += 1;
        if actor.kind() == ActorKind::Player {
            self.player = Some(id);
        }
        self.actors.insert(id, actor);

        let snapshot = self.frame_snapshot();
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.refresh_surroundings(id, &self.grid, &snapshot, self.config.meters_per_pixel);
        }
        Ok(id)
    }

    pub fn set_player(&mut self, actor: Actor) -> Result<ActorId> {
        if actor.kind() != ActorKind::Player {
            return Err(PhysicsError::InvalidActor(format!(
                "a {} cannot be the player",
                actor.kind().label()
            )));
        }
        self.add_actor(actor)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Result<&mut Actor> {
        self.actors.get_mut(&id).ok_or(PhysicsError::UnknownActor(id.0))
    }

    pub fn actors(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.actors.iter().map(|(id, actor)| (*id, actor))
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn count(&self, kind: ActorKind) -> usize {
        self.actors.values().filter(|a| a.kind() == kind).count()
    }

    /// Live slimes currently in `school`.
    pub fn school_size(&self, school: SchoolId) -> usize {
        self.actors
            .values()
            .filter(|a| a.is_alive() && a.school() == Some(school))
            .count()
    }

    pub fn player_id(&self) -> Option<ActorId> {
        self.player
    }

    pub fn player(&self) -> Option<&Actor> {
        self.player.and_then(|id| self.actors.get(&id))
    }

    pub fn player_mut(&mut self) -> Option<&mut Actor> {
        self.player.and_then(|id| self.actors.get_mut(&id))
    }

    fn frame_snapshot(&self) -> FrameSnapshot {
        let mpp = self.config.meters_per_pixel;
        FrameSnapshot::new(
            self.actors.iter().map(|(id, actor)| actor.view(*id, mpp)),
            self.grid.tile_size(),
        )
    }

    /// Advances every actor by `dt` seconds.
    ///
    /// Actors step one at a time in id order. Each sees the others' health and
    /// schools as they were when the frame started, and their rectangles as
    /// of their last completed step. Effects on other actors are applied
    /// after the pass, and actors dead for longer than the grace period are
    /// removed last. Once the game is over the world no longer changes.
    pub fn advance_time(&mut self, dt: f64) -> Result<()> {
        if !dt.is_finite() || dt < 0.0 || dt > self.config.max_frame_length {
            return Err(PhysicsError::InvalidArgument(format!(
                "frame length must lie in [0, {}], got {dt}",
                self.config.max_frame_length
            )));
        }
        if self.is_game_over() {
            return Ok(());
        }
        self.frame += 1;
        self.events.frame = self.frame;

        let mpp = self.config.meters_per_pixel;
        let mut snapshot = self.frame_snapshot();
        let mut log = FrameLog::default();
        for (id, actor) in self.actors.iter_mut() {
            let mut ctx = StepContext {
                grid: &self.grid,
                config: &self.config,
                snapshot: &snapshot,
                log: &mut log,
            };
            actor.advance_time(*id, dt, &mut ctx)?;
            snapshot.relocate(*id, actor.rect(mpp));
        }

        self.apply_frame_log(log);
        self.remove_dead();
        self.update_outcome();
        Ok(())
    }

    fn apply_frame_log(&mut self, log: FrameLog) {
        let (effects, events) = log.into_parts();
        for event in events {
            self.events.emit(event.name, event.data, Some(event.source));
        }
        for effect in effects {
            let target = effect.target();
            let Some(actor) = self.actors.get_mut(&target) else {
                continue;
            };
            match effect {
                Effect::HealthDelta { amount, .. } => {
                    if let Some(before) = actor.adjust_health(amount) {
                        emit_health_change(&mut self.events, target, before, actor.health());
                    }
                }
                Effect::Kill { .. } => {
                    if let Some(before) = actor.kill() {
                        emit_health_change(&mut self.events, target, before, 0);
                    }
                }
                Effect::SwitchSchool { school, .. } => {
                    if let Some(previous) = actor.join_school(school) {
                        debug!(
                            "[tileworld] Slime {} switched from school {} to {}",
                            target.0, previous.0, school.0
                        );
                        self.events.emit(
                            "school_switched",
                            serde_json::json!({ "from": previous.0, "to": school.0 }),
                            Some(target),
                        );
                    }
                }
            }
        }
    }

    fn remove_dead(&mut self) {
        let grace = self.config.death_grace_period;
        let doomed: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|(_, actor)| actor.should_be_removed(grace))
            .map(|(id, _)| *id)
            .collect();
        for id in doomed {
            if let Some(actor) = self.actors.remove(&id) {
                debug!("[tileworld] Removed {} {}", actor.kind().label(), id.0);
                self.events.emit(
                    "actor_removed",
                    serde_json::json!({ "kind": actor.kind().label() }),
                    Some(id),
                );
            }
        }
    }

    fn update_outcome(&mut self) {
        if !self.goal_announced && self.did_player_win() {
            self.goal_announced = true;
            info!(
                "[tileworld] Player reached target tile ({}, {}) on frame {}",
                self.target_tile.x, self.target_tile.y, self.frame
            );
            self.events.emit(
                "goal_reached",
                serde_json::json!({ "tile": [self.target_tile.x, self.target_tile.y] }),
                self.player,
            );
        }
        if !self.loss_announced && self.did_player_lose() {
            self.loss_announced = true;
            info!("[tileworld] Player lost on frame {}", self.frame);
            self.events.emit(
                "player_lost",
                serde_json::json!({}),
                self.player,
            );
        }
    }

    fn target_rect(&self) -> PixelRect {
        let size = self.grid.tile_size();
        PixelRect::new(
            self.grid.bottom_left_pixel_of_tile(self.target_tile),
            Vector::new(size, size),
        )
    }

    pub fn did_player_win(&self) -> bool {
        self.player().is_some_and(|player| {
            player.is_alive()
                && player
                    .rect(self.config.meters_per_pixel)
                    .overlaps(&self.target_rect())
        })
    }

    /// The player has been dead longer than the grace period, and so was
    /// removed.
    pub fn did_player_lose(&self) -> bool {
        match self.player {
            None => false,
            Some(id) => self
                .actors
                .get(&id)
                .map_or(true, |p| p.should_be_removed(self.config.death_grace_period)),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.did_player_win() || self.did_player_lose()
    }

    /// `[left, bottom, right, top]` in pixels, centred on the player and kept
    /// inside the world.
    pub fn visible_window(&self) -> [i32; 4] {
        let world = self.grid.size_in_pixels();
        let width = self.window_size.x.min(world.x);
        let height = self.window_size.y.min(world.y);
        let centre = match self.player() {
            Some(player) => {
                let rect = player.rect(self.config.meters_per_pixel);
                Vector::new(
                    rect.origin.x + rect.size.x / 2,
                    rect.origin.y + rect.size.y / 2,
                )
            }
            None => Vector::new(width / 2, height / 2),
        };
        let left = (centre.x - width / 2).clamp(0, world.x - width);
        let bottom = (centre.y - height / 2).clamp(0, world.y - height);
        [left, bottom, left + width - 1, bottom + height - 1]
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let mpp = self.config.meters_per_pixel;
        WorldSnapshot {
            frame: self.frame,
            player: self.player.map(|p| p.0),
            won: self.did_player_win(),
            lost: self.did_player_lose(),
            visible_window: self.visible_window(),
            actors: self
                .actors
                .iter()
                .map(|(id, actor)| ActorSnapshot {
                    id: id.0,
                    kind: actor.kind(),
                    position: actor.position(),
                    pixel: actor.position().to_pixels(mpp),
                    size: actor.size(),
                    speed: actor.speed(),
                    facing: actor.facing(),
                    health: actor.health(),
                    max_health: actor.max_health(),
                    ducking: actor.is_ducking(),
                    school: actor.school().map(|s| s.0),
                })
                .collect(),
        }
    }
}

fn emit_health_change(bus: &mut GameEventBus, id: ActorId, before: i32, after: i32) {
    bus.emit(
        "health_changed",
        serde_json::json!({ "from": before, "to": after }),
        Some(id),
    );
    if after == 0 {
        bus.emit("death", serde_json::json!({}), Some(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TileType;
    use crate::movement::Requester;

    const MPP: f64 = 0.01;

    /// 300 x 200 pixels with a ground floor in row 0.
    fn level() -> TileGrid {
        let mut grid = TileGrid::new(10, 30, 20).unwrap();
        grid.fill(Vector::new(0, 0), Vector::new(29, 0), TileType::Ground);
        grid
    }

    fn world_with(grid: TileGrid) -> World {
        World::new(
            grid,
            PhysicsConfig::default(),
            Vector::new(29, 19),
            Vector::new(100, 80),
        )
        .unwrap()
    }

    fn player(x: f64, y: f64) -> Actor {
        Actor::player(Vector::new(x, y), Vector::new(20, 30), &PhysicsConfig::default()).unwrap()
    }

    fn slime(x: f64, y: f64, school: u32) -> Actor {
        Actor::slime(
            Vector::new(x, y),
            Vector::new(10, 10),
            SchoolId(school),
            &PhysicsConfig::default(),
        )
        .unwrap()
    }

    fn run(world: &mut World, frames: usize, dt: f64) {
        for _ in 0..frames {
            world.advance_time(dt).unwrap();
        }
    }

    #[test]
    fn resting_on_ground_keeps_vertical_speed_zero() {
        let mut world = world_with(level());
        let id = world.set_player(player(1.0, 0.09)).unwrap();
        world.advance_time(0.1).unwrap();
        let p = world.actor(id).unwrap();
        assert_eq!(p.speed().y, 0.0);
        assert_eq!(p.position().to_pixels(MPP), Vector::new(100, 9));
        assert!(p.is_on_ground());
    }

    #[test]
    fn jump_decelerates_under_gravity() {
        let mut world = world_with(level());
        let id = world.set_player(player(1.0, 0.09)).unwrap();
        world.player_mut().unwrap().start_jump(Requester::INPUT);
        world.advance_time(0.2).unwrap();
        let p = world.actor(id).unwrap();
        assert!((p.speed().y - 6.0).abs() < 0.05, "vy = {}", p.speed().y);
        assert!(p.position().y > 1.4);
    }

    #[test]
    fn magma_burns_every_contact_frame() {
        let mut grid = level();
        grid.fill(Vector::new(0, 1), Vector::new(29, 1), TileType::Magma);
        let mut world = world_with(grid);
        let id = world.set_player(player(1.0, 0.09)).unwrap();

        world.advance_time(0.01).unwrap();
        assert_eq!(world.actor(id).unwrap().health(), 50);
        world.advance_time(0.01).unwrap();
        assert_eq!(world.actor(id).unwrap().health(), 0);
        world.advance_time(0.01).unwrap();
        assert_eq!(world.actor(id).unwrap().health(), 0);
    }

    #[test]
    fn water_damage_respects_cooldown_across_small_frames() {
        let mut grid = level();
        grid.fill(Vector::new(0, 1), Vector::new(29, 1), TileType::Water);
        let mut world = world_with(grid);
        let id = world.set_player(player(1.0, 0.09)).unwrap();
        run(&mut world, 100, 0.01);
        assert_eq!(world.actor(id).unwrap().health(), 90);
    }

    #[test]
    fn dead_actor_is_removed_only_after_grace_period() {
        let mut grid = level();
        grid.fill(Vector::new(0, 1), Vector::new(29, 1), TileType::Magma);
        let config = PhysicsConfig {
            death_grace_period: 0.5,
            ..PhysicsConfig::default()
        };
        let mut world = World::new(grid, config, Vector::new(29, 19), Vector::new(100, 80)).unwrap();
        let id = world.add_actor(slime(1.0, 0.09, 0)).unwrap();

        run(&mut world, 2, 0.125);
        assert_eq!(world.actor(id).unwrap().health(), 0);
        run(&mut world, 4, 0.125);
        let dying = world.actor(id).unwrap();
        assert_eq!(dying.death_time(), 0.5);

        world.advance_time(0.125).unwrap();
        assert!(world.actor(id).is_none());
        assert_eq!(world.events().named("actor_removed").count(), 1);
    }

    #[test]
    fn invalid_frame_lengths_leave_the_world_untouched() {
        let mut world = world_with(level());
        let id = world.set_player(player(1.0, 0.5)).unwrap();
        for dt in [f64::NAN, -0.01, 0.21, f64::INFINITY] {
            assert!(matches!(
                world.advance_time(dt),
                Err(PhysicsError::InvalidArgument(_))
            ));
        }
        assert_eq!(world.frame(), 0);
        assert_eq!(world.actor(id).unwrap().position(), Vector::new(1.0, 0.5));
        assert!(world.advance_time(0.0).is_ok());
    }

    #[test]
    fn actors_must_start_inside_the_world() {
        let mut world = world_with(level());
        assert!(matches!(
            world.add_actor(player(5.0, 0.5)),
            Err(PhysicsError::OutOfBounds { what: "actor", .. })
        ));
        assert_eq!(world.actor_count(), 0);
        world.set_player(player(1.0, 0.5)).unwrap();
        assert!(matches!(
            world.add_actor(player(2.0, 0.5)),
            Err(PhysicsError::InvalidActor(_))
        ));
        assert!(world.set_player(slime(1.0, 1.0, 0)).is_err());
        assert!(matches!(
            world.actor_mut(ActorId(99)),
            Err(PhysicsError::UnknownActor(99))
        ));
    }

    #[test]
    fn walking_into_an_enemy_blocks_and_hurts() {
        let mut world = world_with(level());
        let pid = world.set_player(player(1.0, 0.09)).unwrap();
        let sid = world
            .add_actor(
                Actor::slime(
                    Vector::new(1.25, 0.09),
                    Vector::new(20, 20),
                    SchoolId(0),
                    &PhysicsConfig::default(),
                )
                .unwrap(),
            )
            .unwrap();
        world.player_mut().unwrap().start_move(Requester::INPUT, Facing::Right);
        run(&mut world, 8, 0.05);

        let p = world.actor(pid).unwrap();
        assert!(p.rect(MPP).top_right().x <= 124);
        assert_eq!(p.health(), 50);
        let s = world.actor(sid).unwrap();
        assert_eq!(s.position().to_pixels(MPP), Vector::new(125, 9));
        assert_eq!(s.health(), 100);
    }

    #[test]
    fn actors_walking_into_each_other_stop_side_by_side() {
        let cfg = PhysicsConfig::default();
        let mut world = world_with(level());
        let left = world
            .add_actor(Actor::shark(Vector::new(0.5, 0.09), Vector::new(20, 20), &cfg).unwrap())
            .unwrap();
        let right = world
            .add_actor(Actor::shark(Vector::new(2.3, 0.09), Vector::new(20, 20), &cfg).unwrap())
            .unwrap();
        world.actor_mut(left).unwrap().start_move(Requester::INPUT, Facing::Right);
        world.actor_mut(right).unwrap().start_move(Requester::INPUT, Facing::Left);

        let mut gap = 0;
        for frame in 0..40 {
            world.advance_time(0.05).unwrap();
            let a = world.actor(left).unwrap().rect(MPP);
            let b = world.actor(right).unwrap().rect(MPP);
            gap = b.origin.x - a.top_right().x;
            assert!(gap >= 1, "frame {frame}: a ends at {}, b starts at {}", a.top_right().x, b.origin.x);
        }
        assert!(gap <= 3, "sharks never met, gap {gap}");
        assert!(world.actor(left).unwrap().is_alive());
        assert!(world.actor(right).unwrap().is_alive());
    }

    #[test]
    fn damaged_player_eats_each_plant_once() {
        let mut world = world_with(level());
        let pid = world.set_player(player(1.0, 0.09)).unwrap();
        world
            .add_actor(Actor::plant(Vector::new(1.05, 0.1), Vector::new(10, 10), &PhysicsConfig::default()).unwrap())
            .unwrap();
        world
            .add_actor(Actor::plant(Vector::new(1.08, 0.15), Vector::new(10, 10), &PhysicsConfig::default()).unwrap())
            .unwrap();

        world.advance_time(0.05).unwrap();
        assert_eq!(world.actor(pid).unwrap().health(), 200);
        assert_eq!(world.events().named("plant_eaten").count(), 2);
        assert!(world
            .actors()
            .filter(|(_, a)| a.kind() == ActorKind::Plant)
            .all(|(_, a)| a.health() == 0));

        world.advance_time(0.05).unwrap();
        assert_eq!(world.actor(pid).unwrap().health(), 200);
        run(&mut world, 8, 0.1);
        assert_eq!(world.count(ActorKind::Plant), 0);
    }

    #[test]
    fn hurt_slime_drags_its_school_down() {
        let mut grid = level();
        grid.set_tile_type(Vector::new(5, 1), TileType::Magma);
        let mut world = world_with(grid);
        let burning = world.add_actor(slime(0.5, 0.09, 3)).unwrap();
        let mate = world.add_actor(slime(1.5, 0.09, 3)).unwrap();
        let stranger = world.add_actor(slime(2.5, 0.09, 4)).unwrap();

        world.advance_time(0.05).unwrap();
        assert_eq!(world.actor(burning).unwrap().health(), 50);
        assert_eq!(world.actor(mate).unwrap().health(), 99);
        assert_eq!(world.actor(stranger).unwrap().health(), 100);

        run(&mut world, 3, 0.05);
        assert_eq!(world.actor(burning).unwrap().health(), 0);
        assert_eq!(world.actor(mate).unwrap().health(), 98);
    }

    #[test]
    fn lone_slime_joins_the_bigger_school() {
        let mut world = world_with(level());
        let loner = world.add_actor(slime(1.0, 0.09, 1)).unwrap();
        let member = world.add_actor(slime(1.05, 0.09, 2)).unwrap();
        world.add_actor(slime(2.5, 0.09, 2)).unwrap();

        world.advance_time(0.05).unwrap();
        assert_eq!(world.actor(loner).unwrap().school(), Some(SchoolId(2)));
        assert_eq!(world.actor(member).unwrap().school(), Some(SchoolId(2)));
        assert_eq!(world.school_size(SchoolId(2)), 3);
        assert_eq!(world.school_size(SchoolId(1)), 0);
    }

    #[test]
    fn reaching_the_target_tile_wins_and_freezes_the_world() {
        let world_grid = level();
        let mut world = World::new(
            world_grid,
            PhysicsConfig::default(),
            Vector::new(5, 1),
            Vector::new(100, 80),
        )
        .unwrap();
        let pid = world.set_player(player(0.2, 0.09)).unwrap();
        world.player_mut().unwrap().start_move(Requester::INPUT, Facing::Right);

        for _ in 0..20 {
            if world.is_game_over() {
                break;
            }
            world.advance_time(0.05).unwrap();
        }
        assert!(world.did_player_win());
        assert!(!world.did_player_lose());
        let frame = world.frame();
        let position = world.actor(pid).unwrap().position();
        world.advance_time(0.05).unwrap();
        assert_eq!(world.frame(), frame);
        assert_eq!(world.actor(pid).unwrap().position(), position);
        assert_eq!(world.events().named("goal_reached").count(), 1);
    }

    #[test]
    fn falling_out_of_the_world_loses_after_grace() {
        let grid = TileGrid::new(10, 30, 20).unwrap();
        let mut world = world_with(grid);
        world.set_player(player(1.0, 0.5)).unwrap();

        run(&mut world, 4, 0.1);
        assert_eq!(world.player().unwrap().health(), 0);
        assert!(!world.did_player_lose());

        run(&mut world, 11, 0.1);
        assert!(world.player().is_none());
        assert!(world.did_player_lose());
        assert!(world.is_game_over());
        assert_eq!(world.events().named("player_lost").count(), 1);
    }

    #[test]
    fn visible_window_follows_the_player_within_bounds() {
        let mut world = world_with(level());
        assert_eq!(world.visible_window(), [0, 0, 99, 79]);
        world.set_player(player(1.0, 0.09)).unwrap();
        assert_eq!(world.visible_window(), [60, 0, 159, 79]);
    }

    fn busy_world() -> World {
        let mut grid = level();
        grid.fill(Vector::new(20, 1), Vector::new(29, 4), TileType::Water);
        grid.fill(Vector::new(12, 1), Vector::new(13, 1), TileType::Magma);
        grid.fill(Vector::new(8, 1), Vector::new(8, 3), TileType::Ground);
        let cfg = PhysicsConfig::default();
        let mut world = world_with(grid);
        world.set_player(player(0.3, 0.09)).unwrap();
        world.add_actor(slime(1.0, 0.09, 1)).unwrap();
        world.add_actor(slime(1.6, 0.09, 1)).unwrap();
        world.add_actor(slime(1.7, 0.5, 2)).unwrap();
        world
            .add_actor(Actor::shark(Vector::new(2.3, 0.2), Vector::new(20, 10), &cfg).unwrap())
            .unwrap();
        world
            .add_actor(Actor::plant(Vector::new(0.5, 0.5), Vector::new(10, 10), &cfg).unwrap())
            .unwrap();
        world
    }

    fn drive(world: &mut World, frames: usize) {
        let pid = world.player_id().unwrap();
        for i in 0..frames {
            if let Ok(player) = world.actor_mut(pid) {
                match i % 40 {
                    0 => player.start_move(Requester::INPUT, Facing::Right),
                    10 => player.start_jump(Requester::INPUT),
                    14 => player.end_jump(Requester::INPUT),
                    25 => player.start_move(Requester::PROGRAM, Facing::Left),
                    30 => player.end_move(Requester::PROGRAM),
                    _ => {}
                }
            }
            world.advance_time(0.03 + 0.001 * (i % 7) as f64).unwrap();
        }
    }

    #[test]
    fn health_and_position_stay_in_bounds() {
        let mut world = busy_world();
        let size = world.grid().size_in_meters(MPP);
        let pid = world.player_id().unwrap();
        for i in 0..120 {
            if i % 30 == 0 {
                if let Ok(player) = world.actor_mut(pid) {
                    player.start_move(Requester::INPUT, Facing::Right);
                    player.start_jump(Requester::INPUT);
                }
            }
            world.advance_time(0.05).unwrap();
            for (_, actor) in world.actors() {
                assert!(actor.health() >= 0 && actor.health() <= actor.max_health());
                let p = actor.position();
                assert!(p.x >= 0.0 && p.x < size.x, "x = {}", p.x);
                assert!(p.y >= 0.0 && p.y < size.y, "y = {}", p.y);
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_worlds() {
        let mut a = busy_world();
        let mut b = busy_world();
        drive(&mut a, 150);
        drive(&mut b, 150);
        assert_eq!(
            serde_json::to_string(&a.snapshot()).unwrap(),
            serde_json::to_string(&b.snapshot()).unwrap()
        );
        assert_eq!(a.snapshot(), b.snapshot());
    }
}
