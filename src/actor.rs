use bevy::log::debug;

use crate::components::{ActorId, ActorKind, Facing, SchoolId, TileType};
use crate::config::{MotionProfile, PhysicsConfig};
use crate::error::{PhysicsError, Result};
use crate::interaction::{pair_hook, ActorView, Effect, FrameLog, FrameSnapshot, PairContext};
use crate::movement::{MoveRelease, MovementRequests, Requester};
use crate::physics_core::{self, kind_of_overlap, Kinematics, PixelRect};
use crate::reactions::{default_rules, Contacts, ReactionRule};
use crate::tilemap::{Tile, TileGrid};
use crate::vector::Vector;

/// Species-specific state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KindState {
    Player,
    /// Plants walk back and forth, turning every `plant_move_time` seconds.
    Plant { direction_time: f64 },
    Slime { school: SchoolId },
    Shark,
}

impl KindState {
    pub fn kind(&self) -> ActorKind {
        match self {
            KindState::Player => ActorKind::Player,
            KindState::Plant { .. } => ActorKind::Plant,
            KindState::Slime { .. } => ActorKind::Slime,
            KindState::Shark => ActorKind::Shark,
        }
    }
}

/// What the actor's rectangle meets at one position.
struct Detection {
    own: PixelRect,
    tiles: Vec<Tile>,
    actors: Vec<ActorView>,
}

impl Detection {
    /// Impassable tiles in grid order, then live impassable actors by id.
    fn obstacles(&self) -> Vec<PixelRect> {
        self.tiles
            .iter()
            .filter(|t| !t.is_passable())
            .map(Tile::rect)
            .chain(
                self.actors
                    .iter()
                    .filter(|a| !a.is_passable() && a.is_alive())
                    .map(|a| a.rect),
            )
            .collect()
    }

    fn contacts(&self, log: &FrameLog) -> Contacts {
        let mut contacts = Contacts::default();
        for tile in &self.tiles {
            contacts.tiles |= tile.tile_type.mask();
        }
        for actor in &self.actors {
            if log.effective_health(actor) > 0 {
                contacts.kinds |= actor.kind.mask();
            }
        }
        contacts
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Surroundings {
    on_ground: bool,
    in_water: bool,
    /// The top of the actor is inside water.
    submerged: bool,
}

/// Shared state an actor reads and writes while it advances.
pub struct StepContext<'a> {
    pub grid: &'a TileGrid,
    pub config: &'a PhysicsConfig,
    pub snapshot: &'a FrameSnapshot,
    pub log: &'a mut FrameLog,
}

#[derive(Clone, Debug)]
pub struct Actor {
    state: KindState,
    profile: MotionProfile,
    health: i32,
    size: Vector<i32>,
    kinematics: Kinematics,
    facing: Facing,
    death_time: f64,
    requests: MovementRequests,
    rules: Vec<ReactionRule>,
    surroundings: Surroundings,
}

impl Actor {
    /// Validates placement and size; health, rules and motion limits come
    /// from the kind's profile in `config`.
    pub fn new(
        state: KindState,
        position: Vector<f64>,
        size: Vector<i32>,
        config: &PhysicsConfig,
    ) -> Result<Self> {
        let kind = state.kind();
        if size.x <= 0 || size.y <= 0 {
            return Err(PhysicsError::InvalidActor(format!(
                "{} needs a positive pixel size, got {}x{}",
                kind.label(),
                size.x,
                size.y
            )));
        }
        if !position.is_finite() || position.x < 0.0 || position.y < 0.0 {
            return Err(PhysicsError::InvalidActor(format!(
                "{} position ({}, {}) must be finite and non-negative",
                kind.label(),
                position.x,
                position.y
            )));
        }
        let profile = *config.profile(kind);
        let mut actor = Self {
            state,
            profile,
            health: profile.begin_health,
            size,
            kinematics: Kinematics {
                position,
                ..Default::default()
            },
            facing: Facing::Right,
            death_time: 0.0,
            requests: MovementRequests::default(),
            rules: default_rules(kind, config),
            surroundings: Surroundings::default(),
        };
        actor.reset_plant_walk();
        Ok(actor)
    }

    pub fn player(position: Vector<f64>, size: Vector<i32>, config: &PhysicsConfig) -> Result<Self> {
        Self::new(KindState::Player, position, size, config)
    }

    pub fn plant(position: Vector<f64>, size: Vector<i32>, config: &PhysicsConfig) -> Result<Self> {
        Self::new(KindState::Plant { direction_time: 0.0 }, position, size, config)
    }

    pub fn slime(
        position: Vector<f64>,
        size: Vector<i32>,
        school: SchoolId,
        config: &PhysicsConfig,
    ) -> Result<Self> {
        Self::new(KindState::Slime { school }, position, size, config)
    }

    pub fn shark(position: Vector<f64>, size: Vector<i32>, config: &PhysicsConfig) -> Result<Self> {
        Self::new(KindState::Shark, position, size, config)
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self.reset_plant_walk();
        self
    }

    /// Attaches an extra reaction rule.
    pub fn with_rule(mut self, rule: ReactionRule) -> Self {
        self.rules.push(rule);
        self
    }

    fn reset_plant_walk(&mut self) {
        if let KindState::Plant { .. } = self.state {
            self.kinematics.speed = Vector::new(self.facing.sign() * self.profile.run_start_speed, 0.0);
        }
    }

    pub fn kind(&self) -> ActorKind {
        self.state.kind()
    }

    pub fn state(&self) -> &KindState {
        &self.state
    }

    pub fn school(&self) -> Option<SchoolId> {
        match self.state {
            KindState::Slime { school } => Some(school),
            _ => None,
        }
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.profile.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Seconds spent at zero health.
    pub fn death_time(&self) -> f64 {
        self.death_time
    }

    pub fn should_be_removed(&self, grace_period: f64) -> bool {
        self.health == 0 && self.death_time > grace_period
    }

    /// Bottom-left corner in meters.
    pub fn position(&self) -> Vector<f64> {
        self.kinematics.position
    }

    pub fn speed(&self) -> Vector<f64> {
        self.kinematics.speed
    }

    pub fn acceleration(&self) -> Vector<f64> {
        self.kinematics.acceleration
    }

    pub fn size(&self) -> Vector<i32> {
        self.size
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_passable(&self) -> bool {
        self.kind().is_passable()
    }

    pub fn is_moving(&self) -> bool {
        self.requests.is_moving()
    }

    pub fn is_ducking(&self) -> bool {
        self.requests.is_ducking()
    }

    pub fn is_on_ground(&self) -> bool {
        self.surroundings.on_ground
    }

    pub fn rules(&self) -> &[ReactionRule] {
        &self.rules
    }

    pub fn profile(&self) -> &MotionProfile {
        &self.profile
    }

    pub fn current_max_speed(&self) -> f64 {
        if self.is_ducking() {
            self.profile.max_speed_ducking
        } else {
            self.profile.max_speed
        }
    }

    pub fn rect(&self, meters_per_pixel: f64) -> PixelRect {
        PixelRect::new(self.kinematics.position.to_pixels(meters_per_pixel), self.size)
    }

    pub fn view(&self, id: ActorId, meters_per_pixel: f64) -> ActorView {
        ActorView {
            id,
            kind: self.kind(),
            rect: self.rect(meters_per_pixel),
            health: self.health,
            max_health: self.profile.max_health,
            school: self.school(),
        }
    }

    // Movement commands. Each motion kind is held by a set of requesters.

    pub fn start_move(&mut self, requester: Requester, direction: Facing) {
        let started = self.requests.press_move(requester, direction);
        if started || self.facing != direction {
            self.run(direction);
        }
    }

    pub fn end_move(&mut self, requester: Requester) {
        match self.requests.release_move(requester, self.facing) {
            MoveRelease::Idle => {}
            MoveRelease::Continue(direction) => {
                if direction != self.facing {
                    self.run(direction);
                }
            }
            MoveRelease::Stopped => {
                self.kinematics.speed = self.kinematics.speed.with_x(0.0);
                self.kinematics.acceleration = self.kinematics.acceleration.with_x(0.0);
            }
        }
    }

    fn run(&mut self, direction: Facing) {
        self.facing = direction;
        let sign = direction.sign();
        self.kinematics.speed = self
            .kinematics
            .speed
            .with_x(sign * self.profile.run_start_speed);
        self.kinematics.acceleration = self
            .kinematics
            .acceleration
            .with_x(sign * self.profile.horizontal_acceleration);
    }

    /// Jumps take off from the ground; sharks may also push off in water.
    /// A press that cannot take off is forgotten, so the requester does not
    /// have to release it before jumping again after landing.
    pub fn start_jump(&mut self, requester: Requester) {
        if !self.can_take_off() {
            return;
        }
        if self.requests.press_jump(requester) {
            self.kinematics.speed = self.kinematics.speed.with_y(self.profile.jump_speed);
        }
    }

    fn can_take_off(&self) -> bool {
        if self.profile.jump_speed <= 0.0 || !self.is_alive() {
            return false;
        }
        let from_water = self.kind() == ActorKind::Shark && self.surroundings.in_water;
        self.surroundings.on_ground || from_water
    }

    pub fn end_jump(&mut self, requester: Requester) {
        if self.requests.release_jump(requester) && self.kinematics.speed.y > 0.0 {
            self.kinematics.speed = self.kinematics.speed.with_y(0.0);
        }
    }

    pub fn start_duck(&mut self, requester: Requester) {
        self.requests.press_duck(requester);
    }

    pub fn end_duck(&mut self, requester: Requester) {
        self.requests.release_duck(requester);
    }

    // Health. Once an actor reaches zero its health never changes again.

    /// Returns the previous health when the value changed.
    pub(crate) fn adjust_health(&mut self, amount: i32) -> Option<i32> {
        if self.health == 0 {
            return None;
        }
        let before = self.health;
        self.health = (before + amount).clamp(0, self.profile.max_health);
        (self.health != before).then_some(before)
    }

    pub(crate) fn kill(&mut self) -> Option<i32> {
        self.adjust_health(-self.health)
    }

    /// Returns the school left behind.
    pub(crate) fn join_school(&mut self, school: SchoolId) -> Option<SchoolId> {
        match &mut self.state {
            KindState::Slime { school: current } if *current != school => {
                let previous = *current;
                *current = school;
                Some(previous)
            }
            _ => None,
        }
    }

    /// Health change caused by this actor's own sub-step. Slimes that lose
    /// health pass a fixed amount of damage on to their live schoolmates.
    fn change_own_health(&mut self, id: ActorId, amount: i32, ctx: &mut StepContext<'_>) {
        let Some(before) = self.adjust_health(amount) else {
            return;
        };
        record_health_change(ctx.log, id, before, self.health);
        if self.health >= before {
            return;
        }
        if let KindState::Slime { school } = self.state {
            for mate in ctx.snapshot.schoolmates(school, id) {
                ctx.log.defer(Effect::HealthDelta {
                    target: mate.id,
                    amount: -ctx.config.group_damage,
                });
            }
        }
    }

    fn apply_own_effect(&mut self, id: ActorId, effect: Effect, ctx: &mut StepContext<'_>) {
        match effect {
            Effect::HealthDelta { amount, .. } => self.change_own_health(id, amount, ctx),
            Effect::Kill { .. } => {
                if let Some(before) = self.kill() {
                    record_health_change(ctx.log, id, before, 0);
                }
            }
            Effect::SwitchSchool { school, .. } => {
                if let Some(previous) = self.join_school(school) {
                    debug!(
                        "[tileworld] Slime {} switched from school {} to {}",
                        id.0, previous.0, school.0
                    );
                }
            }
        }
    }

    // Time advancement.

    /// Advances this actor by `dt` seconds in sub-steps that never move it
    /// more than one pixel per axis. Dead actors only age their death timer.
    pub fn advance_time(&mut self, id: ActorId, dt: f64, ctx: &mut StepContext<'_>) -> Result<()> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(PhysicsError::InvalidArgument(format!(
                "time step must be finite and non-negative, got {dt}"
            )));
        }
        let mut remaining = dt;
        while remaining > 0.0 {
            if !self.is_alive() {
                self.death_time += remaining;
                break;
            }
            remaining -= self.sub_step(id, remaining, ctx);
        }
        self.refresh_surroundings(id, ctx.grid, ctx.snapshot, ctx.config.meters_per_pixel);
        Ok(())
    }

    pub(crate) fn refresh_surroundings(
        &mut self,
        id: ActorId,
        grid: &TileGrid,
        snapshot: &FrameSnapshot,
        meters_per_pixel: f64,
    ) {
        let detection = self.detect(id, grid, snapshot, meters_per_pixel);
        self.surroundings = surroundings_of(&detection);
    }

    fn sub_step(&mut self, id: ActorId, remaining: f64, ctx: &mut StepContext<'_>) -> f64 {
        let mpp = ctx.config.meters_per_pixel;
        self.refresh_surroundings(id, ctx.grid, ctx.snapshot, mpp);
        self.apply_forces(ctx.config);

        let dt = physics_core::sub_step_duration(&self.kinematics, remaining, mpp);
        self.kinematics = physics_core::integrate(&self.kinematics, dt);
        let max_speed = self.current_max_speed();
        physics_core::clip_horizontal_speed(&mut self.kinematics, max_speed);
        let limit = ctx.grid.size_in_pixels();
        let max_position = Vector::new(limit.x - 1, limit.y - 1).to_meters(mpp);
        if physics_core::clip_to_world(&mut self.kinematics, max_position) {
            self.fall_out(id, ctx.log);
            return dt;
        }

        let detection = self.detect(id, ctx.grid, ctx.snapshot, mpp);
        physics_core::resolve_blocking(&mut self.kinematics, self.size, &detection.obstacles(), mpp);
        self.react(id, &detection, dt, ctx);
        self.advance_plant_walk(dt, ctx.config);
        dt
    }

    fn fall_out(&mut self, id: ActorId, log: &mut FrameLog) {
        if let Some(before) = self.kill() {
            debug!("[tileworld] {} {} fell out of the world", self.kind().label(), id.0);
            record_health_change(log, id, before, 0);
        }
    }

    /// Gravity and the per-kind exceptions to it.
    fn apply_forces(&mut self, config: &PhysicsConfig) {
        let Surroundings {
            on_ground,
            submerged,
            ..
        } = self.surroundings;
        let Kinematics {
            mut speed,
            mut acceleration,
            ..
        } = self.kinematics;

        match self.state {
            KindState::Plant { .. } => {
                acceleration = Vector::new(0.0, 0.0);
                speed = speed.with_y(0.0);
            }
            KindState::Shark if on_ground || submerged => {
                if submerged && !on_ground && acceleration.y != 0.0 {
                    speed = speed.with_y(0.0);
                }
                acceleration = acceleration.with_y(0.0);
                if on_ground {
                    speed = speed.with_y(speed.y.max(0.0));
                }
            }
            _ if on_ground => {
                acceleration = acceleration.with_y(0.0);
                speed = speed.with_y(speed.y.max(0.0));
            }
            _ => acceleration = acceleration.with_y(config.gravity),
        }

        self.kinematics.speed = speed;
        self.kinematics.acceleration = acceleration;
    }

    fn advance_plant_walk(&mut self, dt: f64, config: &PhysicsConfig) {
        let KindState::Plant { direction_time } = &mut self.state else {
            return;
        };
        *direction_time += dt;
        if *direction_time >= config.plant_move_time {
            *direction_time -= config.plant_move_time;
            self.facing = self.facing.flipped();
            self.kinematics.speed = Vector::new(self.facing.sign() * self.profile.run_start_speed, 0.0);
        }
    }

    fn detect(
        &self,
        id: ActorId,
        grid: &TileGrid,
        snapshot: &FrameSnapshot,
        meters_per_pixel: f64,
    ) -> Detection {
        let own = self.rect(meters_per_pixel);
        let tile_mask = self.kind().collidable_tiles();
        let kind_mask = self.kind().collidable_kinds();
        let tiles = grid
            .tiles_overlapping(own.origin, own.top_right())
            .into_iter()
            .filter(|t| tile_mask.includes(t.tile_type))
            .collect();
        let actors = if kind_mask.is_empty() {
            Vec::new()
        } else {
            snapshot
                .overlapping(own, id)
                .into_iter()
                .filter(|v| kind_mask.includes(v.kind))
                .collect()
        };
        Detection { own, tiles, actors }
    }

    /// Reaction rules, then one pairwise hook per touched actor.
    fn react(&mut self, id: ActorId, detection: &Detection, dt: f64, ctx: &mut StepContext<'_>) {
        let contacts = detection.contacts(ctx.log);
        let fired: Vec<i32> = self
            .rules
            .iter_mut()
            .filter_map(|rule| rule.tick(&contacts, dt))
            .collect();
        for amount in fired {
            self.change_own_health(id, amount, ctx);
        }

        let mpp = ctx.config.meters_per_pixel;
        for other in &detection.actors {
            if !self.is_alive() {
                return;
            }
            let Some(hook) = pair_hook(self.kind(), other.kind) else {
                continue;
            };
            let other = ActorView {
                health: ctx.log.effective_health(other),
                ..*other
            };
            let pair_ctx = PairContext {
                config: ctx.config,
                snapshot: ctx.snapshot,
            };
            let outcome = hook(&self.view(id, mpp), &other, &pair_ctx);
            for (name, data) in outcome.events {
                ctx.log.record(name, data, id);
            }
            for effect in outcome.effects {
                if effect.target() == id {
                    self.apply_own_effect(id, effect, ctx);
                } else {
                    ctx.log.defer(effect);
                }
            }
        }
    }
}

fn surroundings_of(detection: &Detection) -> Surroundings {
    let own = detection.own;
    let on_ground = detection
        .obstacles()
        .into_iter()
        .any(|rect| physics_core::rests_on(own, rect));
    let mut in_water = false;
    let mut submerged = false;
    for tile in detection.tiles.iter().filter(|t| t.tile_type == TileType::Water) {
        in_water = true;
        let overlap = kind_of_overlap(own, tile.rect());
        if overlap.y < 0 || overlap.y == own.size.y {
            submerged = true;
        }
    }
    Surroundings {
        on_ground,
        in_water,
        submerged,
    }
}

fn record_health_change(log: &mut FrameLog, id: ActorId, before: i32, after: i32) {
    log.record(
        "health_changed",
        serde_json::json!({ "from": before, "to": after }),
        id,
    );
    if after == 0 {
        log.record("death", serde_json::json!({}), id);
    }
}
