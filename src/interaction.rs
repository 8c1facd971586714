use std::collections::BTreeMap;

use crate::components::{ActorId, ActorKind, SchoolId};
use crate::config::PhysicsConfig;
use crate::physics_core::PixelRect;
use crate::spatial_hash::SpatialHash;

/// Frame-start copy of the parts of an actor others may look at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorView {
    pub id: ActorId,
    pub kind: ActorKind,
    pub rect: PixelRect,
    pub health: i32,
    pub max_health: i32,
    pub school: Option<SchoolId>,
}

impl ActorView {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn is_passable(&self) -> bool {
        self.kind.is_passable()
    }
}

/// Every actor as it was when the frame started. Rectangles are the one
/// exception: the world moves an actor's rectangle as soon as that actor has
/// finished its step, so later actors collide with where it really is.
#[derive(Debug, Default)]
pub struct FrameSnapshot {
    views: BTreeMap<ActorId, ActorView>,
    school_sizes: BTreeMap<SchoolId, usize>,
    hash: SpatialHash,
}

impl FrameSnapshot {
    pub fn new(views: impl IntoIterator<Item = ActorView>, cell_size: i32) -> Self {
        let mut hash = SpatialHash::new(cell_size);
        let mut school_sizes = BTreeMap::new();
        let mut by_id = BTreeMap::new();
        for view in views {
            hash.insert(view.id, view.rect);
            if let (Some(school), true) = (view.school, view.is_alive()) {
                *school_sizes.entry(school).or_insert(0) += 1;
            }
            by_id.insert(view.id, view);
        }
        Self {
            views: by_id,
            school_sizes,
            hash,
        }
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorView> {
        self.views.get(&id)
    }

    pub fn relocate(&mut self, id: ActorId, rect: PixelRect) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if view.rect == rect {
            return;
        }
        self.hash.remove(id, view.rect);
        view.rect = rect;
        self.hash.insert(id, rect);
    }

    /// Actors other than `exclude` whose rectangles meet `rect`, by id.
    pub fn overlapping(&self, rect: PixelRect, exclude: ActorId) -> Vec<ActorView> {
        self.hash
            .query_rect(rect)
            .into_iter()
            .filter(|id| *id != exclude)
            .filter_map(|id| self.views.get(&id))
            .filter(|view| view.rect.overlaps(&rect))
            .copied()
            .collect()
    }

    /// Live members at frame start.
    pub fn school_size(&self, school: SchoolId) -> usize {
        self.school_sizes.get(&school).copied().unwrap_or(0)
    }

    pub fn schoolmates(&self, school: SchoolId, except: ActorId) -> impl Iterator<Item = &ActorView> {
        self.views
            .values()
            .filter(move |v| v.id != except && v.school == Some(school) && v.is_alive())
    }
}

/// Change to one actor caused during another actor's sub-step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    HealthDelta { target: ActorId, amount: i32 },
    Kill { target: ActorId },
    SwitchSchool { target: ActorId, school: SchoolId },
}

impl Effect {
    pub fn target(&self) -> ActorId {
        match *self {
            Effect::HealthDelta { target, .. }
            | Effect::Kill { target }
            | Effect::SwitchSchool { target, .. } => target,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PendingEvent {
    pub name: &'static str,
    pub data: serde_json::Value,
    pub source: ActorId,
}

/// Cross-actor writes and events collected during one frame, applied by the
/// world after every actor has advanced, in the order they were recorded.
#[derive(Debug, Default)]
pub struct FrameLog {
    effects: Vec<Effect>,
    events: Vec<PendingEvent>,
}

impl FrameLog {
    pub fn defer(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn record(&mut self, name: &'static str, data: serde_json::Value, source: ActorId) {
        self.events.push(PendingEvent { name, data, source });
    }

    /// Health of `view` once the effects recorded so far land.
    pub fn effective_health(&self, view: &ActorView) -> i32 {
        if view.health == 0 {
            return 0;
        }
        let mut health = view.health;
        for effect in self.effects.iter().filter(|e| e.target() == view.id) {
            match *effect {
                Effect::HealthDelta { amount, .. } => {
                    health = (health + amount).clamp(0, view.max_health);
                }
                Effect::Kill { .. } => health = 0,
                Effect::SwitchSchool { .. } => {}
            }
            if health == 0 {
                return 0;
            }
        }
        health
    }

    pub fn into_parts(self) -> (Vec<Effect>, Vec<PendingEvent>) {
        (self.effects, self.events)
    }
}

/// Tunables and frame-start data a pair reaction may consult.
pub struct PairContext<'a> {
    pub config: &'a PhysicsConfig,
    pub snapshot: &'a FrameSnapshot,
}

/// Outcome of a pairwise reaction; events are attributed to `own`.
#[derive(Debug, Default, PartialEq)]
pub struct PairOutcome {
    pub effects: Vec<Effect>,
    pub events: Vec<(&'static str, serde_json::Value)>,
}

/// `own` is the actor taking the sub-step, `other` the one it touched.
pub type PairHook = fn(&ActorView, &ActorView, &PairContext<'_>) -> PairOutcome;

/// Reaction for an unordered pair of kinds.
pub fn pair_hook(a: ActorKind, b: ActorKind) -> Option<PairHook> {
    let key = if a <= b { (a, b) } else { (b, a) };
    match key {
        (ActorKind::Player, ActorKind::Plant) => Some(player_eats_plant as PairHook),
        (ActorKind::Slime, ActorKind::Slime) => Some(slime_joins_larger_school as PairHook),
        _ => None,
    }
}

fn player_eats_plant(own: &ActorView, other: &ActorView, ctx: &PairContext<'_>) -> PairOutcome {
    let (player, plant) = if own.kind == ActorKind::Player {
        (own, other)
    } else {
        (other, own)
    };
    if !plant.is_alive() || player.health >= player.max_health {
        return PairOutcome::default();
    }
    PairOutcome {
        effects: vec![
            Effect::HealthDelta {
                target: player.id,
                amount: ctx.config.plant_heal,
            },
            Effect::Kill { target: plant.id },
        ],
        events: vec![(
            "plant_eaten",
            serde_json::json!({ "player": player.id.0, "plant": plant.id.0 }),
        )],
    }
}

fn slime_joins_larger_school(own: &ActorView, other: &ActorView, ctx: &PairContext<'_>) -> PairOutcome {
    let (Some(mine), Some(theirs)) = (own.school, other.school) else {
        return PairOutcome::default();
    };
    if mine == theirs || ctx.snapshot.school_size(theirs) <= ctx.snapshot.school_size(mine) {
        return PairOutcome::default();
    }
    PairOutcome {
        effects: vec![Effect::SwitchSchool {
            target: own.id,
            school: theirs,
        }],
        events: vec![(
            "school_switched",
            serde_json::json!({ "from": mine.0, "to": theirs.0 }),
        )],
    }
}
