use crate::components::{ActorKind, KindMask, TileMask};
use crate::config::PhysicsConfig;

/// What a rule reacts to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReactionFilter {
    Tiles(TileMask),
    Actors(KindMask),
}

/// Everything an actor touched during one sub-step.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Contacts {
    pub tiles: TileMask,
    /// Only actors that were alive.
    pub kinds: KindMask,
}

/// Timed health change applied while a contact persists.
#[derive(Clone, Debug, PartialEq)]
pub struct ReactionRule {
    pub amount: i32,
    pub cooldown: f64,
    pub filter: ReactionFilter,
    time_since_last: f64,
}

impl ReactionRule {
    /// New rules start ready to fire.
    pub fn new(amount: i32, cooldown: f64, filter: ReactionFilter) -> Self {
        Self {
            amount,
            cooldown,
            filter,
            time_since_last: cooldown,
        }
    }

    pub fn time_since_last(&self) -> f64 {
        self.time_since_last
    }

    pub fn matches(&self, contacts: &Contacts) -> bool {
        match self.filter {
            ReactionFilter::Tiles(mask) => mask.intersects(contacts.tiles),
            ReactionFilter::Actors(mask) => mask.intersects(contacts.kinds),
        }
    }

    /// Advances the rule by one sub-step and returns the amount to apply when
    /// it fires.
    pub fn tick(&mut self, contacts: &Contacts, dt: f64) -> Option<i32> {
        if !self.matches(contacts) {
            return None;
        }
        if self.time_since_last >= self.cooldown {
            self.time_since_last = 0.0;
            Some(self.amount)
        } else {
            self.time_since_last += dt;
            None
        }
    }
}

/// Rules every actor of `kind` starts with.
pub fn default_rules(kind: ActorKind, config: &PhysicsConfig) -> Vec<ReactionRule> {
    let magma = ReactionRule::new(
        config.magma_damage,
        config.magma_cooldown,
        ReactionFilter::Tiles(TileMask::MAGMA),
    );
    let water = ReactionRule::new(
        config.water_damage,
        config.water_cooldown,
        ReactionFilter::Tiles(TileMask::WATER),
    );
    let enemies = |mask: KindMask| {
        ReactionRule::new(
            config.enemy_contact_damage,
            config.enemy_contact_cooldown,
            ReactionFilter::Actors(mask),
        )
    };

    match kind {
        ActorKind::Player => vec![magma, water, enemies(KindMask::SLIME | KindMask::SHARK)],
        ActorKind::Plant => Vec::new(),
        ActorKind::Slime => vec![magma, water, enemies(KindMask::PLAYER | KindMask::SHARK)],
        ActorKind::Shark => vec![
            magma,
            ReactionRule::new(
                config.shark_air_damage,
                config.shark_air_cooldown,
                ReactionFilter::Tiles(TileMask::AIR),
            ),
            enemies(KindMask::PLAYER | KindMask::SLIME),
        ],
    }
}
