use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::components::Facing;

/// Identifies who asked for a motion, so releases from one source never
/// cancel a motion another source still holds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub struct Requester(pub u32);

impl Requester {
    /// Keyboard or gamepad.
    pub const INPUT: Requester = Requester(0);
    /// An attached behaviour program.
    pub const PROGRAM: Requester = Requester(1);
}

/// Result of releasing a horizontal move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveRelease {
    /// Nothing was moving; the release is ignored.
    Idle,
    /// Someone still holds a direction.
    Continue(Facing),
    Stopped,
}

/// Reference-counted requester sets per motion kind.
#[derive(Clone, Debug, Default)]
pub struct MovementRequests {
    left: BTreeSet<Requester>,
    right: BTreeSet<Requester>,
    jump: BTreeSet<Requester>,
    duck: BTreeSet<Requester>,
}

impl MovementRequests {
    pub fn is_moving(&self) -> bool {
        !self.left.is_empty() || !self.right.is_empty()
    }

    pub fn is_ducking(&self) -> bool {
        !self.duck.is_empty()
    }

    fn direction_mut(&mut self, direction: Facing) -> &mut BTreeSet<Requester> {
        match direction {
            Facing::Left => &mut self.left,
            Facing::Right => &mut self.right,
        }
    }

    fn direction(&self, direction: Facing) -> &BTreeSet<Requester> {
        match direction {
            Facing::Left => &self.left,
            Facing::Right => &self.right,
        }
    }

    /// Records that `requester` moves towards `direction`, withdrawing any
    /// earlier opposite request from the same source. Returns true when the
    /// actor was not moving before.
    pub fn press_move(&mut self, requester: Requester, direction: Facing) -> bool {
        let was_moving = self.is_moving();
        self.direction_mut(direction.flipped()).remove(&requester);
        self.direction_mut(direction).insert(requester);
        !was_moving
    }

    /// `facing` is the direction the actor currently moves in.
    pub fn release_move(&mut self, requester: Requester, facing: Facing) -> MoveRelease {
        if !self.is_moving() {
            return MoveRelease::Idle;
        }
        self.left.remove(&requester);
        self.right.remove(&requester);
        if !self.is_moving() {
            MoveRelease::Stopped
        } else if self.direction(facing).is_empty() {
            MoveRelease::Continue(facing.flipped())
        } else {
            MoveRelease::Continue(facing)
        }
    }

    /// True on the empty to non-empty transition.
    pub fn press_jump(&mut self, requester: Requester) -> bool {
        let was_empty = self.jump.is_empty();
        self.jump.insert(requester);
        was_empty
    }

    /// True when the last holder let go.
    pub fn release_jump(&mut self, requester: Requester) -> bool {
        self.jump.remove(&requester) && self.jump.is_empty()
    }

    pub fn press_duck(&mut self, requester: Requester) -> bool {
        let was_empty = self.duck.is_empty();
        self.duck.insert(requester);
        was_empty
    }

    pub fn release_duck(&mut self, requester: Requester) -> bool {
        self.duck.remove(&requester) && self.duck.is_empty()
    }
}
