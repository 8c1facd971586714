use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

/// Stable handle of an actor inside its world; ids grow with insertion order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub struct SchoolId(pub u32);

/// Terrain classification of one grid cell.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub enum TileType {
    Air,
    Ground,
    Water,
    Magma,
}

impl TileType {
    pub fn is_passable(self) -> bool {
        self != TileType::Ground
    }

    pub fn mask(self) -> TileMask {
        match self {
            TileType::Air => TileMask::AIR,
            TileType::Ground => TileMask::GROUND,
            TileType::Water => TileMask::WATER,
            TileType::Magma => TileMask::MAGMA,
        }
    }
}

bitflags! {
    /// Set of tile types an actor collides with or a rule reacts to.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
    pub struct TileMask: u8 {
        const AIR    = 1 << 0;
        const GROUND = 1 << 1;
        const WATER  = 1 << 2;
        const MAGMA  = 1 << 3;
    }
}

impl TileMask {
    pub fn includes(self, tile: TileType) -> bool {
        self.contains(tile.mask())
    }
}

/// Closed set of actor species.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Player,
    Plant,
    Slime,
    Shark,
}

impl ActorKind {
    pub const ALL: [ActorKind; 4] = [
        ActorKind::Player,
        ActorKind::Plant,
        ActorKind::Slime,
        ActorKind::Shark,
    ];

    pub fn mask(self) -> KindMask {
        match self {
            ActorKind::Player => KindMask::PLAYER,
            ActorKind::Plant => KindMask::PLANT,
            ActorKind::Slime => KindMask::SLIME,
            ActorKind::Shark => KindMask::SHARK,
        }
    }

    /// Tile types this kind detects at all. Blocking still requires an
    /// impassable tile; the rest only feed reaction rules.
    pub fn collidable_tiles(self) -> TileMask {
        match self {
            ActorKind::Player | ActorKind::Slime => {
                TileMask::GROUND | TileMask::WATER | TileMask::MAGMA
            }
            ActorKind::Plant => TileMask::GROUND,
            ActorKind::Shark => TileMask::all(),
        }
    }

    /// Actor kinds this kind detects during its own sub-steps.
    pub fn collidable_kinds(self) -> KindMask {
        match self {
            ActorKind::Player => KindMask::PLANT | KindMask::SLIME | KindMask::SHARK,
            // Plants are found by the player, never the other way round.
            ActorKind::Plant => KindMask::empty(),
            ActorKind::Slime | ActorKind::Shark => {
                KindMask::PLAYER | KindMask::SLIME | KindMask::SHARK
            }
        }
    }

    pub fn is_passable(self) -> bool {
        self == ActorKind::Plant
    }

    pub fn label(self) -> &'static str {
        match self {
            ActorKind::Player => "player",
            ActorKind::Plant => "plant",
            ActorKind::Slime => "slime",
            ActorKind::Shark => "shark",
        }
    }
}

bitflags! {
    /// Set of actor kinds.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
    pub struct KindMask: u8 {
        const PLAYER = 1 << 0;
        const PLANT  = 1 << 1;
        const SLIME  = 1 << 2;
        const SHARK  = 1 << 3;
    }
}

impl KindMask {
    pub fn includes(self, kind: ActorKind) -> bool {
        self.contains(kind.mask())
    }
}

/// Horizontal facing; only the two signs are representable.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f64 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

impl TryFrom<f64> for Facing {
    type Error = PhysicsError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value == 1.0 {
            Ok(Facing::Right)
        } else if value == -1.0 {
            Ok(Facing::Left)
        } else {
            Err(PhysicsError::InvalidArgument(format!(
                "facing must be -1 or +1, got {value}"
            )))
        }
    }
}
