//! Discrete-time physics and collision engine for tile-based platform levels.
//!
//! A [`World`] owns a [`TileGrid`] and a set of [`Actor`]s. Each call to
//! [`World::advance_time`] moves every actor in sub-steps of at most one pixel,
//! corrects blocking overlaps, runs timed contact reactions and finally removes
//! actors that stayed dead past the grace period.

pub mod actor;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod interaction;
pub mod movement;
pub mod physics_core;
pub mod plugin;
pub mod reactions;
pub mod spatial_hash;
pub mod tilemap;
pub mod vector;
pub mod world;

pub use actor::{Actor, KindState};
pub use components::{ActorId, ActorKind, Facing, SchoolId, TileType};
pub use config::PhysicsConfig;
pub use error::{PhysicsError, Result};
pub use movement::Requester;
pub use plugin::{LevelOutcome, LevelWorld, TileWorldPlugin};
pub use tilemap::TileGrid;
pub use vector::Vector;
pub use world::{World, WorldSnapshot};
