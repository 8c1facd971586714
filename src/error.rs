use thiserror::Error;

use crate::vector::Vector;

/// Errors reported by the world, its grid, and actor construction.
#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("{what} {position:?} lies outside the world")]
    OutOfBounds {
        what: &'static str,
        position: Vector<i32>,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid actor: {0}")]
    InvalidActor(String),

    #[error("no actor with id {0}")]
    UnknownActor(u64),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
