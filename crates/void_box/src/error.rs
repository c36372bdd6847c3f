//! Error types for worlds and entities

use crate::entity::EntityId;
use thiserror::Error;
use void_physics::PhysicsError;

/// World errors
#[derive(Debug, Error)]
pub enum WorldError {
    /// The physics engine rejected an operation
    #[error(transparent)]
    Physics(#[from] PhysicsError),

    /// No live entity with this id
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Invalid configuration
    #[error("Invalid world configuration: {0}")]
    InvalidConfig(String),

    /// A previous frame failed; the world no longer advances
    #[error("World halted after a failed frame")]
    Halted,

    /// `frame` was called from inside a running frame
    #[error("Frame requested while a frame is already running")]
    Reentrant,
}

/// Result type for world operations
pub type Result<T> = std::result::Result<T, WorldError>;
