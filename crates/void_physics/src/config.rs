//! Physics configuration

use serde::{Deserialize, Serialize};
use void_math::Vec2;

/// Physics world configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsConfig {
    /// Gravity vector (default: +10 in Y, screen space points down)
    pub gravity: Vec2,

    /// Fixed timestep for one simulation step
    pub timestep: f32,

    /// Solver iterations per step
    pub velocity_iterations: usize,

    /// Enable sleeping for inactive bodies
    pub sleeping_enabled: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 10.0),
            timestep: 1.0 / 60.0,
            velocity_iterations: 10,
            sleeping_enabled: true,
        }
    }
}

impl PhysicsConfig {
    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    /// Set timestep
    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    /// Allow or forbid bodies to sleep
    pub fn with_sleeping(mut self, enabled: bool) -> Self {
        self.sleeping_enabled = enabled;
        self
    }

    /// Check the values rapier cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        if !self.gravity.is_finite() {
            return Err(crate::PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        if !(self.timestep > 0.0 && self.timestep.is_finite()) {
            return Err(crate::PhysicsError::InvalidConfig(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        if self.velocity_iterations == 0 {
            return Err(crate::PhysicsError::InvalidConfig(
                "velocity_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
