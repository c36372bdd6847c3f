//! Physics materials defining surface properties

use rapier2d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Physics material defining friction, restitution and density
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Friction coefficient (0 = frictionless)
    pub friction: f32,
    /// Restitution/bounciness (0 = no bounce, 1 = perfect bounce)
    pub restitution: f32,
    /// Density for mass calculation
    pub density: f32,
    /// How friction is combined between two colliders
    pub friction_combine: CombineRule,
    /// How restitution is combined between two colliders
    pub restitution_combine: CombineRule,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 1.0,
            restitution: 0.2,
            density: 2.0,
            friction_combine: CombineRule::Average,
            restitution_combine: CombineRule::Max,
        }
    }
}

impl PhysicsMaterial {
    /// Create a new physics material
    pub fn new(density: f32, friction: f32, restitution: f32) -> Self {
        Self {
            density,
            friction,
            restitution,
            ..Default::default()
        }
    }
}

/// How to combine material properties between two colliders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombineRule {
    /// Average of both values
    #[default]
    Average,
    /// Minimum of both values
    Min,
    /// Product of both values
    Multiply,
    /// Maximum of both values
    Max,
}

impl From<CombineRule> for rapier::CoefficientCombineRule {
    fn from(rule: CombineRule) -> Self {
        match rule {
            CombineRule::Average => rapier::CoefficientCombineRule::Average,
            CombineRule::Min => rapier::CoefficientCombineRule::Min,
            CombineRule::Multiply => rapier::CoefficientCombineRule::Multiply,
            CombineRule::Max => rapier::CoefficientCombineRule::Max,
        }
    }
}
