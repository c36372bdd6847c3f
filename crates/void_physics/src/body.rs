//! Rigid body types

use rapier2d::prelude as rapier;
use serde::{Deserialize, Serialize};
use void_math::Vec2;

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidBodyHandle(pub(crate) rapier::RigidBodyHandle);

/// Type of rigid body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RigidBodyType {
    /// Static body - never moves, infinite mass
    Static,
    /// Dynamic body - fully simulated
    #[default]
    Dynamic,
    /// Kinematic body - moved by velocity, pushes dynamic bodies
    Kinematic,
}

impl From<RigidBodyType> for rapier::RigidBodyType {
    fn from(t: RigidBodyType) -> Self {
        match t {
            RigidBodyType::Static => rapier::RigidBodyType::Fixed,
            RigidBodyType::Dynamic => rapier::RigidBodyType::Dynamic,
            RigidBodyType::Kinematic => rapier::RigidBodyType::KinematicVelocityBased,
        }
    }
}

/// Description for creating a rigid body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBodyDesc {
    /// Type of rigid body
    pub body_type: RigidBodyType,
    /// Initial position
    pub position: Vec2,
    /// Initial rotation in radians
    pub rotation: f32,
    /// Gravity scale (0 = no gravity, 1 = normal, 2 = double)
    pub gravity_scale: f32,
    /// Linear damping (air resistance)
    pub linear_damping: f32,
    /// Angular damping (rotational resistance)
    pub angular_damping: f32,
    /// Prevent the body from rotating
    pub fixed_rotation: bool,
    /// Enable continuous collision detection
    pub ccd_enabled: bool,
    /// Can this body sleep when inactive
    pub can_sleep: bool,
    /// Does the body participate in the simulation at all
    pub enabled: bool,
    /// User data (entity ID)
    pub user_data: u128,
}

impl Default for RigidBodyDesc {
    fn default() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            position: Vec2::ZERO,
            rotation: 0.0,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            fixed_rotation: false,
            ccd_enabled: false,
            can_sleep: true,
            enabled: true,
            user_data: 0,
        }
    }
}

impl RigidBodyDesc {
    /// Body description of the given type
    pub fn new(body_type: RigidBodyType) -> Self {
        Self {
            body_type,
            ..Default::default()
        }
    }

    /// Create a static body description
    pub fn fixed() -> Self {
        Self::new(RigidBodyType::Static)
    }

    /// Create a dynamic body description
    pub fn dynamic() -> Self {
        Self::new(RigidBodyType::Dynamic)
    }

    /// Set position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    /// Set rotation (radians)
    pub fn with_rotation(mut self, angle: f32) -> Self {
        self.rotation = angle;
        self
    }

    /// Lock rotation
    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    /// Enable CCD
    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd_enabled = enabled;
        self
    }

    /// Allow sleeping
    pub fn with_can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    /// Enable or disable the body
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set user data
    pub fn with_user_data(mut self, data: u128) -> Self {
        self.user_data = data;
        self
    }

    /// Build a Rapier rigid body builder
    pub(crate) fn to_rapier_builder(&self) -> rapier::RigidBodyBuilder {
        let locked = if self.fixed_rotation {
            rapier::LockedAxes::ROTATION_LOCKED
        } else {
            rapier::LockedAxes::empty()
        };

        rapier::RigidBodyBuilder::new(self.body_type.into())
            .translation(rapier::Vector::new(self.position.x, self.position.y))
            .rotation(self.rotation)
            .gravity_scale(self.gravity_scale)
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .locked_axes(locked)
            .ccd_enabled(self.ccd_enabled)
            .can_sleep(self.can_sleep)
            .enabled(self.enabled)
            .user_data(self.user_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_desc() {
        let desc = RigidBodyDesc::fixed().with_position(1.0, 2.0);
        assert_eq!(desc.body_type, RigidBodyType::Static);
        assert_eq!(desc.position, Vec2::new(1.0, 2.0));
        assert!(desc.enabled);
    }

    #[test]
    fn test_builder_flags_reach_rapier() {
        let body = RigidBodyDesc::new(RigidBodyType::Kinematic)
            .with_ccd(true)
            .with_enabled(false)
            .with_can_sleep(false)
            .with_user_data(7)
            .to_rapier_builder()
            .build();
        assert!(body.is_kinematic());
        assert!(body.is_ccd_enabled());
        assert!(!body.is_enabled());
        assert_eq!(body.user_data, 7);
    }

    #[test]
    fn test_body_type_maps_to_rapier() {
        let fixed: rapier::RigidBodyType = RigidBodyType::Static.into();
        assert_eq!(fixed, rapier::RigidBodyType::Fixed);
        let dynamic: rapier::RigidBodyType = RigidBodyType::Dynamic.into();
        assert_eq!(dynamic, rapier::RigidBodyType::Dynamic);
    }
}
