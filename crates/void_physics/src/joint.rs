//! Joints between two rigid bodies

use rapier2d::prelude as rapier;
use serde::{Deserialize, Serialize};
use void_math::Vec2;

/// Anchors closer than this make a distance joint a pin
const MIN_DISTANCE: f32 = 1e-4;

/// Motors reach their target speed within a few steps; max force is the limit
const MOTOR_GAIN: f32 = 1000.0;

/// Handle to a joint in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointHandle(pub(crate) rapier::ImpulseJointHandle);

/// Kind of constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    /// Keeps the anchors at exactly their initial distance
    #[default]
    Distance,
    /// Shared pivot, free rotation
    Revolute,
    /// Couples two other joints (not expressible with impulse joints)
    Gear,
    /// Damps relative motion at the shared anchor
    Friction,
    /// Translation along one axis, no rotation
    Prismatic,
    /// Rigid attachment
    Weld,
    /// Rope over two ground pulleys (not expressible with impulse joints)
    Pulley,
    /// Pulls the second body toward the first body's centre
    Mouse,
    /// Translation along one axis, free rotation
    Line,
}

impl JointKind {
    /// Whether anchors are derived from body centres and offsets
    pub fn uses_anchors(&self) -> bool {
        !matches!(self, Self::Mouse)
    }

    /// Whether both bodies meet at one world anchor. Only distance joints
    /// take a separate anchor on each body.
    pub fn shares_anchor(&self) -> bool {
        matches!(
            self,
            Self::Revolute | Self::Weld | Self::Friction | Self::Prismatic | Self::Line
        )
    }
}

/// Motor settings for revolute and prismatic joints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointMotor {
    /// Target speed (rad/s or m/s)
    pub speed: f32,
    /// Maximum force (or torque) the motor may apply
    pub max_force: f32,
}

/// Description for creating a joint. Anchors are in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct JointDesc {
    pub kind: JointKind,
    pub anchor1: Vec2,
    pub anchor2: Vec2,
    /// Let the two connected bodies collide with each other
    pub collide_connected: bool,
    pub motor: Option<JointMotor>,
    /// Axis for prismatic and line joints
    pub axis: Vec2,
    /// Spring stiffness for mouse joints
    pub stiffness: f32,
    /// Damping for friction and mouse joints
    pub damping: f32,
}

impl Default for JointDesc {
    fn default() -> Self {
        Self {
            kind: JointKind::Distance,
            anchor1: Vec2::ZERO,
            anchor2: Vec2::ZERO,
            collide_connected: false,
            motor: None,
            axis: Vec2::new(1.0, 0.0),
            stiffness: 1000.0,
            damping: 1.0,
        }
    }
}

impl JointDesc {
    /// Create a joint description of a given kind
    pub fn new(kind: JointKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Set world-space anchors
    pub fn with_anchors(mut self, anchor1: Vec2, anchor2: Vec2) -> Self {
        self.anchor1 = anchor1;
        self.anchor2 = anchor2;
        self
    }

    /// Allow the connected bodies to collide
    pub fn with_collide_connected(mut self, collide: bool) -> Self {
        self.collide_connected = collide;
        self
    }

    /// Drive the joint with a motor
    pub fn with_motor(mut self, speed: f32, max_force: f32) -> Self {
        self.motor = Some(JointMotor { speed, max_force });
        self
    }

    /// Set the translation axis
    pub fn with_axis(mut self, x: f32, y: f32) -> Self {
        self.axis = Vec2::new(x, y);
        self
    }

    /// Build a Rapier joint from anchors already in body-local space.
    /// Returns `None` for kinds Rapier has no impulse joint for.
    pub(crate) fn to_rapier(
        &self,
        local1: rapier::Point<f32>,
        local2: rapier::Point<f32>,
    ) -> Option<rapier::GenericJoint> {
        let axis = rapier2d::na::Unit::new_normalize(rapier::Vector::new(self.axis.x, self.axis.y));

        let mut joint: rapier::GenericJoint = match self.kind {
            JointKind::Distance => {
                let rest = (self.anchor2 - self.anchor1).length();
                if rest <= MIN_DISTANCE {
                    // Coincident anchors: a pin
                    rapier::RevoluteJointBuilder::new()
                        .local_anchor1(local1)
                        .local_anchor2(local2)
                        .build()
                        .into()
                } else {
                    // Rope whose lower limit equals its upper one: rigid both ways
                    let mut joint: rapier::GenericJoint = rapier::RopeJointBuilder::new(rest)
                        .local_anchor1(local1)
                        .local_anchor2(local2)
                        .build()
                        .into();
                    joint.set_limits(rapier::JointAxis::LinX, [rest, rest]);
                    joint
                }
            }
            JointKind::Revolute => {
                let mut builder = rapier::RevoluteJointBuilder::new()
                    .local_anchor1(local1)
                    .local_anchor2(local2);
                if let Some(motor) = self.motor {
                    builder = builder
                        .motor_velocity(motor.speed, MOTOR_GAIN)
                        .motor_max_force(motor.max_force);
                }
                builder.build().into()
            }
            JointKind::Prismatic => {
                let mut builder = rapier::PrismaticJointBuilder::new(axis)
                    .local_anchor1(local1)
                    .local_anchor2(local2);
                if let Some(motor) = self.motor {
                    builder = builder
                        .motor_velocity(motor.speed, MOTOR_GAIN)
                        .motor_max_force(motor.max_force);
                }
                builder.build().into()
            }
            JointKind::Weld => rapier::FixedJointBuilder::new()
                .local_anchor1(local1)
                .local_anchor2(local2)
                .build()
                .into(),
            // Velocity motors toward rest on every axis, nothing locked
            JointKind::Friction => rapier::GenericJointBuilder::new(rapier::JointAxesMask::empty())
                .motor_velocity(rapier::JointAxis::LinX, 0.0, self.damping)
                .motor_velocity(rapier::JointAxis::LinY, 0.0, self.damping)
                .motor_velocity(rapier::JointAxis::AngX, 0.0, self.damping)
                .local_anchor1(local1)
                .local_anchor2(local2)
                .build(),
            JointKind::Mouse => rapier::SpringJointBuilder::new(0.0, self.stiffness, self.damping)
                .local_anchor1(local1)
                .local_anchor2(local2)
                .build()
                .into(),
            JointKind::Line => rapier::GenericJointBuilder::new(rapier::JointAxesMask::LIN_Y)
                .local_axis1(axis)
                .local_axis2(axis)
                .local_anchor1(local1)
                .local_anchor2(local2)
                .build(),
            JointKind::Gear | JointKind::Pulley => return None,
        };

        joint.set_contacts_enabled(self.collide_connected);
        Some(joint)
    }
}
