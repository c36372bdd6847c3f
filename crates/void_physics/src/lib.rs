//! Void Physics - Rapier 2D Integration
//!
//! This crate is the boundary between Void Box and the Rapier 2D engine.
//! Everything the simulation does (broad phase, narrow phase, solver,
//! integration) stays inside Rapier; this crate only describes bodies,
//! colliders and joints, steps the pipeline and reports what happened.
//!
//! # Features
//!
//! - Rigid body dynamics (static, dynamic, kinematic)
//! - Ball, box and convex polygon colliders
//! - Joints (distance, revolute, prismatic, weld, friction, mouse, line)
//! - Contact begin/end and post-solve impact events
//! - Bounding-box queries and world-space outlines
//!
//! Coordinates are screen-oriented: +y points down, so the default
//! gravity is `(0, 10)`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 PhysicsWorld                     │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────┐ │
//! │  │ RigidBodySet│  │ ColliderSet │  │ Joints  │ │
//! │  └─────────────┘  └─────────────┘  └─────────┘ │
//! │  ┌─────────────────────────────────────────────┐│
//! │  │           PhysicsPipeline                   ││
//! │  │  (integration, collision, solver)          ││
//! │  └─────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────┘
//!                        │
//!         ┌──────────────┼──────────────┐
//!         ▼              ▼              ▼
//!    ┌─────────┐   ┌──────────┐   ┌──────────┐
//!    │ Contact │   │  Impact  │   │  Query   │
//!    │  Event  │   │  Event   │   │  (AABB)  │
//!    └─────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_physics::prelude::*;
//!
//! let mut physics = PhysicsWorld::new(PhysicsConfig::default())?;
//!
//! let body = physics.create_rigid_body(RigidBodyDesc::dynamic().with_position(0.0, 0.0));
//! physics.create_collider(ColliderDesc::new(ColliderShape::ball(0.5)), Some(body))?;
//!
//! physics.step();
//! for event in physics.drain_events() {
//!     // ...
//! }
//! ```

pub mod body;
pub mod collider;
pub mod config;
pub mod error;
pub mod events;
pub mod joint;
pub mod material;
pub mod query;
pub mod world;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::body::{RigidBodyDesc, RigidBodyHandle, RigidBodyType};
    pub use crate::collider::{ColliderDesc, ColliderHandle, ColliderOutline, ColliderShape};
    pub use crate::config::PhysicsConfig;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::events::{ContactEvent, ContactEventType, ImpactEvent, PhysicsEvent};
    pub use crate::joint::{JointDesc, JointHandle, JointKind, JointMotor};
    pub use crate::material::{CombineRule, PhysicsMaterial};
    pub use crate::query::{AabbHit, PhysicsQuery};
    pub use crate::world::PhysicsWorld;
}

pub use prelude::*;
