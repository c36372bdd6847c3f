//! # void_box - Declarative 2D Physics Worlds
//!
//! Describe entities with option templates, attach handlers, and let the
//! world drive Rapier 2D and draw the result:
//! - [`options`]: entity, world and joint options with right-to-left merging
//! - [`World`]: entity registry, joints, bounding-box queries, camera
//! - [`EntityRef`] / [`EntityMut`]: accessors, forces, impulses, handlers
//! - Frame scheduler: deferred create/destroy/reposition around each step
//! - Event dispatch: keyboard, contact begin/end and impact handlers
//! - Rendering onto any [`DrawSurface`], plus an optional debug overlay
//!
//! Units are meters, angles are degrees clockwise with 0° pointing up,
//! and +y points down.
//!
//! ```ignore
//! use void_box::prelude::*;
//!
//! let mut world = World::new(WorldConfig::default())?;
//! world.create_entity(&[EntityOptions::new()
//!     .with_name("ground")
//!     .with_type(RigidBodyType::Static)
//!     .with_position(10.0, 13.0)
//!     .with_size(20.0, 0.5)])?;
//!
//! let ball = EntityOptions::new().with_shape(Shape::Circle).with_radius(0.5);
//! world.create_entity(&[ball, EntityOptions::new().on_key_down(|e, key| {
//!     if key.key == " " {
//!         e.apply_impulse(5.0, 0.0);
//!     }
//! })])?;
//!
//! let mut surface = RecordingSurface::new(640.0, 480.0);
//! world.update(std::time::Duration::from_millis(16), &mut surface)?;
//! ```

mod debug;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod options;
pub mod render;
mod scheduler;
pub mod world;

pub use dispatch::KeyEvent;
pub use entity::{EntityId, EntityMut, EntityRef};
pub use error::{Result, WorldError};
pub use options::{
    merge_options, CustomProps, EntityConfig, EntityOptions, JointOptions, Shape, WorldConfig,
};
pub use world::World;

pub use void_canvas::{DrawCommand, DrawSurface, RecordingSurface};
pub use void_math::{Direction, Rect, Vec2};
pub use void_physics::{JointHandle, JointKind, PhysicsError, RigidBodyType};

pub mod prelude {
    //! Common imports
    pub use crate::dispatch::KeyEvent;
    pub use crate::entity::{EntityId, EntityMut, EntityRef};
    pub use crate::error::{Result, WorldError};
    pub use crate::options::{EntityOptions, JointOptions, Shape, WorldConfig};
    pub use crate::world::World;
    pub use void_canvas::{DrawSurface, RecordingSurface};
    pub use void_math::{Direction, Vec2};
    pub use void_physics::{JointKind, RigidBodyType};
}
