//! Collider types

use crate::error::{PhysicsError, Result};
use crate::material::PhysicsMaterial;
use rapier2d::prelude as rapier;
use serde::{Deserialize, Serialize};
use void_math::Vec2;

/// Handle to a collider in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub(crate) rapier::ColliderHandle);

/// Collision shape type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Circle with radius
    Ball {
        radius: f32,
    },
    /// Box with half-extents
    Cuboid {
        half_extents: Vec2,
    },
    /// Convex polygon from points in body space
    ConvexPolygon {
        points: Vec<Vec2>,
    },
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self::Cuboid {
            half_extents: Vec2::new(0.5, 0.5),
        }
    }
}

impl ColliderShape {
    /// Create a circle shape
    pub fn ball(radius: f32) -> Self {
        Self::Ball { radius }
    }

    /// Create a box shape from half-extents
    pub fn cuboid(hx: f32, hy: f32) -> Self {
        Self::Cuboid {
            half_extents: Vec2::new(hx, hy),
        }
    }

    /// Create a box shape from full size
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::cuboid(width * 0.5, height * 0.5)
    }

    /// Create a convex polygon shape
    pub fn polygon(points: Vec<Vec2>) -> Self {
        Self::ConvexPolygon { points }
    }

    /// Build a Rapier shared shape
    pub(crate) fn to_rapier(&self) -> Result<rapier::SharedShape> {
        match self {
            Self::Ball { radius } => Ok(rapier::SharedShape::ball(*radius)),
            Self::Cuboid { half_extents } => {
                Ok(rapier::SharedShape::cuboid(half_extents.x, half_extents.y))
            }
            Self::ConvexPolygon { points } => {
                if points.len() < 3 || signed_area(points).abs() <= f32::EPSILON {
                    return Err(PhysicsError::ShapeCreationFailed(format!(
                        "degenerate polygon with {} points",
                        points.len()
                    )));
                }
                let rapier_points: Vec<_> = points
                    .iter()
                    .map(|p| rapier::Point::new(p.x, p.y))
                    .collect();
                rapier::SharedShape::convex_hull(&rapier_points).ok_or_else(|| {
                    PhysicsError::ShapeCreationFailed("convex hull computation failed".into())
                })
            }
        }
    }
}

/// Shoelace area, positive for counter-clockwise winding
fn signed_area(points: &[Vec2]) -> f32 {
    let mut sum = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Description for creating a collider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderDesc {
    /// Collision shape
    pub shape: ColliderShape,
    /// Physics material
    pub material: PhysicsMaterial,
    /// User data (entity ID)
    pub user_data: u128,
}

impl Default for ColliderDesc {
    fn default() -> Self {
        Self {
            shape: ColliderShape::default(),
            material: PhysicsMaterial::default(),
            user_data: 0,
        }
    }
}

impl ColliderDesc {
    /// Create a new collider description with a shape
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Set material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Set user data
    pub fn with_user_data(mut self, data: u128) -> Self {
        self.user_data = data;
        self
    }

    /// Build a Rapier collider builder.
    ///
    /// Every collider reports collision events so contact handlers can be
    /// attached after creation.
    pub(crate) fn to_rapier_builder(&self) -> Result<rapier::ColliderBuilder> {
        let builder = rapier::ColliderBuilder::new(self.shape.to_rapier()?)
            .friction(self.material.friction)
            .restitution(self.material.restitution)
            .density(self.material.density)
            .friction_combine_rule(self.material.friction_combine.into())
            .restitution_combine_rule(self.material.restitution_combine.into())
            .active_events(rapier::ActiveEvents::COLLISION_EVENTS)
            .user_data(self.user_data);

        Ok(builder)
    }
}

/// World-space outline of a collider, used for rendering
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderOutline {
    /// Circle centre and radius
    Circle { center: Vec2, radius: f32 },
    /// Polygon vertices in order
    Polygon(Vec<Vec2>),
}
