//! Physics queries (bounding-box overlap, outlines)
//!
//! Poses are recomputed from the parent body rather than read from the
//! collider, so bodies teleported since the last step are found where they
//! are now.

use crate::collider::{ColliderHandle, ColliderOutline};
use rapier2d::prelude as rapier;
use void_math::{Rect, Vec2};

/// A collider whose bounding box overlapped a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AabbHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// World-space bounding box of the collider
    pub aabb: Rect,
    /// User data from the collider
    pub user_data: u128,
}

/// Query interface for physics world
pub struct PhysicsQuery<'a> {
    pub(crate) colliders: &'a rapier::ColliderSet,
    pub(crate) bodies: &'a rapier::RigidBodySet,
}

impl<'a> PhysicsQuery<'a> {
    /// Current world pose of a collider
    fn pose(&self, collider: &rapier::Collider) -> rapier::Isometry<f32> {
        let parent = collider
            .parent()
            .and_then(|h| self.bodies.get(h))
            .zip(collider.position_wrt_parent());
        match parent {
            Some((body, relative)) => *body.position() * *relative,
            None => *collider.position(),
        }
    }

    /// World-space bounding box of one collider
    pub fn collider_aabb(&self, handle: ColliderHandle) -> Option<Rect> {
        let collider = self.colliders.get(handle.0)?;
        Some(to_rect(collider.shape().compute_aabb(&self.pose(collider))))
    }

    /// Every enabled collider whose bounding box overlaps `area`.
    /// Touching edges count as overlap.
    pub fn intersect_rect(&self, area: &Rect) -> Vec<AabbHit> {
        let mut hits = Vec::new();
        for (handle, collider) in self.colliders.iter() {
            if !collider.is_enabled() {
                continue;
            }
            let aabb = to_rect(collider.shape().compute_aabb(&self.pose(collider)));
            if aabb.intersects(area) {
                hits.push(AabbHit {
                    collider: ColliderHandle(handle),
                    aabb,
                    user_data: collider.user_data,
                });
            }
        }
        hits
    }

    /// World-space outline of a collider for drawing
    pub fn outline(&self, handle: ColliderHandle) -> Option<ColliderOutline> {
        let collider = self.colliders.get(handle.0)?;
        let pose = self.pose(collider);
        let shape = collider.shape();

        if let Some(ball) = shape.as_ball() {
            let center = pose * rapier::Point::origin();
            return Some(ColliderOutline::Circle {
                center: Vec2::new(center.x, center.y),
                radius: ball.radius,
            });
        }

        let local: Vec<rapier::Point<f32>> = if let Some(cuboid) = shape.as_cuboid() {
            let h = cuboid.half_extents;
            vec![
                rapier::Point::new(-h.x, -h.y),
                rapier::Point::new(h.x, -h.y),
                rapier::Point::new(h.x, h.y),
                rapier::Point::new(-h.x, h.y),
            ]
        } else if let Some(polygon) = shape.as_convex_polygon() {
            polygon.points().to_vec()
        } else {
            log::warn!("No outline for collider shape {:?}", shape.shape_type());
            return None;
        };

        Some(ColliderOutline::Polygon(
            local
                .iter()
                .map(|p| {
                    let world = pose * *p;
                    Vec2::new(world.x, world.y)
                })
                .collect(),
        ))
    }
}

fn to_rect(aabb: rapier2d::parry::bounding_volume::Aabb) -> Rect {
    Rect {
        min: Vec2::new(aabb.mins.x, aabb.mins.y),
        max: Vec2::new(aabb.maxs.x, aabb.maxs.y),
    }
}
