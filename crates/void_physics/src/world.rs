//! Physics world - main simulation container

use crate::body::{RigidBodyDesc, RigidBodyHandle};
use crate::collider::{ColliderDesc, ColliderHandle, ColliderOutline};
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, Result};
use crate::events::{
    ChannelEventCollector, ContactEvent, ContactEventType, EventCollector, ImpactEvent,
    PhysicsEvent, TangentComponent,
};
use crate::joint::{JointDesc, JointHandle};
use crate::query::PhysicsQuery;
use rapier2d::prelude as rapier;
use std::num::NonZeroUsize;
use void_math::{Rect, Vec2};

/// The main physics world containing all simulation state
pub struct PhysicsWorld {
    /// Configuration
    config: PhysicsConfig,

    /// Rapier physics pipeline
    pipeline: rapier::PhysicsPipeline,

    /// Gravity
    gravity: rapier::Vector<f32>,

    /// Integration parameters
    integration_params: rapier::IntegrationParameters,

    /// Island manager
    islands: rapier::IslandManager,

    /// Broad phase
    broad_phase: rapier::DefaultBroadPhase,

    /// Narrow phase
    narrow_phase: rapier::NarrowPhase,

    /// Impulse joint set
    impulse_joints: rapier::ImpulseJointSet,

    /// Multibody joint set
    multibody_joints: rapier::MultibodyJointSet,

    /// CCD solver
    ccd_solver: rapier::CCDSolver,

    /// Rigid body set
    bodies: rapier::RigidBodySet,

    /// Collider set
    colliders: rapier::ColliderSet,

    /// Events from the last step
    events: EventCollector,
}

impl PhysicsWorld {
    /// Create a new physics world
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;

        let gravity = rapier::Vector::new(config.gravity.x, config.gravity.y);

        let mut integration_params = rapier::IntegrationParameters::default();
        integration_params.dt = config.timestep;
        integration_params.num_solver_iterations = NonZeroUsize::new(config.velocity_iterations)
            .ok_or_else(|| {
                PhysicsError::InvalidConfig("velocity_iterations must be at least 1".into())
            })?;

        log::debug!(
            "Physics world created: gravity {:?}, dt {}",
            config.gravity,
            config.timestep
        );

        Ok(Self {
            config,
            pipeline: rapier::PhysicsPipeline::new(),
            gravity,
            integration_params,
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            events: EventCollector::new(),
        })
    }

    /// Get the physics configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Set gravity
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = rapier::Vector::new(gravity.x, gravity.y);
        self.config.gravity = gravity;
        for (_, body) in self.bodies.iter_mut() {
            body.wake_up(true);
        }
    }

    /// Get gravity
    pub fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    // ==================== Rigid Bodies ====================

    /// Create a rigid body
    pub fn create_rigid_body(&mut self, desc: RigidBodyDesc) -> RigidBodyHandle {
        let mut builder = desc.to_rapier_builder();
        if !self.config.sleeping_enabled {
            builder = builder.can_sleep(false);
        }
        RigidBodyHandle(self.bodies.insert(builder))
    }

    /// Remove a rigid body along with its colliders and joints
    pub fn remove_rigid_body(&mut self, handle: RigidBodyHandle) -> Result<()> {
        self.bodies
            .remove(
                handle.0,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .map(|_| ())
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    fn body(&self, handle: RigidBodyHandle) -> Result<&rapier::RigidBody> {
        self.bodies
            .get(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    fn body_mut(&mut self, handle: RigidBodyHandle) -> Result<&mut rapier::RigidBody> {
        self.bodies
            .get_mut(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    /// Get rigid body position
    pub fn body_position(&self, handle: RigidBodyHandle) -> Result<Vec2> {
        let pos = self.body(handle)?.translation();
        Ok(Vec2::new(pos.x, pos.y))
    }

    /// Set rigid body position, keeping its rotation
    pub fn set_body_position(&mut self, handle: RigidBodyHandle, position: Vec2) -> Result<()> {
        self.body_mut(handle)?
            .set_translation(rapier::Vector::new(position.x, position.y), true);
        Ok(())
    }

    /// Get rigid body rotation in radians
    pub fn body_rotation(&self, handle: RigidBodyHandle) -> Result<f32> {
        Ok(self.body(handle)?.rotation().angle())
    }

    /// Set rigid body rotation in radians
    pub fn set_body_rotation(&mut self, handle: RigidBodyHandle, angle: f32) -> Result<()> {
        self.body_mut(handle)?
            .set_rotation(rapier2d::na::UnitComplex::new(angle), true);
        Ok(())
    }

    /// World-space centre of mass
    pub fn body_center_of_mass(&self, handle: RigidBodyHandle) -> Result<Vec2> {
        let com = self.body(handle)?.center_of_mass();
        Ok(Vec2::new(com.x, com.y))
    }

    /// Get rigid body linear velocity
    pub fn body_linear_velocity(&self, handle: RigidBodyHandle) -> Result<Vec2> {
        let vel = self.body(handle)?.linvel();
        Ok(Vec2::new(vel.x, vel.y))
    }

    /// Set rigid body linear velocity
    pub fn set_body_linear_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec2) -> Result<()> {
        self.body_mut(handle)?
            .set_linvel(rapier::Vector::new(velocity.x, velocity.y), true);
        Ok(())
    }

    /// Add a force at the centre of mass. Forces accumulate until
    /// [`reset_forces`](Self::reset_forces).
    pub fn apply_force(&mut self, handle: RigidBodyHandle, force: Vec2) -> Result<()> {
        self.body_mut(handle)?
            .add_force(rapier::Vector::new(force.x, force.y), true);
        Ok(())
    }

    /// Apply an impulse at the centre of mass
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec2) -> Result<()> {
        self.body_mut(handle)?
            .apply_impulse(rapier::Vector::new(impulse.x, impulse.y), true);
        Ok(())
    }

    /// Clear forces accumulated on every body
    pub fn reset_forces(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
        }
    }

    // ==================== Colliders ====================

    /// Create a collider attached to a rigid body
    pub fn create_collider(
        &mut self,
        desc: ColliderDesc,
        parent: Option<RigidBodyHandle>,
    ) -> Result<ColliderHandle> {
        let builder = desc.to_rapier_builder()?;
        let handle = match parent {
            Some(body) => {
                if !self.bodies.contains(body.0) {
                    return Err(PhysicsError::BodyNotFound(body));
                }
                self.colliders
                    .insert_with_parent(builder, body.0, &mut self.bodies)
            }
            None => self.colliders.insert(builder),
        };
        Ok(ColliderHandle(handle))
    }

    fn collider(&self, handle: ColliderHandle) -> Result<&rapier::Collider> {
        self.colliders
            .get(handle.0)
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    fn collider_mut(&mut self, handle: ColliderHandle) -> Result<&mut rapier::Collider> {
        self.colliders
            .get_mut(handle.0)
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    /// Get collider friction
    pub fn collider_friction(&self, handle: ColliderHandle) -> Result<f32> {
        Ok(self.collider(handle)?.friction())
    }

    /// Set collider friction
    pub fn set_collider_friction(&mut self, handle: ColliderHandle, friction: f32) -> Result<()> {
        self.collider_mut(handle)?.set_friction(friction);
        Ok(())
    }

    /// Get collider restitution
    pub fn collider_restitution(&self, handle: ColliderHandle) -> Result<f32> {
        Ok(self.collider(handle)?.restitution())
    }

    /// Set collider restitution
    pub fn set_collider_restitution(
        &mut self,
        handle: ColliderHandle,
        restitution: f32,
    ) -> Result<()> {
        self.collider_mut(handle)?.set_restitution(restitution);
        Ok(())
    }

    /// World-space outline of a collider
    pub fn collider_outline(&self, handle: ColliderHandle) -> Result<ColliderOutline> {
        self.query()
            .outline(handle)
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    /// World-space bounding box of a collider
    pub fn collider_aabb(&self, handle: ColliderHandle) -> Result<Rect> {
        self.query()
            .collider_aabb(handle)
            .ok_or(PhysicsError::ColliderNotFound(handle))
    }

    // ==================== Joints ====================

    /// Create a joint between two bodies. Anchors in `desc` are world
    /// positions; mouse joints ignore them and attach the body origins.
    pub fn create_joint(
        &mut self,
        body1: RigidBodyHandle,
        body2: RigidBodyHandle,
        desc: &JointDesc,
    ) -> Result<JointHandle> {
        let (local1, local2) = if desc.kind.uses_anchors() {
            let a = rapier::Point::new(desc.anchor1.x, desc.anchor1.y);
            let b = rapier::Point::new(desc.anchor2.x, desc.anchor2.y);
            (
                self.body(body1)?.position().inverse_transform_point(&a),
                self.body(body2)?.position().inverse_transform_point(&b),
            )
        } else {
            self.body(body1)?;
            self.body(body2)?;
            (rapier::Point::origin(), rapier::Point::origin())
        };

        let joint = desc
            .to_rapier(local1, local2)
            .ok_or(PhysicsError::UnsupportedJoint(desc.kind))?;
        let handle = self.impulse_joints.insert(body1.0, body2.0, joint, true);
        log::debug!("Created {:?} joint", desc.kind);
        Ok(JointHandle(handle))
    }

    /// Remove a joint
    pub fn remove_joint(&mut self, handle: JointHandle) {
        self.impulse_joints.remove(handle.0, true);
    }

    /// Number of joints
    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    /// World-space anchor pairs of every joint, for debug drawing
    pub fn joint_segments(&self) -> Vec<(Vec2, Vec2)> {
        self.impulse_joints
            .iter()
            .filter_map(|(_, joint)| {
                let b1 = self.bodies.get(joint.body1)?;
                let b2 = self.bodies.get(joint.body2)?;
                let p1 = b1.position() * joint.data.local_anchor1();
                let p2 = b2.position() * joint.data.local_anchor2();
                Some((Vec2::new(p1.x, p1.y), Vec2::new(p2.x, p2.y)))
            })
            .collect()
    }

    // ==================== Simulation ====================

    /// Advance the simulation by one fixed timestep
    pub fn step(&mut self) {
        let (collision_send, collision_recv) = crossbeam_channel::unbounded();
        let event_handler = ChannelEventCollector {
            collision_events: collision_send,
        };

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        while let Ok(event) = collision_recv.try_recv() {
            let (h1, h2, event_type) = match event {
                rapier::CollisionEvent::Started(h1, h2, _) => (h1, h2, ContactEventType::Started),
                rapier::CollisionEvent::Stopped(h1, h2, _) => (h1, h2, ContactEventType::Stopped),
            };

            // Colliders removed before the step report a stop with no collider left
            let (Some(c1), Some(c2)) = (self.colliders.get(h1), self.colliders.get(h2)) else {
                log::trace!("Dropping {:?} event for a removed collider", event_type);
                continue;
            };

            self.events.contact_events.push(ContactEvent {
                collider1: ColliderHandle(h1),
                collider2: ColliderHandle(h2),
                event_type,
                user_data1: c1.user_data,
                user_data2: c2.user_data,
            });
        }

        self.collect_impacts();
    }

    /// Solver impulses for every touching pair
    fn collect_impacts(&mut self) {
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let Some(point) = pair.manifolds.iter().find_map(|m| m.points.first()) else {
                continue;
            };
            let (Some(c1), Some(c2)) = (
                self.colliders.get(pair.collider1),
                self.colliders.get(pair.collider2),
            ) else {
                continue;
            };

            self.events.impact_events.push(ImpactEvent {
                collider1: ColliderHandle(pair.collider1),
                collider2: ColliderHandle(pair.collider2),
                normal_impulse: point.data.impulse,
                tangent_impulse: point.data.tangent_impulse.component(),
                user_data1: c1.user_data,
                user_data2: c2.user_data,
            });
        }
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<PhysicsEvent> {
        self.events.drain()
    }

    /// Events collected since the last drain
    pub fn events(&self) -> &EventCollector {
        &self.events
    }

    // ==================== Queries ====================

    /// Get a query interface
    pub fn query(&self) -> PhysicsQuery<'_> {
        PhysicsQuery {
            colliders: &self.colliders,
            bodies: &self.bodies,
        }
    }

    // ==================== Debug ====================

    /// Get number of rigid bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Get number of colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBodyType;
    use crate::collider::ColliderShape;
    use crate::joint::JointKind;
    use approx::assert_relative_eq;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(PhysicsConfig::default()).unwrap()
    }

    fn ball(world: &mut PhysicsWorld, x: f32, y: f32, user_data: u128) -> RigidBodyHandle {
        let body = world.create_rigid_body(
            RigidBodyDesc::dynamic()
                .with_position(x, y)
                .with_user_data(user_data),
        );
        world
            .create_collider(
                ColliderDesc::new(ColliderShape::ball(0.5)).with_user_data(user_data),
                Some(body),
            )
            .unwrap();
        body
    }

    fn ground(world: &mut PhysicsWorld, user_data: u128) -> RigidBodyHandle {
        let body = world.create_rigid_body(RigidBodyDesc::fixed().with_position(0.0, 10.0));
        world
            .create_collider(
                ColliderDesc::new(ColliderShape::from_size(40.0, 1.0)).with_user_data(user_data),
                Some(body),
            )
            .unwrap();
        body
    }

    #[test]
    fn test_create_world() {
        let world = world();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PhysicsConfig::default().with_timestep(0.0);
        assert!(PhysicsWorld::new(config).is_err());
    }

    #[test]
    fn test_gravity_fall_is_downward_in_screen_space() {
        let mut world = world();
        let body = ball(&mut world, 0.0, 0.0, 1);

        for _ in 0..30 {
            world.step();
        }

        let pos = world.body_position(body).unwrap();
        assert!(pos.y > 0.0, "Body should fall toward +y, got {:?}", pos);
        assert_relative_eq!(pos.x, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_ground_contact_reports_events() {
        let mut world = world();
        ground(&mut world, 1);
        ball(&mut world, 0.0, 8.0, 2);

        let mut started = false;
        let mut impacts = 0;
        for _ in 0..120 {
            world.step();
            for event in world.drain_events() {
                match event {
                    PhysicsEvent::Contact(c) if c.is_started() => {
                        let pair = [c.user_data1, c.user_data2];
                        assert!(pair.contains(&1) && pair.contains(&2));
                        started = true;
                    }
                    PhysicsEvent::Impact(_) => impacts += 1,
                    _ => {}
                }
            }
        }
        assert!(started);
        assert!(impacts > 0);
    }

    #[test]
    fn test_forces_accumulate_until_reset() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default().with_gravity(0.0, 0.0)).unwrap();
        let body = ball(&mut world, 0.0, 0.0, 1);

        world.apply_force(body, Vec2::new(10.0, 0.0)).unwrap();
        world.step();
        let after_force = world.body_linear_velocity(body).unwrap().x;
        assert!(after_force > 0.0);

        world.reset_forces();
        world.step();
        let after_reset = world.body_linear_velocity(body).unwrap().x;
        assert_relative_eq!(after_reset, after_force, epsilon = 1e-4);
    }

    #[test]
    fn test_impulse_changes_velocity() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default().with_gravity(0.0, 0.0)).unwrap();
        let body = ball(&mut world, 0.0, 0.0, 1);
        world.apply_impulse(body, Vec2::new(0.0, -5.0)).unwrap();
        assert!(world.body_linear_velocity(body).unwrap().y < 0.0);
    }

    #[test]
    fn test_teleported_body_is_found_before_step() {
        let mut world = world();
        let body = ball(&mut world, 0.0, 0.0, 7);
        world.set_body_position(body, Vec2::new(20.0, 20.0)).unwrap();

        let area = Rect::from_corners(Vec2::new(19.0, 19.0), Vec2::new(21.0, 21.0));
        let hits = world.query().intersect_rect(&area);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].user_data, 7);

        let old = Rect::point(Vec2::ZERO);
        assert!(world.query().intersect_rect(&old).is_empty());
    }

    #[test]
    fn test_outline_follows_rotation() {
        let mut world = world();
        let body = world.create_rigid_body(
            RigidBodyDesc {
                body_type: RigidBodyType::Static,
                ..Default::default()
            }
            .with_position(5.0, 5.0),
        );
        let collider = world
            .create_collider(ColliderDesc::new(ColliderShape::from_size(2.0, 2.0)), Some(body))
            .unwrap();
        world
            .set_body_rotation(body, std::f32::consts::FRAC_PI_4)
            .unwrap();

        let ColliderOutline::Polygon(points) = world.collider_outline(collider).unwrap() else {
            panic!("box outline should be a polygon");
        };
        assert_eq!(points.len(), 4);
        let diagonal = std::f32::consts::SQRT_2;
        for p in points {
            assert_relative_eq!(p.distance(Vec2::new(5.0, 5.0)), diagonal, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_remove_body_removes_colliders() {
        let mut world = world();
        let body = ball(&mut world, 0.0, 0.0, 1);
        world.remove_rigid_body(body).unwrap();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 0);
        assert!(matches!(
            world.body_position(body),
            Err(PhysicsError::BodyNotFound(_))
        ));
    }

    #[test]
    fn test_joints() {
        let mut world = world();
        let a = ball(&mut world, 0.0, 0.0, 1);
        let b = ball(&mut world, 2.0, 0.0, 2);

        let desc = JointDesc::new(JointKind::Revolute)
            .with_anchors(Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.0));
        world.create_joint(a, b, &desc).unwrap();
        assert_eq!(world.joint_count(), 1);

        let segments = world.joint_segments();
        assert_relative_eq!(segments[0].0.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(segments[0].1.x, 1.0, epsilon = 1e-5);

        let gear = JointDesc::new(JointKind::Gear);
        assert!(matches!(
            world.create_joint(a, b, &gear),
            Err(PhysicsError::UnsupportedJoint(JointKind::Gear))
        ));
        assert_eq!(world.joint_count(), 1);
    }
}
