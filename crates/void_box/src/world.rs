//! World
//!
//! Owns the physics world, the entity registry, handler maps, callback
//! lists and the deferred queues. Frames are driven by the host through
//! [`World::frame`], [`World::tick`] and [`World::update`].

use crate::dispatch::{
    ContactPhase, EntityCallback, EntityRenderCallback, HandlerMaps, KeyPhase, WorldCallback,
    WorldRenderCallback,
};
use crate::entity::{Entity, EntityId, EntityMut, EntityRef};
use crate::error::{Result, WorldError};
use crate::options::{merge_options, EntityOptions, JointOptions, Shape, WorldConfig};
use crate::scheduler::FrameQueues;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;
use void_canvas::DrawSurface;
use void_math::{radians, Rect, Vec2};
use void_physics::{
    ColliderDesc, ColliderShape, JointDesc, JointHandle, PhysicsMaterial, PhysicsWorld,
    RigidBodyDesc,
};

/// Render callback, bound to the world or to one entity
#[derive(Clone)]
pub(crate) enum RenderBinding {
    World(WorldRenderCallback),
    Entity(EntityId, EntityRenderCallback),
}

/// Tick callback, bound to the world or to one entity
#[derive(Clone)]
pub(crate) enum TickBinding {
    World(WorldCallback),
    Entity(EntityId, EntityCallback),
}

impl RenderBinding {
    fn entity(&self) -> Option<EntityId> {
        match self {
            Self::World(_) => None,
            Self::Entity(id, _) => Some(*id),
        }
    }
}

impl TickBinding {
    fn entity(&self) -> Option<EntityId> {
        match self {
            Self::World(_) => None,
            Self::Entity(id, _) => Some(*id),
        }
    }
}

/// A physics world with entities, events and rendering
pub struct World {
    config: WorldConfig,
    pub(crate) physics: PhysicsWorld,
    camera: Vec2,
    scale: f32,

    pub(crate) entities: BTreeMap<EntityId, Rc<Entity>>,
    next_entity_id: u64,

    pub(crate) handlers: HandlerMaps,
    pub(crate) render_callbacks: Vec<RenderBinding>,
    pub(crate) tick_callbacks: Vec<TickBinding>,
    pub(crate) queues: FrameQueues,

    /// Raised while the engine steps and its events are dispatched
    pub(crate) locked: bool,
    /// Raised by a failed frame
    pub(crate) halted: bool,
    pub(crate) in_frame: bool,
    pub(crate) tick_accumulator: Duration,
    pub(crate) frame_count: u64,
}

impl World {
    /// Create a world. Invalid configuration is logged and rejected.
    pub fn new(config: WorldConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            log::error!("Cannot create world: {}", e);
            return Err(e);
        }

        let physics = PhysicsWorld::new(config.physics_config()).map_err(|e| {
            log::error!("Cannot create physics world: {}", e);
            WorldError::from(e)
        })?;

        log::info!(
            "World created: gravity {:?}, scale {} px/m, tick every {} ms",
            config.gravity,
            config.scale,
            config.tick_frequency
        );

        Ok(Self {
            scale: config.scale,
            config,
            physics,
            camera: Vec2::ZERO,
            entities: BTreeMap::new(),
            next_entity_id: 0,
            handlers: HandlerMaps::default(),
            render_callbacks: Vec::new(),
            tick_callbacks: Vec::new(),
            queues: FrameQueues::default(),
            locked: false,
            halted: false,
            in_frame: false,
            tick_accumulator: Duration::ZERO,
            frame_count: 0,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The wrapped physics world
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// True while the engine steps or its events are being dispatched
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// True once a frame has failed
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Frames completed so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    // ==================== Entities ====================

    /// Merge `options` (rightmost wins) and create the entity.
    ///
    /// While the world is locked the creation is queued until after the
    /// step and `Ok(None)` is returned.
    pub fn create_entity(&mut self, options: &[EntityOptions]) -> Result<Option<EntityId>> {
        let merged = merge_options(options);
        if self.locked {
            log::debug!(
                "World locked, queueing creation of '{}'",
                merged.name.as_deref().unwrap_or("unnamed object")
            );
            self.queues.creations.push_back(merged);
            return Ok(None);
        }
        self.spawn(merged).map(Some)
    }

    /// Build an entity from merged options
    pub(crate) fn spawn(&mut self, merged: EntityOptions) -> Result<EntityId> {
        let expanded = merged.expanded();
        let (config, custom) = expanded.resolve();
        let handlers = expanded.handlers;

        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;

        let body = self.physics.create_rigid_body(
            RigidBodyDesc::new(config.body_type)
                .with_position(config.x, config.y)
                .with_rotation(config.rotation.map(radians).unwrap_or(0.0))
                .with_fixed_rotation(config.fixed_rotation)
                .with_ccd(config.bullet)
                .with_can_sleep(self.config().allow_sleep)
                .with_enabled(config.active)
                .with_user_data(id.to_user_data()),
        );

        let shape = match config.shape {
            Shape::Square => ColliderShape::from_size(config.width, config.height),
            Shape::Circle => ColliderShape::ball(config.radius),
            Shape::Polygon => ColliderShape::polygon(config.points.clone()),
        };
        let collider_desc = ColliderDesc::new(shape)
            .with_material(PhysicsMaterial::new(
                config.density,
                config.friction,
                config.restitution,
            ))
            .with_user_data(id.to_user_data());

        let collider = match self.physics.create_collider(collider_desc, Some(body)) {
            Ok(collider) => collider,
            Err(e) => {
                log::warn!("Entity '{}' rejected by the engine: {}", config.name, e);
                self.physics.remove_rigid_body(body)?;
                return Err(e.into());
            }
        };

        log::debug!("Created entity {} '{}'", id, config.name);
        let entity = Rc::new(Entity::new(
            id,
            body,
            collider,
            config,
            custom,
            handlers.draw,
        ));
        self.entities.insert(id, entity.clone());

        if let Some(f) = handlers.on_start_contact {
            self.handlers.contacts_mut(ContactPhase::Start).insert(id, f);
        }
        if let Some(f) = handlers.on_finish_contact {
            self.handlers.contacts_mut(ContactPhase::Finish).insert(id, f);
        }
        if let Some(f) = handlers.on_impact {
            self.handlers.impact.insert(id, f);
        }
        if let Some(f) = handlers.on_key_down {
            self.handlers.keys_mut(KeyPhase::Down).insert(id, f);
        }
        if let Some(f) = handlers.on_key_up {
            self.handlers.keys_mut(KeyPhase::Up).insert(id, f);
        }
        if let Some(f) = handlers.on_render {
            self.render_callbacks.push(RenderBinding::Entity(id, f));
        }
        if let Some(f) = handlers.on_tick {
            self.tick_callbacks.push(TickBinding::Entity(id, f));
        }
        if let Some(init) = handlers.init {
            init(&mut EntityMut {
                world: self,
                entity,
            });
        }

        Ok(id)
    }

    /// Entity by id, including ones flagged for removal
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.entities.get(&id).map(|entity| EntityRef {
            world: self,
            entity,
        })
    }

    /// Mutable entity by id, including ones flagged for removal
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        let entity = self.entities.get(&id)?.clone();
        Some(EntityMut {
            world: self,
            entity,
        })
    }

    /// Mutable entity by id, unless flagged for removal
    pub(crate) fn live_entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        self.entity_mut(id).filter(|e| !e.is_destroyed())
    }

    /// Ids of every entity not flagged for removal, in creation order
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| !e.is_destroyed())
            .map(|e| e.id)
            .collect()
    }

    /// Number of entities still registered, flagged ones included
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Ids of live entities with this name
    pub fn find_by_name(&self, name: &str) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| !e.is_destroyed() && e.config.borrow().name == name)
            .map(|e| e.id)
            .collect()
    }

    // ==================== Joints ====================

    /// Join two entities' bodies.
    ///
    /// Distance joints hold an anchor on each body: its centre plus the
    /// per-entity offset. Every other kind pivots or slides at a single
    /// anchor, the first entity's centre plus its offset; the second
    /// offset is ignored.
    pub fn create_joint(
        &mut self,
        entity1: EntityId,
        entity2: EntityId,
        options: &JointOptions,
    ) -> Result<JointHandle> {
        let body1 = self.live_body(entity1)?;
        let body2 = self.live_body(entity2)?;

        let anchor1 = self.physics.body_center_of_mass(body1)?
            + options.joint_position_on_entity1.unwrap_or(Vec2::ZERO);
        let anchor2 = if options.kind.shares_anchor() {
            if options.joint_position_on_entity2.is_some() {
                log::debug!("{:?} joint uses one anchor, ignoring second offset", options.kind);
            }
            anchor1
        } else {
            self.physics.body_center_of_mass(body2)?
                + options.joint_position_on_entity2.unwrap_or(Vec2::ZERO)
        };

        let defaults = JointDesc::default();
        let mut desc = JointDesc::new(options.kind)
            .with_anchors(anchor1, anchor2)
            .with_collide_connected(options.allow_collisions);
        if options.enable_motor {
            desc = desc.with_motor(options.motor_speed, options.max_motor_force);
        }
        if let Some(axis) = options.axis {
            desc = desc.with_axis(axis.x, axis.y);
        }
        desc.stiffness = options.stiffness.unwrap_or(defaults.stiffness);
        desc.damping = options.damping.unwrap_or(defaults.damping);

        match self.physics.create_joint(body1, body2, &desc) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                log::warn!("Joint between {} and {} not created: {}", entity1, entity2, e);
                Err(e.into())
            }
        }
    }

    pub fn remove_joint(&mut self, joint: JointHandle) {
        self.physics.remove_joint(joint);
    }

    fn live_body(&self, id: EntityId) -> Result<void_physics::RigidBodyHandle> {
        self.entities
            .get(&id)
            .filter(|e| !e.is_destroyed())
            .map(|e| e.body)
            .ok_or(WorldError::EntityNotFound(id))
    }

    // ==================== Queries ====================

    /// Every live entity whose bounding box overlaps the box spanned by
    /// the two corners, in meters
    pub fn find(&self, x1: f32, y1: f32, x2: f32, y2: f32) -> Vec<EntityId> {
        let area = Rect::from_corners(Vec2::new(x1, y1), Vec2::new(x2, y2));
        let mut found: Vec<EntityId> = self
            .physics
            .query()
            .intersect_rect(&area)
            .into_iter()
            .filter_map(|hit| u64::try_from(hit.user_data).ok().map(EntityId))
            .filter(|id| self.entities.get(id).is_some_and(|e| !e.is_destroyed()))
            .collect();
        found.sort();
        found.dedup();
        found
    }

    /// Every live entity whose bounding box contains the point
    pub fn find_point(&self, x: f32, y: f32) -> Vec<EntityId> {
        self.find(x, y, x, y)
    }

    // ==================== View ====================

    /// Camera position: the world point drawn at the canvas origin
    pub fn camera(&self) -> Vec2 {
        self.camera
    }

    pub fn set_camera(&mut self, camera: impl Into<Vec2>) {
        self.camera = camera.into();
    }

    /// Pixels per meter
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Set pixels per meter. Non-positive values are ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if scale > 0.0 && scale.is_finite() {
            self.scale = scale;
        } else {
            log::warn!("Ignoring invalid scale {}", scale);
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.physics.gravity()
    }

    pub fn set_gravity(&mut self, gravity: impl Into<Vec2>) {
        let gravity = gravity.into();
        self.config.gravity = gravity;
        self.physics.set_gravity(gravity);
    }

    /// Canvas pixel position of a world point, rounded
    pub fn canvas_position_at(&self, x: f32, y: f32) -> (f32, f32) {
        let p = ((Vec2::new(x, y) - self.camera) * self.scale).round();
        (p.x, p.y)
    }

    /// World point under a canvas pixel position
    pub fn world_position_at(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y) / self.scale + self.camera
    }

    // ==================== Callbacks ====================

    /// Run `f` after the entities are drawn each frame. Keep the returned
    /// handle to unbind it later.
    pub fn on_render(
        &mut self,
        f: impl Fn(&mut World, &mut dyn DrawSurface) + 'static,
    ) -> WorldRenderCallback {
        let callback: WorldRenderCallback = Rc::new(f);
        self.render_callbacks
            .push(RenderBinding::World(callback.clone()));
        callback
    }

    /// Remove every binding of this render callback
    pub fn unbind_on_render(&mut self, callback: &WorldRenderCallback) -> bool {
        let before = self.render_callbacks.len();
        self.render_callbacks.retain(|binding| match binding {
            RenderBinding::World(f) => !Rc::ptr_eq(f, callback),
            RenderBinding::Entity(..) => true,
        });
        before != self.render_callbacks.len()
    }

    /// Remove every binding of this entity render callback
    pub fn unbind_entity_on_render(&mut self, callback: &EntityRenderCallback) -> bool {
        let before = self.render_callbacks.len();
        self.render_callbacks.retain(|binding| match binding {
            RenderBinding::Entity(_, f) => !Rc::ptr_eq(f, callback),
            RenderBinding::World(_) => true,
        });
        before != self.render_callbacks.len()
    }

    /// Run `f` every tick
    pub fn on_tick(&mut self, f: impl Fn(&mut World) + 'static) -> WorldCallback {
        let callback: WorldCallback = Rc::new(f);
        self.tick_callbacks.push(TickBinding::World(callback.clone()));
        callback
    }

    /// Remove every binding of this tick callback
    pub fn unbind_on_tick(&mut self, callback: &WorldCallback) -> bool {
        let before = self.tick_callbacks.len();
        self.tick_callbacks.retain(|binding| match binding {
            TickBinding::World(f) => !Rc::ptr_eq(f, callback),
            TickBinding::Entity(..) => true,
        });
        before != self.tick_callbacks.len()
    }

    /// Remove every binding of this entity tick callback
    pub fn unbind_entity_on_tick(&mut self, callback: &EntityCallback) -> bool {
        let before = self.tick_callbacks.len();
        self.tick_callbacks.retain(|binding| match binding {
            TickBinding::Entity(_, f) => !Rc::ptr_eq(f, callback),
            TickBinding::World(_) => true,
        });
        before != self.tick_callbacks.len()
    }

    /// Drop every handler, queued operation and callback bound to `id`
    pub(crate) fn purge(&mut self, id: EntityId) {
        self.handlers.remove(id);
        self.queues.purge(id);
        self.render_callbacks
            .retain(|binding| binding.entity() != Some(id));
        self.tick_callbacks.retain(|binding| binding.entity() != Some(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{EntityOptions, WorldConfig};
    use approx::assert_relative_eq;
    use void_physics::{JointKind, PhysicsError, RigidBodyType};

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(matches!(
            World::new(WorldConfig::default().with_scale(-1.0)),
            Err(WorldError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_create_entity_applies_defaults() {
        let mut world = world();
        let id = world.create_entity(&[EntityOptions::new()]).unwrap().unwrap();

        let entity = world.entity(id).unwrap();
        assert_eq!(entity.name(), "unnamed object");
        assert_eq!(entity.position(), Vec2::new(10.0, 5.0));
        assert_eq!(entity.body_type(), RigidBodyType::Dynamic);
        assert_eq!(world.physics().body_count(), 1);
    }

    #[test]
    fn test_creation_is_queued_while_locked() {
        let mut world = world();
        world.locked = true;
        let created = world.create_entity(&[EntityOptions::new()]).unwrap();
        world.locked = false;

        assert!(created.is_none());
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.queues.creations.len(), 1);
    }

    #[test]
    fn test_degenerate_polygon_is_rejected_cleanly() {
        let mut world = world();
        let options = EntityOptions::new()
            .with_shape(Shape::Polygon)
            .with_points(vec![Vec2::ZERO, Vec2::new(1.0, 0.0)]);

        assert!(matches!(
            world.create_entity(&[options]),
            Err(WorldError::Physics(PhysicsError::ShapeCreationFailed(_)))
        ));
        assert_eq!(world.physics().body_count(), 0);
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_init_runs_with_entity() {
        let mut world = world();
        let id = world
            .create_entity(&[EntityOptions::new().with_init(|e| e.set_color("gold"))])
            .unwrap()
            .unwrap();
        assert_eq!(world.entity(id).unwrap().color(), "gold");
    }

    #[test]
    fn test_find_box_and_point() {
        let mut world = world();
        let a = world
            .create_entity(&[EntityOptions::new().with_position(2.0, 2.0)])
            .unwrap()
            .unwrap();
        let b = world
            .create_entity(&[EntityOptions::new().with_position(6.0, 2.0)])
            .unwrap()
            .unwrap();

        assert_eq!(world.find(0.0, 0.0, 10.0, 4.0), vec![a, b]);
        assert_eq!(world.find_point(2.0, 2.0), vec![a]);
        // corners in any order
        assert_eq!(world.find(7.0, 3.0, 5.0, 1.0), vec![b]);
        assert!(world.find_point(4.0, 2.0).is_empty());
    }

    #[test]
    fn test_find_skips_flagged_entities() {
        let mut world = world();
        let id = world
            .create_entity(&[EntityOptions::new().with_position(2.0, 2.0)])
            .unwrap()
            .unwrap();
        world.entity_mut(id).unwrap().destroy();
        assert!(world.find_point(2.0, 2.0).is_empty());
        assert!(world.entity_ids().is_empty());
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_canvas_position_round_trip() {
        let mut world = world();
        world.set_camera((2.0, -1.0));
        world.set_scale(40.0);

        let (cx, cy) = world.canvas_position_at(5.0, 3.0);
        assert_eq!((cx, cy), (120.0, 160.0));

        let back = world.world_position_at(cx, cy);
        assert_relative_eq!(back.x, 5.0, epsilon = 1.0 / 40.0);
        assert_relative_eq!(back.y, 3.0, epsilon = 1.0 / 40.0);
    }

    #[test]
    fn test_invalid_scale_is_ignored() {
        let mut world = world();
        world.set_scale(0.0);
        assert_eq!(world.scale(), 30.0);
    }

    #[test]
    fn test_joint_between_entities() {
        let mut world = world();
        let a = world
            .create_entity(&[EntityOptions::new().with_position(0.0, 0.0)])
            .unwrap()
            .unwrap();
        let b = world
            .create_entity(&[EntityOptions::new().with_position(2.0, 0.0)])
            .unwrap()
            .unwrap();

        let options = JointOptions::new(JointKind::Revolute)
            .with_offsets(Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0));
        world.create_joint(a, b, &options).unwrap();
        assert_eq!(world.physics().joint_count(), 1);

        let gear = JointOptions::new(JointKind::Gear);
        assert!(world.create_joint(a, b, &gear).is_err());

        world.entity_mut(b).unwrap().destroy();
        assert!(matches!(
            world.create_joint(a, b, &options),
            Err(WorldError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_unbind_by_identity() {
        let mut world = world();
        let first = world.on_tick(|_| {});
        let second = world.on_tick(|_| {});

        assert!(world.unbind_on_tick(&first));
        assert!(!world.unbind_on_tick(&first));
        assert_eq!(world.tick_callbacks.len(), 1);

        let render = world.on_render(|_, _| {});
        assert!(world.unbind_on_render(&render));
        assert!(world.unbind_on_tick(&second));
    }

    #[test]
    fn test_set_gravity() {
        let mut world = world();
        world.set_gravity((0.0, -3.0));
        assert_eq!(world.gravity(), Vec2::new(0.0, -3.0));
        assert_eq!(world.config().gravity, Vec2::new(0.0, -3.0));
    }
}
