//! Entities
//!
//! An entity is one engine body with one collider, plus the resolved
//! options that drive how it is drawn and limited. Handlers never hold an
//! entity directly; they get an [`EntityMut`] view for the duration of the
//! call and refer to other entities by [`EntityId`].

use crate::dispatch::{ContactPhase, DrawFn, EntityCallback, EntityRenderCallback, KeyEvent, KeyPhase};
use crate::options::{CustomProps, EntityConfig, Shape};
use crate::world::{RenderBinding, TickBinding, World};
use serde::de::DeserializeOwned;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use void_canvas::DrawSurface;
use void_math::{degrees, radians, Direction, Rect, Vec2};
use void_physics::{ColliderHandle, ColliderOutline, RigidBodyHandle, RigidBodyType};

/// Entity identifier. Never reused within a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub(crate) u64);

impl EntityId {
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Value stored in the engine's user data slot
    pub(crate) fn to_user_data(self) -> u128 {
        self.0 as u128
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registry record for one entity
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) body: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
    pub(crate) config: RefCell<EntityConfig>,
    pub(crate) custom: RefCell<CustomProps>,
    pub(crate) draw: RefCell<Option<DrawFn>>,
    pub(crate) destroyed: Cell<bool>,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        body: RigidBodyHandle,
        collider: ColliderHandle,
        config: EntityConfig,
        custom: CustomProps,
        draw: Option<DrawFn>,
    ) -> Self {
        Self {
            id,
            body,
            collider,
            config: RefCell::new(config),
            custom: RefCell::new(custom),
            draw: RefCell::new(draw),
            destroyed: Cell::new(false),
        }
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}

/// Log an engine lookup failure and fall back
fn or_warn<T>(result: void_physics::Result<T>, fallback: T) -> T {
    result.unwrap_or_else(|e| {
        log::warn!("{}", e);
        fallback
    })
}

/// Read-only view of an entity
pub struct EntityRef<'w> {
    pub(crate) world: &'w World,
    pub(crate) entity: &'w Entity,
}

/// Read/write view of an entity
pub struct EntityMut<'w> {
    pub(crate) world: &'w mut World,
    pub(crate) entity: Rc<Entity>,
}

/// Accessors shared by both views
macro_rules! read_accessors {
    ($view:ident) => {
        impl $view<'_> {
            pub fn id(&self) -> EntityId {
                self.entity.id
            }

            pub fn name(&self) -> String {
                self.entity.config.borrow().name.clone()
            }

            /// Flagged for removal; stays in the world until the next frame
            pub fn is_destroyed(&self) -> bool {
                self.entity.is_destroyed()
            }

            /// Snapshot of the entity's current settings
            pub fn config(&self) -> EntityConfig {
                self.entity.config.borrow().clone()
            }

            pub fn shape(&self) -> Shape {
                self.entity.config.borrow().shape
            }

            pub fn body_type(&self) -> RigidBodyType {
                self.entity.config.borrow().body_type
            }

            /// Centre of the body in meters
            pub fn position(&self) -> Vec2 {
                let c = self.entity.config.borrow();
                or_warn(
                    self.world.physics.body_position(self.entity.body),
                    Vec2::new(c.x, c.y),
                )
            }

            /// Rotation in degrees, clockwise
            pub fn rotation(&self) -> f32 {
                degrees(or_warn(self.world.physics.body_rotation(self.entity.body), 0.0))
            }

            /// Position on the canvas in pixels, camera and scale applied
            pub fn canvas_position(&self) -> (f32, f32) {
                let p = self.position();
                self.world.canvas_position_at(p.x, p.y)
            }

            pub fn linear_velocity(&self) -> Vec2 {
                or_warn(
                    self.world.physics.body_linear_velocity(self.entity.body),
                    Vec2::ZERO,
                )
            }

            pub fn friction(&self) -> f32 {
                or_warn(
                    self.world.physics.collider_friction(self.entity.collider),
                    self.entity.config.borrow().friction,
                )
            }

            pub fn restitution(&self) -> f32 {
                or_warn(
                    self.world.physics.collider_restitution(self.entity.collider),
                    self.entity.config.borrow().restitution,
                )
            }

            pub fn max_velocity_x(&self) -> f32 {
                self.entity.config.borrow().max_velocity_x
            }

            pub fn max_velocity_y(&self) -> f32 {
                self.entity.config.borrow().max_velocity_y
            }

            pub fn color(&self) -> String {
                self.entity.config.borrow().color.clone()
            }

            pub fn border_color(&self) -> String {
                self.entity.config.borrow().border_color.clone()
            }

            pub fn border_width(&self) -> f32 {
                self.entity.config.borrow().border_width
            }

            pub fn image(&self) -> Option<String> {
                self.entity.config.borrow().image.clone()
            }

            pub fn image_offset_x(&self) -> f32 {
                self.entity.config.borrow().image_offset_x
            }

            pub fn image_offset_y(&self) -> f32 {
                self.entity.config.borrow().image_offset_y
            }

            pub fn image_stretch_to_fit(&self) -> bool {
                self.entity.config.borrow().image_stretch_to_fit
            }

            pub fn sprite_sheet(&self) -> bool {
                self.entity.config.borrow().sprite_sheet
            }

            pub fn sprite_width(&self) -> f32 {
                self.entity.config.borrow().sprite_width
            }

            pub fn sprite_height(&self) -> f32 {
                self.entity.config.borrow().sprite_height
            }

            /// Current sprite-sheet frame as (column, row)
            pub fn sprite(&self) -> (u32, u32) {
                let c = self.entity.config.borrow();
                (c.sprite_x, c.sprite_y)
            }

            /// Custom `$` property
            pub fn custom(&self, key: &str) -> Option<serde_json::Value> {
                self.entity.custom.borrow().get(key).cloned()
            }

            /// Custom `$` property decoded as `T`
            pub fn custom_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
                self.entity.custom.borrow().get_as(key)
            }

            pub fn has_custom_draw(&self) -> bool {
                self.entity.draw.borrow().is_some()
            }

            /// Engine bounding box in meters
            pub fn aabb(&self) -> Option<Rect> {
                self.world.physics.collider_aabb(self.entity.collider).ok()
            }

            /// Collider outline in world meters
            pub fn outline(&self) -> Option<ColliderOutline> {
                self.world.physics.collider_outline(self.entity.collider).ok()
            }
        }
    };
}

read_accessors!(EntityRef);
read_accessors!(EntityMut);

impl<'w> EntityRef<'w> {
    pub fn world(&self) -> &'w World {
        self.world
    }
}

impl fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("id", &self.entity.id)
            .field("name", &self.entity.config.borrow().name)
            .field("destroyed", &self.entity.is_destroyed())
            .finish()
    }
}

impl fmt::Debug for EntityMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMut")
            .field("id", &self.entity.id)
            .field("name", &self.entity.config.borrow().name)
            .field("destroyed", &self.entity.is_destroyed())
            .finish()
    }
}

impl<'w> EntityMut<'w> {
    pub fn world(&self) -> &World {
        &*self.world
    }

    /// The owning world. Other entities are reached through it by id.
    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    /// Read-only view of the same entity
    pub fn to_ref(&self) -> EntityRef<'_> {
        EntityRef {
            world: &*self.world,
            entity: &*self.entity,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.entity.config.borrow_mut().name = name.into();
    }

    /// Move the body. Queued until after the step while the world is locked.
    pub fn set_position(&mut self, position: impl Into<Vec2>) {
        let position = position.into();
        if self.world.is_locked() {
            log::debug!("Queueing move of entity {} to {:?}", self.entity.id, position);
            self.world
                .queues
                .positions
                .push_back((self.entity.id, position));
            return;
        }
        if let Err(e) = self.world.physics.set_body_position(self.entity.body, position) {
            log::warn!("Could not move entity {}: {}", self.entity.id, e);
        }
    }

    /// Set rotation in degrees
    pub fn set_rotation(&mut self, degrees: f32) {
        if let Err(e) = self
            .world
            .physics
            .set_body_rotation(self.entity.body, radians(degrees))
        {
            log::warn!("Could not rotate entity {}: {}", self.entity.id, e);
        }
    }

    pub fn set_linear_velocity(&mut self, velocity: impl Into<Vec2>) {
        if let Err(e) = self
            .world
            .physics
            .set_body_linear_velocity(self.entity.body, velocity.into())
        {
            log::warn!("Could not set velocity of entity {}: {}", self.entity.id, e);
        }
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.entity.config.borrow_mut().friction = friction;
        if let Err(e) = self
            .world
            .physics
            .set_collider_friction(self.entity.collider, friction)
        {
            log::warn!("Could not set friction of entity {}: {}", self.entity.id, e);
        }
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.entity.config.borrow_mut().restitution = restitution;
        if let Err(e) = self
            .world
            .physics
            .set_collider_restitution(self.entity.collider, restitution)
        {
            log::warn!("Could not set restitution of entity {}: {}", self.entity.id, e);
        }
    }

    pub fn set_max_velocity_x(&mut self, limit: f32) {
        self.entity.config.borrow_mut().max_velocity_x = limit;
    }

    pub fn set_max_velocity_y(&mut self, limit: f32) {
        self.entity.config.borrow_mut().max_velocity_y = limit;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.entity.config.borrow_mut().color = color.into();
    }

    pub fn set_border_color(&mut self, color: impl Into<String>) {
        self.entity.config.borrow_mut().border_color = color.into();
    }

    pub fn set_border_width(&mut self, width: f32) {
        self.entity.config.borrow_mut().border_width = width;
    }

    /// Swap the image; `None` goes back to drawing the shape
    pub fn set_image(&mut self, src: Option<String>) {
        self.entity.config.borrow_mut().image = src;
    }

    pub fn set_image_offset_x(&mut self, offset: f32) {
        self.entity.config.borrow_mut().image_offset_x = offset;
    }

    pub fn set_image_offset_y(&mut self, offset: f32) {
        self.entity.config.borrow_mut().image_offset_y = offset;
    }

    pub fn set_image_stretch_to_fit(&mut self, stretch: bool) {
        self.entity.config.borrow_mut().image_stretch_to_fit = stretch;
    }

    pub fn set_sprite_sheet(&mut self, sprite_sheet: bool) {
        self.entity.config.borrow_mut().sprite_sheet = sprite_sheet;
    }

    pub fn set_sprite_width(&mut self, width: f32) {
        self.entity.config.borrow_mut().sprite_width = width;
    }

    pub fn set_sprite_height(&mut self, height: f32) {
        self.entity.config.borrow_mut().sprite_height = height;
    }

    /// Show the frame at (column, row) of the sprite sheet
    pub fn set_sprite(&mut self, x: u32, y: u32) {
        let mut c = self.entity.config.borrow_mut();
        c.sprite_x = x;
        c.sprite_y = y;
    }

    pub fn set_custom(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.entity.custom.borrow_mut().insert(key, value);
    }

    pub fn remove_custom(&mut self, key: &str) -> Option<serde_json::Value> {
        self.entity.custom.borrow_mut().remove(key)
    }

    /// Replace the default drawing
    pub fn set_draw(&mut self, f: impl Fn(&EntityRef<'_>, &mut dyn DrawSurface, f32, f32) + 'static) {
        *self.entity.draw.borrow_mut() = Some(Rc::new(f));
    }

    /// Go back to the default drawing
    pub fn clear_draw(&mut self) {
        *self.entity.draw.borrow_mut() = None;
    }

    // ==================== Forces ====================

    /// Queue an impulse for the start of the next frame
    pub fn apply_impulse(&mut self, power: f32, direction: impl Into<Direction>) {
        let impulse = direction.into().to_vector(power);
        self.world
            .queues
            .impulses
            .push_back((self.entity.id, impulse));
    }

    /// Apply a force every frame until [`clear_force`](Self::clear_force)
    /// is called with the same name
    pub fn set_force(&mut self, name: impl Into<String>, power: f32, direction: impl Into<Direction>) {
        let force = direction.into().to_vector(power);
        self.world
            .queues
            .forces
            .insert((self.entity.id, name.into()), force);
    }

    /// Hold the linear velocity every frame until
    /// [`clear_velocity`](Self::clear_velocity) is called with the same name
    pub fn set_velocity(
        &mut self,
        name: impl Into<String>,
        power: f32,
        direction: impl Into<Direction>,
    ) {
        let velocity = direction.into().to_vector(power);
        self.world
            .queues
            .velocities
            .insert((self.entity.id, name.into()), velocity);
    }

    pub fn clear_force(&mut self, name: &str) {
        self.world
            .queues
            .forces
            .remove(&(self.entity.id, name.to_owned()));
    }

    pub fn clear_velocity(&mut self, name: &str) {
        self.world
            .queues
            .velocities
            .remove(&(self.entity.id, name.to_owned()));
    }

    /// Flag the entity now and remove it at the start of the next frame
    pub fn destroy(&mut self) {
        if self.entity.destroyed.replace(true) {
            return;
        }
        log::debug!("Entity {} flagged for removal", self.entity.id);
        self.world.queues.destroy.push_back(self.entity.id);
    }

    // ==================== Handlers ====================

    pub fn on_key_down(&mut self, f: impl Fn(&mut EntityMut<'_>, &KeyEvent) + 'static) {
        self.world
            .handlers
            .keys_mut(KeyPhase::Down)
            .insert(self.entity.id, Rc::new(f));
    }

    pub fn on_key_up(&mut self, f: impl Fn(&mut EntityMut<'_>, &KeyEvent) + 'static) {
        self.world
            .handlers
            .keys_mut(KeyPhase::Up)
            .insert(self.entity.id, Rc::new(f));
    }

    pub fn on_start_contact(&mut self, f: impl Fn(&mut EntityMut<'_>, EntityId) + 'static) {
        self.world
            .handlers
            .contacts_mut(ContactPhase::Start)
            .insert(self.entity.id, Rc::new(f));
    }

    pub fn on_finish_contact(&mut self, f: impl Fn(&mut EntityMut<'_>, EntityId) + 'static) {
        self.world
            .handlers
            .contacts_mut(ContactPhase::Finish)
            .insert(self.entity.id, Rc::new(f));
    }

    /// Called after every step the entity is touching another, with the
    /// normal and tangent impulse of the first contact point
    pub fn on_impact(&mut self, f: impl Fn(&mut EntityMut<'_>, EntityId, f32, f32) + 'static) {
        self.world
            .handlers
            .impact
            .insert(self.entity.id, Rc::new(f));
    }

    /// Add a render callback bound to this entity. Unbind it with
    /// [`World::unbind_entity_on_render`].
    pub fn on_render(
        &mut self,
        f: impl Fn(&mut EntityMut<'_>, &mut dyn DrawSurface) + 'static,
    ) -> EntityRenderCallback {
        let callback: EntityRenderCallback = Rc::new(f);
        self.world
            .render_callbacks
            .push(RenderBinding::Entity(self.entity.id, callback.clone()));
        callback
    }

    /// Add a tick callback bound to this entity. Unbind it with
    /// [`World::unbind_entity_on_tick`].
    pub fn on_tick(&mut self, f: impl Fn(&mut EntityMut<'_>) + 'static) -> EntityCallback {
        let callback: EntityCallback = Rc::new(f);
        self.world
            .tick_callbacks
            .push(TickBinding::Entity(self.entity.id, callback.clone()));
        callback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{EntityOptions, WorldConfig};
    use approx::assert_relative_eq;

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    fn spawn(world: &mut World, options: EntityOptions) -> EntityId {
        world.create_entity(&[options]).unwrap().unwrap()
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut world = world();
        let a = spawn(&mut world, EntityOptions::new());
        let b = spawn(&mut world, EntityOptions::new());
        assert!(b > a);
        assert_eq!(a.to_string(), format!("#{}", a.raw()));
    }

    #[test]
    fn test_rotation_round_trips_degrees() {
        let mut world = world();
        let id = spawn(&mut world, EntityOptions::new().with_rotation(45.0));
        assert_relative_eq!(world.entity(id).unwrap().rotation(), 45.0, epsilon = 1e-3);

        world.entity_mut(id).unwrap().set_rotation(-90.0);
        assert_relative_eq!(world.entity(id).unwrap().rotation(), -90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_friction_is_forwarded_to_engine() {
        let mut world = world();
        let id = spawn(&mut world, EntityOptions::new().with_friction(0.4));
        assert_relative_eq!(world.entity(id).unwrap().friction(), 0.4);

        let mut entity = world.entity_mut(id).unwrap();
        entity.set_friction(0.1);
        entity.set_restitution(0.9);
        assert_relative_eq!(entity.friction(), 0.1);
        assert_relative_eq!(entity.restitution(), 0.9);
    }

    #[test]
    fn test_position_moves_immediately_when_unlocked() {
        let mut world = world();
        let id = spawn(&mut world, EntityOptions::new().with_position(1.0, 1.0));
        world.entity_mut(id).unwrap().set_position((4.0, 2.0));

        assert_eq!(world.entity(id).unwrap().position(), Vec2::new(4.0, 2.0));
        assert!(world.queues.positions.is_empty());
    }

    #[test]
    fn test_position_is_queued_while_locked() {
        let mut world = world();
        let id = spawn(&mut world, EntityOptions::new().with_position(1.0, 1.0));

        world.locked = true;
        world.entity_mut(id).unwrap().set_position((4.0, 2.0));
        world.locked = false;

        assert_eq!(world.entity(id).unwrap().position(), Vec2::new(1.0, 1.0));
        assert_eq!(world.queues.positions.len(), 1);
    }

    #[test]
    fn test_forces_are_named_per_entity() {
        let mut world = world();
        let id = spawn(&mut world, EntityOptions::new());
        let mut entity = world.entity_mut(id).unwrap();

        entity.set_force("thrust", 10.0, 0.0);
        entity.set_force("thrust", 20.0, 90.0);
        entity.set_force("wind", 1.0, (1.0, 0.0));
        entity.clear_force("wind");

        let force = world.queues.forces[&(id, "thrust".to_string())];
        assert_relative_eq!(force.x, 20.0, epsilon = 1e-4);
        assert_relative_eq!(force.y, 0.0, epsilon = 1e-4);
        assert_eq!(world.queues.forces.len(), 1);
    }

    #[test]
    fn test_impulse_direction_up_is_negative_y() {
        let mut world = world();
        let id = spawn(&mut world, EntityOptions::new());
        world.entity_mut(id).unwrap().apply_impulse(5.0, 0.0);

        let (queued_for, impulse) = world.queues.impulses[0];
        assert_eq!(queued_for, id);
        assert_relative_eq!(impulse.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(impulse.y, -5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_destroy_flags_once() {
        let mut world = world();
        let id = spawn(&mut world, EntityOptions::new());
        let mut entity = world.entity_mut(id).unwrap();
        entity.destroy();
        entity.destroy();

        assert!(world.entity(id).unwrap().is_destroyed());
        assert_eq!(world.queues.destroy.len(), 1);
    }

    #[test]
    fn test_custom_properties() {
        let mut world = world();
        let id = spawn(&mut world, EntityOptions::new().with_custom("lives", 3));
        let mut entity = world.entity_mut(id).unwrap();
        assert_eq!(entity.custom_as::<u32>("$lives"), Some(3));

        entity.set_custom("lives", 2);
        assert_eq!(entity.custom_as::<u32>("lives"), Some(2));
        assert!(entity.remove_custom("lives").is_some());
        assert!(entity.custom("lives").is_none());
    }

    #[test]
    fn test_sprite_frame() {
        let mut world = world();
        let id = spawn(&mut world, EntityOptions::new().with_sprite_sheet(32.0, 32.0));
        world.entity_mut(id).unwrap().set_sprite(2, 1);

        let entity = world.entity(id).unwrap();
        assert!(entity.sprite_sheet());
        assert_eq!(entity.sprite(), (2, 1));
    }
}
