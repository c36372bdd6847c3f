//! Option objects for worlds, entities and joints
//!
//! Entities are described by one or more [`EntityOptions`] "templates".
//! [`merge_options`] folds them into one: the rightmost argument wins, and
//! every key nobody sets falls back to [`EntityConfig::default`] when the
//! options are resolved.

use crate::dispatch::{
    ContactHandler, DrawFn, EntityCallback, EntityRenderCallback, ImpactHandler, KeyHandler,
};
use crate::entity::{EntityMut, EntityRef};
use crate::error::{Result, WorldError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use void_canvas::DrawSurface;
use void_math::Vec2;
use void_physics::{JointKind, PhysicsConfig, RigidBodyType};

/// Marker for pass-through custom properties
pub const CUSTOM_PREFIX: char = '$';

// ==================== World ====================

/// World configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldConfig {
    /// Gravity in m/s², +y is down
    pub gravity: Vec2,
    /// Bodies may sleep when they come to rest
    pub allow_sleep: bool,
    /// Pixels per meter
    pub scale: f32,
    /// Tick period in milliseconds
    pub tick_frequency: u64,
    /// Outline every collider over its image
    pub collision_outlines: bool,
    /// Draw the translucent shape and joint overlay after each frame
    pub debug_draw: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 10.0),
            allow_sleep: true,
            scale: 30.0,
            tick_frequency: 50,
            collision_outlines: false,
            debug_draw: false,
        }
    }
}

impl WorldConfig {
    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    /// Set render scale (pixels per meter)
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set tick period in milliseconds
    pub fn with_tick_frequency(mut self, millis: u64) -> Self {
        self.tick_frequency = millis;
        self
    }

    /// Allow or forbid sleeping bodies
    pub fn with_allow_sleep(mut self, allow: bool) -> Self {
        self.allow_sleep = allow;
        self
    }

    /// Outline colliders over images
    pub fn with_collision_outlines(mut self, enabled: bool) -> Self {
        self.collision_outlines = enabled;
        self
    }

    /// Draw the debug overlay
    pub fn with_debug_draw(mut self, enabled: bool) -> Self {
        self.debug_draw = enabled;
        self
    }

    /// Tick period
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_frequency)
    }

    /// Check values the world cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(WorldError::InvalidConfig(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(WorldError::InvalidConfig(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if self.tick_frequency == 0 {
            return Err(WorldError::InvalidConfig(
                "tickFrequency must be at least 1 ms".into(),
            ));
        }
        Ok(())
    }

    /// Physics settings for this world: 1/60 s steps, 10 solver iterations
    pub fn physics_config(&self) -> PhysicsConfig {
        PhysicsConfig::default()
            .with_gravity(self.gravity.x, self.gravity.y)
            .with_sleeping(self.allow_sleep)
    }
}

// ==================== Entity ====================

/// Collision shape of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Box of `width` x `height`
    #[default]
    Square,
    /// Circle of `radius`
    Circle,
    /// Convex polygon through `points`
    Polygon,
}

/// `$`-prefixed properties carried on an entity untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomProps(BTreeMap<String, serde_json::Value>);

impl CustomProps {
    /// Normalise `score` and `$score` to the stored `$score`
    fn key(key: &str) -> String {
        if key.starts_with(CUSTOM_PREFIX) {
            key.to_owned()
        } else {
            format!("{}{}", CUSTOM_PREFIX, key)
        }
    }

    /// Raw value of a property
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(&Self::key(key))
    }

    /// Property decoded as `T`, `None` if absent or of another type
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a property
    pub fn insert(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.0.insert(Self::key(key), value.into());
    }

    /// Remove a property
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.0.remove(&Self::key(key))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Behaviour attached through options. Not serializable.
#[derive(Clone, Default)]
pub struct EntityHandlers {
    pub init: Option<EntityCallback>,
    pub draw: Option<DrawFn>,
    pub on_key_down: Option<KeyHandler>,
    pub on_key_up: Option<KeyHandler>,
    pub on_start_contact: Option<ContactHandler>,
    pub on_finish_contact: Option<ContactHandler>,
    pub on_impact: Option<ImpactHandler>,
    pub on_render: Option<EntityRenderCallback>,
    pub on_tick: Option<EntityCallback>,
}

impl fmt::Debug for EntityHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityHandlers")
            .field("init", &self.init.is_some())
            .field("draw", &self.draw.is_some())
            .field("on_key_down", &self.on_key_down.is_some())
            .field("on_key_up", &self.on_key_up.is_some())
            .field("on_start_contact", &self.on_start_contact.is_some())
            .field("on_finish_contact", &self.on_finish_contact.is_some())
            .field("on_impact", &self.on_impact.is_some())
            .field("on_render", &self.on_render.is_some())
            .field("on_tick", &self.on_tick.is_some())
            .finish()
    }
}

/// Copy every unset field of `$target` from `$source`
macro_rules! fill_unset {
    ($target:expr, $source:expr; $($field:ident),* $(,)?) => {
        $(
            if $target.$field.is_none() {
                $target.$field = $source.$field.clone();
            }
        )*
    };
}

/// One entity template. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntityOptions {
    pub name: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    #[serde(rename = "type")]
    pub body_type: Option<RigidBodyType>,
    pub shape: Option<Shape>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub radius: Option<f32>,
    pub points: Option<Vec<Vec2>>,
    pub density: Option<f32>,
    pub friction: Option<f32>,
    pub restitution: Option<f32>,
    pub active: Option<bool>,
    /// Initial rotation in degrees
    pub rotation: Option<f32>,
    pub fixed_rotation: Option<bool>,
    pub bullet: Option<bool>,
    pub max_velocity_x: Option<f32>,
    pub max_velocity_y: Option<f32>,
    pub image: Option<String>,
    pub image_offset_x: Option<f32>,
    pub image_offset_y: Option<f32>,
    pub image_stretch_to_fit: Option<bool>,
    pub color: Option<String>,
    pub border_color: Option<String>,
    pub border_width: Option<f32>,
    pub sprite_sheet: Option<bool>,
    pub sprite_width: Option<f32>,
    pub sprite_height: Option<f32>,
    pub sprite_x: Option<u32>,
    pub sprite_y: Option<u32>,
    /// Further templates merged beneath this one
    pub components: Option<Vec<EntityOptions>>,

    /// Everything else; `$` keys become custom properties
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,

    #[serde(skip)]
    pub handlers: EntityHandlers,
}

impl EntityOptions {
    /// Empty template
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill every key this template leaves unset from `other`
    pub fn fill_from(&mut self, other: &EntityOptions) {
        fill_unset!(self, other; name, x, y, body_type, shape, width, height, radius, points,
            density, friction, restitution, active, rotation, fixed_rotation, bullet,
            max_velocity_x, max_velocity_y, image, image_offset_x, image_offset_y,
            image_stretch_to_fit, color, border_color, border_width, sprite_sheet,
            sprite_width, sprite_height, sprite_x, sprite_y, components);

        fill_unset!(self.handlers, other.handlers; init, draw, on_key_down, on_key_up,
            on_start_contact, on_finish_contact, on_impact, on_render, on_tick);

        for (key, value) in &other.extra {
            self.extra
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// This template with its components folded in beneath it.
    /// Later components win over earlier ones.
    pub fn expanded(&self) -> EntityOptions {
        let mut options = self.clone();
        if let Some(components) = options.components.take() {
            for component in components.iter().rev() {
                options.fill_from(&component.expanded());
            }
        }
        options
    }

    /// Expand components, apply defaults and split out custom properties
    pub fn resolve(&self) -> (EntityConfig, CustomProps) {
        let options = self.expanded();

        let mut custom = CustomProps::default();
        for (key, value) in &options.extra {
            if key.starts_with(CUSTOM_PREFIX) {
                custom.0.insert(key.clone(), value.clone());
            } else {
                log::debug!("Ignoring unknown entity option '{}'", key);
            }
        }

        let d = EntityConfig::default();
        let config = EntityConfig {
            name: options.name.unwrap_or(d.name),
            x: options.x.unwrap_or(d.x),
            y: options.y.unwrap_or(d.y),
            body_type: options.body_type.unwrap_or(d.body_type),
            shape: options.shape.unwrap_or(d.shape),
            width: options.width.unwrap_or(d.width),
            height: options.height.unwrap_or(d.height),
            radius: options.radius.unwrap_or(d.radius),
            points: options.points.unwrap_or(d.points),
            density: options.density.unwrap_or(d.density),
            friction: options.friction.unwrap_or(d.friction),
            restitution: options.restitution.unwrap_or(d.restitution),
            active: options.active.unwrap_or(d.active),
            rotation: options.rotation.or(d.rotation),
            fixed_rotation: options.fixed_rotation.unwrap_or(d.fixed_rotation),
            bullet: options.bullet.unwrap_or(d.bullet),
            max_velocity_x: options.max_velocity_x.unwrap_or(d.max_velocity_x),
            max_velocity_y: options.max_velocity_y.unwrap_or(d.max_velocity_y),
            image: options.image.or(d.image),
            image_offset_x: options.image_offset_x.unwrap_or(d.image_offset_x),
            image_offset_y: options.image_offset_y.unwrap_or(d.image_offset_y),
            image_stretch_to_fit: options
                .image_stretch_to_fit
                .unwrap_or(d.image_stretch_to_fit),
            color: options.color.unwrap_or(d.color),
            border_color: options.border_color.unwrap_or(d.border_color),
            border_width: options.border_width.unwrap_or(d.border_width),
            sprite_sheet: options.sprite_sheet.unwrap_or(d.sprite_sheet),
            sprite_width: options.sprite_width.unwrap_or(d.sprite_width),
            sprite_height: options.sprite_height.unwrap_or(d.sprite_height),
            sprite_x: options.sprite_x.unwrap_or(d.sprite_x),
            sprite_y: options.sprite_y.unwrap_or(d.sprite_y),
        };

        (config, custom)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Centre position in meters
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_type(mut self, body_type: RigidBodyType) -> Self {
        self.body_type = Some(body_type);
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Full width and height of a square shape
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_points(mut self, points: Vec<Vec2>) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = Some(density);
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = Some(friction);
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = Some(restitution);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Initial rotation in degrees
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = Some(fixed);
        self
    }

    pub fn with_bullet(mut self, bullet: bool) -> Self {
        self.bullet = Some(bullet);
        self
    }

    pub fn with_max_velocity(mut self, x: f32, y: f32) -> Self {
        self.max_velocity_x = Some(x);
        self.max_velocity_y = Some(y);
        self
    }

    pub fn with_image(mut self, src: impl Into<String>) -> Self {
        self.image = Some(src.into());
        self
    }

    /// Image offset in meters
    pub fn with_image_offset(mut self, x: f32, y: f32) -> Self {
        self.image_offset_x = Some(x);
        self.image_offset_y = Some(y);
        self
    }

    pub fn with_image_stretch_to_fit(mut self, stretch: bool) -> Self {
        self.image_stretch_to_fit = Some(stretch);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_border(mut self, color: impl Into<String>, width: f32) -> Self {
        self.border_color = Some(color.into());
        self.border_width = Some(width);
        self
    }

    /// Treat the image as a sheet of `width` x `height` pixel frames
    pub fn with_sprite_sheet(mut self, width: f32, height: f32) -> Self {
        self.sprite_sheet = Some(true);
        self.sprite_width = Some(width);
        self.sprite_height = Some(height);
        self
    }

    /// Frame column and row on the sprite sheet
    pub fn with_sprite(mut self, x: u32, y: u32) -> Self {
        self.sprite_x = Some(x);
        self.sprite_y = Some(y);
        self
    }

    /// Add a template merged beneath this one
    pub fn with_component(mut self, component: EntityOptions) -> Self {
        self.components.get_or_insert_with(Vec::new).push(component);
        self
    }

    /// Custom `$` property; the prefix is added if missing
    pub fn with_custom(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(CustomProps::key(key), value.into());
        self
    }

    pub fn with_init(mut self, f: impl Fn(&mut EntityMut<'_>) + 'static) -> Self {
        self.handlers.init = Some(Rc::new(f));
        self
    }

    /// Replace the default drawing. Receives the canvas position of the body.
    pub fn with_draw(
        mut self,
        f: impl Fn(&EntityRef<'_>, &mut dyn DrawSurface, f32, f32) + 'static,
    ) -> Self {
        self.handlers.draw = Some(Rc::new(f));
        self
    }

    pub fn on_key_down(
        mut self,
        f: impl Fn(&mut EntityMut<'_>, &crate::dispatch::KeyEvent) + 'static,
    ) -> Self {
        self.handlers.on_key_down = Some(Rc::new(f));
        self
    }

    pub fn on_key_up(
        mut self,
        f: impl Fn(&mut EntityMut<'_>, &crate::dispatch::KeyEvent) + 'static,
    ) -> Self {
        self.handlers.on_key_up = Some(Rc::new(f));
        self
    }

    pub fn on_start_contact(
        mut self,
        f: impl Fn(&mut EntityMut<'_>, crate::entity::EntityId) + 'static,
    ) -> Self {
        self.handlers.on_start_contact = Some(Rc::new(f));
        self
    }

    pub fn on_finish_contact(
        mut self,
        f: impl Fn(&mut EntityMut<'_>, crate::entity::EntityId) + 'static,
    ) -> Self {
        self.handlers.on_finish_contact = Some(Rc::new(f));
        self
    }

    pub fn on_impact(
        mut self,
        f: impl Fn(&mut EntityMut<'_>, crate::entity::EntityId, f32, f32) + 'static,
    ) -> Self {
        self.handlers.on_impact = Some(Rc::new(f));
        self
    }

    pub fn on_render(
        mut self,
        f: impl Fn(&mut EntityMut<'_>, &mut dyn DrawSurface) + 'static,
    ) -> Self {
        self.handlers.on_render = Some(Rc::new(f));
        self
    }

    pub fn on_tick(mut self, f: impl Fn(&mut EntityMut<'_>) + 'static) -> Self {
        self.handlers.on_tick = Some(Rc::new(f));
        self
    }
}

/// Merge templates; the rightmost one has the highest precedence.
/// Inputs are left untouched.
pub fn merge_options(options: &[EntityOptions]) -> EntityOptions {
    let mut merged = EntityOptions::default();
    for template in options.iter().rev() {
        merged.fill_from(template);
    }
    merged
}

/// Fully resolved entity settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfig {
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub body_type: RigidBodyType,
    pub shape: Shape,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub points: Vec<Vec2>,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub active: bool,
    pub rotation: Option<f32>,
    pub fixed_rotation: bool,
    pub bullet: bool,
    pub max_velocity_x: f32,
    pub max_velocity_y: f32,
    pub image: Option<String>,
    pub image_offset_x: f32,
    pub image_offset_y: f32,
    pub image_stretch_to_fit: bool,
    pub color: String,
    pub border_color: String,
    pub border_width: f32,
    pub sprite_sheet: bool,
    pub sprite_width: f32,
    pub sprite_height: f32,
    pub sprite_x: u32,
    pub sprite_y: u32,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            name: "unnamed object".into(),
            x: 10.0,
            y: 5.0,
            body_type: RigidBodyType::Dynamic,
            shape: Shape::Square,
            width: 1.0,
            height: 1.0,
            radius: 1.0,
            points: vec![Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(0.0, 2.0)],
            density: 2.0,
            friction: 1.0,
            restitution: 0.2,
            active: true,
            rotation: None,
            fixed_rotation: false,
            bullet: false,
            max_velocity_x: 1000.0,
            max_velocity_y: 1000.0,
            image: None,
            image_offset_x: 0.0,
            image_offset_y: 0.0,
            image_stretch_to_fit: false,
            color: "gray".into(),
            border_color: "black".into(),
            border_width: 1.0,
            sprite_sheet: false,
            sprite_width: 16.0,
            sprite_height: 16.0,
            sprite_x: 0,
            sprite_y: 0,
        }
    }
}

// ==================== Joint ====================

/// Joint template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JointOptions {
    #[serde(rename = "type")]
    pub kind: JointKind,
    /// Anchor offset from the first body's centre
    pub joint_position_on_entity1: Option<Vec2>,
    /// Anchor offset from the second body's centre; distance joints only
    pub joint_position_on_entity2: Option<Vec2>,
    /// Let the connected entities collide
    pub allow_collisions: bool,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_force: f32,
    /// Translation axis for prismatic and line joints
    pub axis: Option<Vec2>,
    /// Spring stiffness for mouse joints
    pub stiffness: Option<f32>,
    /// Damping for friction and mouse joints
    pub damping: Option<f32>,
}

impl JointOptions {
    pub fn new(kind: JointKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn with_offsets(mut self, on_entity1: Vec2, on_entity2: Vec2) -> Self {
        self.joint_position_on_entity1 = Some(on_entity1);
        self.joint_position_on_entity2 = Some(on_entity2);
        self
    }

    pub fn with_allow_collisions(mut self, allow: bool) -> Self {
        self.allow_collisions = allow;
        self
    }

    pub fn with_motor(mut self, speed: f32, max_force: f32) -> Self {
        self.enable_motor = true;
        self.motor_speed = speed;
        self.max_motor_force = max_force;
        self
    }

    pub fn with_axis(mut self, x: f32, y: f32) -> Self {
        self.axis = Some(Vec2::new(x, y));
        self
    }
}
