//! Entity rendering
//!
//! Entities with an image draw it centred on the body and rotated with
//! it. Everything else draws its collider outline. With collision outlines
//! enabled the outline is always drawn, in magenta, over the image.

use crate::entity::{EntityId, EntityRef};
use crate::options::{EntityConfig, Shape};
use crate::world::World;
use void_canvas::DrawSurface;
use void_math::{consts::TAU, radians, Rect, Vec2};
use void_physics::ColliderOutline;

/// Image pixels per meter when an image is not stretched to fit
pub const IMAGE_PIXELS_PER_METER: f32 = 30.0;

const OUTLINE_COLOR: &str = "rgb(255, 0, 255)";
const OUTLINE_WIDTH: f32 = 2.0;

impl World {
    /// Draw every live entity in creation order
    pub(crate) fn draw_entities(&self, surface: &mut dyn DrawSurface) {
        let ids: Vec<EntityId> = self.entity_ids();
        for id in ids {
            let Some(entity) = self.entity(id) else {
                continue;
            };
            let (x, y) = entity.canvas_position();
            let custom = entity.entity.draw.borrow().clone();
            match custom {
                Some(draw) => draw(&entity, surface, x, y),
                None => draw_entity(&entity, surface, x, y),
            }
        }
    }
}

/// Size in meters the image is drawn at
fn image_size(config: &EntityConfig, natural: (f32, f32)) -> (f32, f32) {
    if config.image_stretch_to_fit {
        match config.shape {
            Shape::Circle => (config.radius * 2.0, config.radius * 2.0),
            _ => (config.width, config.height),
        }
    } else if config.sprite_sheet {
        (
            config.sprite_width / IMAGE_PIXELS_PER_METER,
            config.sprite_height / IMAGE_PIXELS_PER_METER,
        )
    } else {
        (
            natural.0 / IMAGE_PIXELS_PER_METER,
            natural.1 / IMAGE_PIXELS_PER_METER,
        )
    }
}

/// Default drawing for one entity at canvas position `(x, y)`
pub fn draw_entity(entity: &EntityRef<'_>, surface: &mut dyn DrawSurface, x: f32, y: f32) {
    let world = entity.world();
    let config = entity.config();
    let scale = world.scale();
    let outlines = world.config().collision_outlines;

    surface.save();
    surface.set_fill_style(&config.color);
    surface.set_stroke_style(&config.border_color);
    surface.set_line_width(config.border_width);

    if let Some(src) = &config.image {
        // Not loaded yet: nothing to draw this frame
        if let Some(natural) = surface.image_size(src) {
            let (width, height) = image_size(&config, natural);
            let dest = Rect::from_origin_size(
                -(width / 2.0 * scale),
                -(height / 2.0 * scale),
                width * scale,
                height * scale,
            );
            let source = config.sprite_sheet.then(|| {
                Rect::from_origin_size(
                    config.sprite_x as f32 * config.sprite_width,
                    config.sprite_y as f32 * config.sprite_height,
                    config.sprite_width,
                    config.sprite_height,
                )
            });

            surface.save();
            surface.translate(
                x + config.image_offset_x * scale,
                y + config.image_offset_y * scale,
            );
            surface.rotate(radians(entity.rotation()));
            surface.draw_image(src, source, dest);
            surface.restore();
        }

        if !outlines {
            surface.restore();
            return;
        }
        surface.set_fill_style("transparent");
    }

    if outlines {
        surface.set_stroke_style(OUTLINE_COLOR);
        surface.set_line_width(OUTLINE_WIDTH);
    }

    let camera = world.camera();
    let to_canvas = |p: Vec2| {
        let c = (p - camera) * scale;
        (c.x, c.y)
    };

    match entity.outline() {
        Some(ColliderOutline::Polygon(points)) => {
            let points: Vec<(f32, f32)> = points.into_iter().map(to_canvas).collect();
            surface.polygon(&points);
        }
        Some(ColliderOutline::Circle { center, radius }) => {
            let (cx, cy) = to_canvas(center);
            surface.begin_path();
            surface.arc(cx, cy, radius * scale, 0.0, TAU);
            surface.close_path();
        }
        None => {
            surface.restore();
            return;
        }
    }

    if config.border_width != 0.0 || outlines {
        surface.stroke();
    }
    surface.fill();
    surface.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{EntityOptions, WorldConfig};
    use approx::assert_relative_eq;
    use void_canvas::{DrawCommand, RecordingSurface};
    use void_physics::RigidBodyType;

    fn world(config: WorldConfig) -> World {
        World::new(config).unwrap()
    }

    fn draw(world: &World, id: EntityId, surface: &mut RecordingSurface) {
        let entity = world.entity(id).unwrap();
        let (x, y) = entity.canvas_position();
        draw_entity(&entity, surface, x, y);
    }

    #[test]
    fn test_square_draws_closed_outline() {
        let mut world = world(WorldConfig::default());
        let id = world
            .create_entity(&[EntityOptions::new()
                .with_position(2.0, 2.0)
                .with_size(2.0, 2.0)
                .with_color("red")])
            .unwrap()
            .unwrap();

        let mut surface = RecordingSurface::default();
        draw(&world, id, &mut surface);

        let commands = surface.commands();
        assert!(commands.contains(&DrawCommand::FillStyle("red".into())));
        assert!(commands.contains(&DrawCommand::MoveTo(30.0, 30.0)));
        assert_eq!(surface.count(|c| matches!(c, DrawCommand::LineTo(..))), 3);
        assert_eq!(surface.count(|c| *c == DrawCommand::Stroke), 1);
        assert_eq!(surface.count(|c| *c == DrawCommand::Fill), 1);
    }

    #[test]
    fn test_zero_border_skips_stroke() {
        let mut world = world(WorldConfig::default());
        let id = world
            .create_entity(&[EntityOptions::new()
                .with_shape(Shape::Circle)
                .with_radius(0.5)
                .with_border("black", 0.0)])
            .unwrap()
            .unwrap();

        let mut surface = RecordingSurface::default();
        draw(&world, id, &mut surface);

        assert_eq!(surface.count(|c| *c == DrawCommand::Stroke), 0);
        let arc = surface
            .commands()
            .iter()
            .find_map(|c| match c {
                DrawCommand::Arc { x, y, radius, .. } => Some((*x, *y, *radius)),
                _ => None,
            })
            .unwrap();
        assert_eq!(arc, (300.0, 150.0, 15.0));
    }

    #[test]
    fn test_image_hides_outline() {
        let mut world = world(WorldConfig::default());
        let id = world
            .create_entity(&[EntityOptions::new()
                .with_position(1.0, 1.0)
                .with_image("crate.png")])
            .unwrap()
            .unwrap();

        let mut surface = RecordingSurface::default().with_image("crate.png", 60.0, 30.0);
        draw(&world, id, &mut surface);

        let images = surface.images_drawn();
        assert_eq!(images.len(), 1);
        let (src, source, dest) = images[0];
        assert_eq!(src, "crate.png");
        assert!(source.is_none());
        // 60x30 px image at 30 px/m is 2x1 m, drawn at 30 px/m
        assert_relative_eq!(dest.width(), 60.0);
        assert_relative_eq!(dest.height(), 30.0);
        assert_relative_eq!(dest.min.x, -30.0);
        assert!(surface.commands().contains(&DrawCommand::Translate(30.0, 30.0)));
        assert_eq!(surface.count(|c| *c == DrawCommand::Fill), 0);
    }

    #[test]
    fn test_unloaded_image_draws_nothing() {
        let mut world = world(WorldConfig::default());
        let id = world
            .create_entity(&[EntityOptions::new().with_image("later.png")])
            .unwrap()
            .unwrap();

        let mut surface = RecordingSurface::default();
        draw(&world, id, &mut surface);
        assert!(surface.images_drawn().is_empty());
        assert_eq!(surface.count(|c| *c == DrawCommand::Fill), 0);
    }

    #[test]
    fn test_sprite_sheet_slices_frame() {
        let mut world = world(WorldConfig::default());
        let id = world
            .create_entity(&[EntityOptions::new()
                .with_image("hero.png")
                .with_sprite_sheet(16.0, 24.0)
                .with_sprite(2, 1)])
            .unwrap()
            .unwrap();

        let mut surface = RecordingSurface::default().with_image("hero.png", 64.0, 48.0);
        draw(&world, id, &mut surface);

        let (_, source, dest) = surface.images_drawn()[0];
        assert_eq!(source, Some(Rect::from_origin_size(32.0, 24.0, 16.0, 24.0)));
        assert_relative_eq!(dest.width(), 16.0, epsilon = 1e-4);
        assert_relative_eq!(dest.height(), 24.0, epsilon = 1e-4);
    }

    #[test]
    fn test_collision_outlines_draw_over_image() {
        let mut world = world(WorldConfig::default().with_collision_outlines(true));
        let id = world
            .create_entity(&[EntityOptions::new()
                .with_type(RigidBodyType::Static)
                .with_image("crate.png")
                .with_image_stretch_to_fit(true)])
            .unwrap()
            .unwrap();

        let mut surface = RecordingSurface::default().with_image("crate.png", 8.0, 8.0);
        draw(&world, id, &mut surface);

        let commands = surface.commands();
        assert_eq!(surface.images_drawn().len(), 1);
        assert!(commands.contains(&DrawCommand::FillStyle("transparent".into())));
        assert!(commands.contains(&DrawCommand::StrokeStyle(OUTLINE_COLOR.into())));
        assert!(commands.contains(&DrawCommand::LineWidth(OUTLINE_WIDTH)));
        assert_eq!(surface.count(|c| *c == DrawCommand::Stroke), 1);
    }

    #[test]
    fn test_custom_draw_replaces_default() {
        let mut world = world(WorldConfig::default());
        world
            .create_entity(&[EntityOptions::new().with_draw(|_, surface, x, y| {
                surface.begin_path();
                surface.arc(x, y, 1.0, 0.0, TAU);
            })])
            .unwrap();

        let mut surface = RecordingSurface::default();
        world.draw_entities(&mut surface);
        assert_eq!(surface.count(|c| *c == DrawCommand::Fill), 0);
        assert_eq!(surface.count(|c| matches!(c, DrawCommand::Arc { .. })), 1);
    }
}
