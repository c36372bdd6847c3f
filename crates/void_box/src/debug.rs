//! Debug overlay: translucent collider shapes and joint lines

use crate::world::World;
use void_canvas::DrawSurface;
use void_math::{consts::TAU, Vec2};
use void_physics::{ColliderOutline, RigidBodyType};

const FILL_ALPHA: f32 = 0.3;
const LINE_WIDTH: f32 = 1.0;
const JOINT_COLOR: &str = "rgb(128, 204, 204)";

fn body_color(body_type: RigidBodyType, active: bool) -> &'static str {
    if !active {
        return "rgb(128, 128, 77)";
    }
    match body_type {
        RigidBodyType::Static => "rgb(128, 230, 128)",
        RigidBodyType::Kinematic => "rgb(128, 128, 230)",
        RigidBodyType::Dynamic => "rgb(230, 179, 179)",
    }
}

/// Draw every collider and joint over the frame
pub(crate) fn draw_overlay(world: &World, surface: &mut dyn DrawSurface) {
    let camera = world.camera();
    let scale = world.scale();
    let to_canvas = |p: Vec2| {
        let c = (p - camera) * scale;
        (c.x, c.y)
    };

    surface.save();
    surface.set_line_width(LINE_WIDTH);

    for id in world.entity_ids() {
        let Some(entity) = world.entity(id) else {
            continue;
        };
        let Some(outline) = entity.outline() else {
            continue;
        };
        let color = body_color(entity.body_type(), entity.config().active);

        match outline {
            ColliderOutline::Polygon(points) => {
                let points: Vec<(f32, f32)> = points.into_iter().map(to_canvas).collect();
                surface.polygon(&points);
            }
            ColliderOutline::Circle { center, radius } => {
                let (cx, cy) = to_canvas(center);
                surface.begin_path();
                surface.arc(cx, cy, radius * scale, 0.0, TAU);
                surface.close_path();
            }
        }

        surface.set_fill_style(color);
        surface.set_global_alpha(FILL_ALPHA);
        surface.fill();
        surface.set_stroke_style(color);
        surface.set_global_alpha(1.0);
        surface.stroke();
    }

    surface.set_stroke_style(JOINT_COLOR);
    for (a, b) in world.physics().joint_segments() {
        let (ax, ay) = to_canvas(a);
        let (bx, by) = to_canvas(b);
        surface.begin_path();
        surface.move_to(ax, ay);
        surface.line_to(bx, by);
        surface.stroke();
    }

    surface.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{EntityOptions, Shape, WorldConfig};
    use void_canvas::{DrawCommand, RecordingSurface};
    use void_physics::JointKind;

    #[test]
    fn test_overlay_draws_shapes_and_joints() {
        let mut world = World::new(WorldConfig::default()).unwrap();
        let a = world
            .create_entity(&[EntityOptions::new().with_position(1.0, 1.0)])
            .unwrap()
            .unwrap();
        let b = world
            .create_entity(&[EntityOptions::new()
                .with_position(3.0, 1.0)
                .with_shape(Shape::Circle)
                .with_radius(0.5)])
            .unwrap()
            .unwrap();
        world
            .create_joint(a, b, &crate::options::JointOptions::new(JointKind::Weld))
            .unwrap();

        let mut surface = RecordingSurface::default();
        draw_overlay(&world, &mut surface);

        assert_eq!(surface.count(|c| *c == DrawCommand::Fill), 2);
        assert_eq!(surface.count(|c| *c == DrawCommand::Stroke), 3);
        assert!(surface
            .commands()
            .contains(&DrawCommand::StrokeStyle(JOINT_COLOR.into())));
        assert!(surface
            .commands()
            .contains(&DrawCommand::GlobalAlpha(FILL_ALPHA)));
    }

    #[test]
    fn test_inactive_bodies_have_their_own_color() {
        assert_ne!(
            body_color(RigidBodyType::Dynamic, false),
            body_color(RigidBodyType::Dynamic, true)
        );
    }
}
