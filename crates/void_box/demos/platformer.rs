//! Headless platformer
//!
//! A player box walks right across a floor, jumping onto a see-saw and
//! collecting coins on the way. Key presses are scripted so the demo runs
//! without a browser; drawing goes to a recording surface.
//!
//! Usage: RUST_LOG=debug cargo run -p void_box --example platformer

use std::time::Duration;

use void_box::prelude::*;
use void_box::{DrawCommand, JointOptions};

const FRAME: Duration = Duration::from_millis(16);
const RIGHT: u32 = 39;
const SPACE: u32 = 32;

fn player() -> EntityOptions {
    EntityOptions::new()
        .with_name("player")
        .with_position(2.0, 10.0)
        .with_size(0.8, 1.2)
        .with_fixed_rotation(true)
        .with_max_velocity(6.0, 20.0)
        .with_color("steelblue")
        .with_custom("$score", 0)
        .on_key_down(|e, key| match key.key_code {
            RIGHT => e.set_velocity("walk", 4.0, 90.0),
            SPACE if e.linear_velocity().y.abs() < 0.01 => e.apply_impulse(6.0, 0.0),
            _ => {}
        })
        .on_key_up(|e, key| {
            if key.key_code == RIGHT {
                e.clear_velocity("walk");
            }
        })
}

fn coin(x: f32, y: f32) -> EntityOptions {
    let template = EntityOptions::new()
        .with_name("coin")
        .with_type(RigidBodyType::Static)
        .with_shape(Shape::Circle)
        .with_radius(0.25)
        .with_color("gold")
        .with_custom("$value", 10)
        .on_start_contact(|e, other| {
            let is_player = e.world().entity(other).is_some_and(|o| o.name() == "player");
            if !is_player || e.is_destroyed() {
                return;
            }
            let value = e.custom_as::<u32>("value").unwrap_or(0);
            if let Some(mut player) = e.world_mut().entity_mut(other) {
                let score = player.custom_as::<u32>("score").unwrap_or(0) + value;
                player.set_custom("score", score);
                log::info!("Coin collected, score {}", score);
            }
            e.destroy();
        });
    EntityOptions::new().with_position(x, y).with_component(template)
}

fn build(world: &mut World) -> void_box::Result<EntityId> {
    let static_box = EntityOptions::new()
        .with_type(RigidBodyType::Static)
        .with_color("darkgreen")
        .with_border("black", 1.0);

    world.create_entity(&[
        static_box.clone(),
        EntityOptions::new()
            .with_name("floor")
            .with_position(15.0, 14.0)
            .with_size(30.0, 1.0),
    ])?;

    // See-saw: a plank pinned to a static pivot
    let pivot = world.create_entity(&[
        static_box,
        EntityOptions::new()
            .with_name("pivot")
            .with_shape(Shape::Circle)
            .with_radius(0.2)
            .with_position(12.0, 12.5),
    ])?;
    let plank = world.create_entity(&[EntityOptions::new()
        .with_name("plank")
        .with_position(12.0, 12.2)
        .with_size(5.0, 0.2)
        .with_density(1.0)
        .with_color("sienna")])?;
    if let (Some(pivot), Some(plank)) = (pivot, plank) {
        world.create_joint(pivot, plank, &JointOptions::new(JointKind::Revolute))?;
    }

    for x in [6.0, 9.0, 15.0, 18.0] {
        world.create_entity(&[coin(x, 13.2)])?;
    }

    let player = world
        .create_entity(&[player()])?
        .ok_or_else(|| WorldError::InvalidConfig("player creation was deferred".into()))?;
    Ok(player)
}

fn main() -> void_box::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut world = World::new(WorldConfig::default().with_scale(20.0))?;
    let player = build(&mut world)?;

    // Keep the camera centred on the player
    world.on_tick(move |world| {
        if let Some(position) = world.entity(player).map(|p| p.position()) {
            world.set_camera(position - Vec2::new(16.0, 12.0));
        }
    });
    // Score bar
    world.on_render(move |world, surface| {
        let score = world
            .entity(player)
            .and_then(|p| p.custom_as::<u32>("score"))
            .unwrap_or(0) as f32;
        surface.save();
        surface.set_fill_style("gold");
        surface.polygon(&[(10.0, 10.0), (10.0 + score, 10.0), (10.0 + score, 18.0), (10.0, 18.0)]);
        surface.fill();
        surface.restore();
    });

    let mut surface = RecordingSurface::new(640.0, 480.0);
    world.key_down(&KeyEvent::new("ArrowRight", RIGHT));

    for frame in 0..600u32 {
        if frame % 90 == 45 {
            world.key_down(&KeyEvent::new(" ", SPACE));
            world.key_up(&KeyEvent::new(" ", SPACE));
        }
        if frame == 480 {
            world.key_up(&KeyEvent::new("ArrowRight", RIGHT));
        }
        world.update(FRAME, &mut surface)?;
        let commands = surface.take_commands();

        if frame % 60 == 0 {
            if let Some(p) = world.entity(player) {
                log::info!(
                    "t={:.1}s player at ({:.2}, {:.2}), {} entities, {} draw commands",
                    frame as f32 * FRAME.as_secs_f32(),
                    p.position().x,
                    p.position().y,
                    world.entity_count(),
                    commands.iter().filter(|c| **c != DrawCommand::Save).count()
                );
            }
        }
    }

    let score = world
        .entity(player)
        .and_then(|p| p.custom_as::<u32>("score"))
        .unwrap_or(0);
    log::info!(
        "Finished after {} frames: score {}, {} coins left",
        world.frame_count(),
        score,
        world.find_by_name("coin").len()
    );
    Ok(())
}
