//! Frame scheduler
//!
//! Structural changes never reach the engine mid-step. Requests made
//! while the world is locked wait in [`FrameQueues`] and are applied at
//! fixed points of the frame:
//!
//! ```text
//! velocities → impulses → forces → clamp → destroy
//!     → step (locked, events dispatched) → create → reposition
//!     → draw → render callbacks → clear forces → debug overlay
//! ```
//!
//! Ticks run on their own fixed period, independent of frames.

use crate::debug;
use crate::entity::EntityId;
use crate::error::{Result, WorldError};
use crate::options::EntityOptions;
use crate::world::{RenderBinding, TickBinding, World};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use void_canvas::DrawSurface;
use void_math::{clamp_symmetric, Vec2};

/// Deferred operations and per-frame constants, all FIFO
#[derive(Default)]
pub(crate) struct FrameQueues {
    pub(crate) destroy: VecDeque<EntityId>,
    pub(crate) impulses: VecDeque<(EntityId, Vec2)>,
    pub(crate) creations: VecDeque<EntityOptions>,
    pub(crate) positions: VecDeque<(EntityId, Vec2)>,
    /// Named forces applied every frame
    pub(crate) forces: BTreeMap<(EntityId, String), Vec2>,
    /// Named velocities held every frame
    pub(crate) velocities: BTreeMap<(EntityId, String), Vec2>,
}

impl FrameQueues {
    /// Drop everything queued for `id`
    pub(crate) fn purge(&mut self, id: EntityId) {
        self.destroy.retain(|queued| *queued != id);
        self.impulses.retain(|(queued, _)| *queued != id);
        self.positions.retain(|(queued, _)| *queued != id);
        self.forces.retain(|(owner, _), _| *owner != id);
        self.velocities.retain(|(owner, _), _| *owner != id);
    }
}

impl World {
    /// Run one animation frame, drawing onto `surface`.
    ///
    /// A failed frame halts the world; every later call returns
    /// [`WorldError::Halted`].
    pub fn frame(&mut self, surface: &mut dyn DrawSurface) -> Result<()> {
        if self.halted {
            return Err(WorldError::Halted);
        }
        if self.in_frame {
            return Err(WorldError::Reentrant);
        }

        self.in_frame = true;
        let result = self.run_frame(surface);
        self.in_frame = false;
        self.locked = false;

        match result {
            Ok(()) => {
                self.frame_count += 1;
                Ok(())
            }
            Err(e) => {
                log::error!("Frame {} failed, halting world: {}", self.frame_count, e);
                self.halted = true;
                Err(e)
            }
        }
    }

    fn run_frame(&mut self, surface: &mut dyn DrawSurface) -> Result<()> {
        self.apply_constant_velocities()?;
        self.drain_impulses()?;
        self.apply_constant_forces()?;
        self.clamp_velocities()?;
        self.drain_destroyed()?;

        self.locked = true;
        self.physics.step();
        let events = self.physics.drain_events();
        log::trace!("Frame {}: dispatching {} events", self.frame_count, events.len());
        self.dispatch_physics_events(events);
        self.locked = false;

        self.drain_creations()?;
        self.drain_positions()?;

        surface.clear();
        self.draw_entities(surface);
        self.run_render_callbacks(surface);

        self.physics.reset_forces();

        if self.config().debug_draw {
            debug::draw_overlay(self, surface);
        }
        Ok(())
    }

    fn apply_constant_velocities(&mut self) -> Result<()> {
        for ((id, _), velocity) in &self.queues.velocities {
            if let Some(entity) = self.entities.get(id) {
                self.physics.set_body_linear_velocity(entity.body, *velocity)?;
            }
        }
        Ok(())
    }

    fn drain_impulses(&mut self) -> Result<()> {
        while let Some((id, impulse)) = self.queues.impulses.pop_front() {
            if let Some(entity) = self.entities.get(&id) {
                self.physics.apply_impulse(entity.body, impulse)?;
            }
        }
        Ok(())
    }

    fn apply_constant_forces(&mut self) -> Result<()> {
        for ((id, _), force) in &self.queues.forces {
            if let Some(entity) = self.entities.get(id) {
                self.physics.apply_force(entity.body, *force)?;
            }
        }
        Ok(())
    }

    /// Hold every entity's linear velocity within its limits
    fn clamp_velocities(&mut self) -> Result<()> {
        for entity in self.entities.values() {
            let (limit_x, limit_y) = {
                let c = entity.config.borrow();
                (c.max_velocity_x, c.max_velocity_y)
            };
            let velocity = self.physics.body_linear_velocity(entity.body)?;
            let clamped = Vec2::new(
                clamp_symmetric(velocity.x, limit_x),
                clamp_symmetric(velocity.y, limit_y),
            );
            if clamped != velocity {
                self.physics.set_body_linear_velocity(entity.body, clamped)?;
            }
        }
        Ok(())
    }

    fn drain_destroyed(&mut self) -> Result<()> {
        while let Some(id) = self.queues.destroy.pop_front() {
            let Some(entity) = self.entities.remove(&id) else {
                continue;
            };
            self.physics.remove_rigid_body(entity.body)?;
            self.purge(id);
            log::debug!("Removed entity {} '{}'", id, entity.config.borrow().name);
        }
        Ok(())
    }

    fn drain_creations(&mut self) -> Result<()> {
        while let Some(options) = self.queues.creations.pop_front() {
            self.spawn(options)?;
        }
        Ok(())
    }

    fn drain_positions(&mut self) -> Result<()> {
        while let Some((id, position)) = self.queues.positions.pop_front() {
            if let Some(entity) = self.entities.get(&id) {
                self.physics.set_body_position(entity.body, position)?;
            }
        }
        Ok(())
    }

    fn run_render_callbacks(&mut self, surface: &mut dyn DrawSurface) {
        let callbacks = self.render_callbacks.clone();
        for binding in callbacks {
            match binding {
                RenderBinding::World(f) => f(self, surface),
                RenderBinding::Entity(id, f) => {
                    if let Some(mut entity) = self.live_entity_mut(id) {
                        f(&mut entity, surface);
                    }
                }
            }
        }
    }

    /// Run every tick callback once, in registration order
    pub fn tick(&mut self) -> Result<()> {
        if self.halted {
            return Err(WorldError::Halted);
        }

        let callbacks = self.tick_callbacks.clone();
        for binding in callbacks {
            match binding {
                TickBinding::World(f) => f(self),
                TickBinding::Entity(id, f) => {
                    if let Some(mut entity) = self.live_entity_mut(id) {
                        f(&mut entity);
                    }
                }
            }
        }
        Ok(())
    }

    /// Advance by `elapsed` wall time: run every tick that fell due, then
    /// one frame. Returns the number of ticks run.
    pub fn update(&mut self, elapsed: Duration, surface: &mut dyn DrawSurface) -> Result<u32> {
        if self.halted {
            return Err(WorldError::Halted);
        }

        self.tick_accumulator += elapsed;
        let period = self.config().tick_period();
        let mut ticks = 0;
        while self.tick_accumulator >= period {
            self.tick_accumulator -= period;
            self.tick()?;
            ticks += 1;
        }

        self.frame(surface)?;
        Ok(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{EntityOptions, WorldConfig};
    use std::cell::RefCell;
    use std::rc::Rc;
    use void_canvas::RecordingSurface;

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    #[test]
    fn test_destroy_removes_body_on_next_frame() {
        let mut world = world();
        let mut surface = RecordingSurface::default();
        let id = world
            .create_entity(&[EntityOptions::new().on_tick(|_| {})])
            .unwrap()
            .unwrap();
        {
            let mut entity = world.entity_mut(id).unwrap();
            entity.set_force("push", 1.0, 0.0);
            entity.destroy();
        }
        assert_eq!(world.physics().body_count(), 1);

        world.frame(&mut surface).unwrap();
        assert_eq!(world.physics().body_count(), 0);
        assert!(world.entity(id).is_none());
        assert!(world.queues.forces.is_empty());
        assert!(world.tick_callbacks.is_empty());
    }

    #[test]
    fn test_velocity_is_clamped() {
        let mut world = World::new(WorldConfig::default().with_gravity(0.0, 0.0)).unwrap();
        let mut surface = RecordingSurface::default();
        let id = world
            .create_entity(&[EntityOptions::new().with_max_velocity(2.0, 1.0)])
            .unwrap()
            .unwrap();
        world
            .entity_mut(id)
            .unwrap()
            .set_linear_velocity((10.0, -10.0));

        world.frame(&mut surface).unwrap();
        let v = world.entity(id).unwrap().linear_velocity();
        assert!(v.x <= 2.0 + 1e-4 && v.x > 0.0);
        assert!(v.y >= -1.0 - 1e-4 && v.y < 0.0);
    }

    #[test]
    fn test_constant_velocity_holds() {
        let mut world = world();
        let mut surface = RecordingSurface::default();
        let id = world.create_entity(&[EntityOptions::new()]).unwrap().unwrap();
        world
            .entity_mut(id)
            .unwrap()
            .set_velocity("walk", 3.0, 90.0);

        for _ in 0..10 {
            world.frame(&mut surface).unwrap();
        }
        let v = world.entity(id).unwrap().linear_velocity();
        approx::assert_relative_eq!(v.x, 3.0, epsilon = 1e-3);
    }

    #[test]
    fn test_update_runs_due_ticks() {
        let mut world = world();
        let mut surface = RecordingSurface::default();
        let ticks = Rc::new(RefCell::new(0));
        let counter = ticks.clone();
        world.on_tick(move |_| *counter.borrow_mut() += 1);

        assert_eq!(world.update(Duration::from_millis(30), &mut surface).unwrap(), 0);
        assert_eq!(world.update(Duration::from_millis(30), &mut surface).unwrap(), 1);
        assert_eq!(world.update(Duration::from_millis(100), &mut surface).unwrap(), 2);
        assert_eq!(*ticks.borrow(), 3);
        assert_eq!(world.frame_count(), 3);
    }

    #[test]
    fn test_tick_skips_destroyed_entities() {
        let mut world = world();
        let ticks = Rc::new(RefCell::new(0));
        let counter = ticks.clone();
        let id = world
            .create_entity(&[EntityOptions::new().on_tick(move |_| *counter.borrow_mut() += 1)])
            .unwrap()
            .unwrap();

        world.tick().unwrap();
        world.entity_mut(id).unwrap().destroy();
        world.tick().unwrap();
        assert_eq!(*ticks.borrow(), 1);
    }

    #[test]
    fn test_frame_from_render_callback_is_rejected() {
        let mut world = world();
        let mut surface = RecordingSurface::default();
        let seen = Rc::new(RefCell::new(None));
        let result = seen.clone();
        world.on_render(move |world, surface| {
            *result.borrow_mut() = Some(matches!(world.frame(surface), Err(WorldError::Reentrant)));
        });

        world.frame(&mut surface).unwrap();
        assert_eq!(*seen.borrow(), Some(true));
        assert!(!world.is_halted());
    }

    #[test]
    fn test_purge_keeps_other_entities() {
        let mut queues = FrameQueues::default();
        let a = EntityId(1);
        let b = EntityId(2);
        queues.impulses.push_back((a, Vec2::X));
        queues.impulses.push_back((b, Vec2::Y));
        queues.forces.insert((a, "f".into()), Vec2::X);
        queues.velocities.insert((b, "v".into()), Vec2::Y);

        queues.purge(a);
        assert_eq!(queues.impulses, VecDeque::from(vec![(b, Vec2::Y)]));
        assert!(queues.forces.is_empty());
        assert_eq!(queues.velocities.len(), 1);
    }
}
