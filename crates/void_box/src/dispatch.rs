//! Event dispatch
//!
//! Routes keyboard input and the engine's contact begin/end and post-solve
//! reports to per-entity handlers. Each map holds at most one handler per
//! entity: registering again replaces the previous one.

use crate::entity::{EntityId, EntityMut, EntityRef};
use crate::world::World;
use std::collections::HashMap;
use std::rc::Rc;
use void_canvas::DrawSurface;
use void_physics::PhysicsEvent;

/// Contact begin/end handler: owning entity, other entity
pub type ContactHandler = Rc<dyn Fn(&mut EntityMut<'_>, EntityId)>;
/// Post-solve handler: owning entity, other entity, normal and tangent impulse
pub type ImpactHandler = Rc<dyn Fn(&mut EntityMut<'_>, EntityId, f32, f32)>;
/// Keyboard handler
pub type KeyHandler = Rc<dyn Fn(&mut EntityMut<'_>, &KeyEvent)>;
/// Entity init and tick callback
pub type EntityCallback = Rc<dyn Fn(&mut EntityMut<'_>)>;
/// Entity render callback
pub type EntityRenderCallback = Rc<dyn Fn(&mut EntityMut<'_>, &mut dyn DrawSurface)>;
/// World tick callback
pub type WorldCallback = Rc<dyn Fn(&mut World)>;
/// World render callback, run after all entities are drawn
pub type WorldRenderCallback = Rc<dyn Fn(&mut World, &mut dyn DrawSurface)>;
/// Custom entity drawing at a canvas position
pub type DrawFn = Rc<dyn Fn(&EntityRef<'_>, &mut dyn DrawSurface, f32, f32)>;

/// A key press or release
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key value, e.g. `"ArrowLeft"` or `"a"`
    pub key: String,
    /// Legacy numeric key code, e.g. 37 for the left arrow
    pub key_code: u32,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Auto-repeat while held
    pub repeat: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, key_code: u32) -> Self {
        Self {
            key: key.into(),
            key_code,
            ..Default::default()
        }
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }
}

#[cfg(feature = "web")]
impl From<&web_sys::KeyboardEvent> for KeyEvent {
    fn from(e: &web_sys::KeyboardEvent) -> Self {
        Self {
            key: e.key(),
            key_code: e.key_code(),
            shift: e.shift_key(),
            ctrl: e.ctrl_key(),
            alt: e.alt_key(),
            repeat: e.repeat(),
        }
    }
}

/// Which contact report a handler listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContactPhase {
    Start,
    Finish,
}

/// Which key report a handler listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyPhase {
    Down,
    Up,
}

/// Per-entity handler maps
#[derive(Default)]
pub(crate) struct HandlerMaps {
    pub(crate) key_down: HashMap<EntityId, KeyHandler>,
    pub(crate) key_up: HashMap<EntityId, KeyHandler>,
    pub(crate) start_contact: HashMap<EntityId, ContactHandler>,
    pub(crate) finish_contact: HashMap<EntityId, ContactHandler>,
    pub(crate) impact: HashMap<EntityId, ImpactHandler>,
}

impl HandlerMaps {
    pub(crate) fn keys(&self, phase: KeyPhase) -> &HashMap<EntityId, KeyHandler> {
        match phase {
            KeyPhase::Down => &self.key_down,
            KeyPhase::Up => &self.key_up,
        }
    }

    pub(crate) fn keys_mut(&mut self, phase: KeyPhase) -> &mut HashMap<EntityId, KeyHandler> {
        match phase {
            KeyPhase::Down => &mut self.key_down,
            KeyPhase::Up => &mut self.key_up,
        }
    }

    pub(crate) fn contacts(&self, phase: ContactPhase) -> &HashMap<EntityId, ContactHandler> {
        match phase {
            ContactPhase::Start => &self.start_contact,
            ContactPhase::Finish => &self.finish_contact,
        }
    }

    pub(crate) fn contacts_mut(
        &mut self,
        phase: ContactPhase,
    ) -> &mut HashMap<EntityId, ContactHandler> {
        match phase {
            ContactPhase::Start => &mut self.start_contact,
            ContactPhase::Finish => &mut self.finish_contact,
        }
    }

    /// Drop every handler bound to `id`
    pub(crate) fn remove(&mut self, id: EntityId) {
        self.key_down.remove(&id);
        self.key_up.remove(&id);
        self.start_contact.remove(&id);
        self.finish_contact.remove(&id);
        self.impact.remove(&id);
    }

    /// Number of handlers bound to `id`
    #[cfg(test)]
    pub(crate) fn count_for(&self, id: EntityId) -> usize {
        [
            self.key_down.contains_key(&id),
            self.key_up.contains_key(&id),
            self.start_contact.contains_key(&id),
            self.finish_contact.contains_key(&id),
            self.impact.contains_key(&id),
        ]
        .iter()
        .filter(|bound| **bound)
        .count()
    }
}

fn entity_id(user_data: u128) -> Option<EntityId> {
    u64::try_from(user_data).ok().map(EntityId)
}

impl World {
    /// Fan a key press out to every live entity with a key-down handler
    pub fn key_down(&mut self, event: &KeyEvent) {
        self.dispatch_key(KeyPhase::Down, event);
    }

    /// Fan a key release out to every live entity with a key-up handler
    pub fn key_up(&mut self, event: &KeyEvent) {
        self.dispatch_key(KeyPhase::Up, event);
    }

    fn dispatch_key(&mut self, phase: KeyPhase, event: &KeyEvent) {
        let mut handlers: Vec<(EntityId, KeyHandler)> = self
            .handlers
            .keys(phase)
            .iter()
            .map(|(id, h)| (*id, h.clone()))
            .collect();
        handlers.sort_by_key(|(id, _)| *id);

        log::trace!("{:?} '{}' to {} handlers", phase, event.key, handlers.len());
        for (id, handler) in handlers {
            if let Some(mut entity) = self.live_entity_mut(id) {
                handler(&mut entity, event);
            }
        }
    }

    /// Route one step's engine reports to entity handlers
    pub(crate) fn dispatch_physics_events(&mut self, events: Vec<PhysicsEvent>) {
        for event in events {
            match event {
                PhysicsEvent::Contact(contact) => {
                    let (Some(a), Some(b)) =
                        (entity_id(contact.user_data1), entity_id(contact.user_data2))
                    else {
                        continue;
                    };
                    let phase = if contact.is_started() {
                        ContactPhase::Start
                    } else {
                        ContactPhase::Finish
                    };
                    self.dispatch_contact(phase, a, b);
                }
                PhysicsEvent::Impact(impact) => {
                    let (Some(a), Some(b)) =
                        (entity_id(impact.user_data1), entity_id(impact.user_data2))
                    else {
                        continue;
                    };
                    self.dispatch_impact(a, b, impact.normal_impulse, impact.tangent_impulse);
                }
            }
        }
    }

    fn dispatch_contact(&mut self, phase: ContactPhase, a: EntityId, b: EntityId) {
        for (owner, other) in [(a, b), (b, a)] {
            let Some(handler) = self.handlers.contacts(phase).get(&owner).cloned() else {
                continue;
            };
            // Earlier handlers in this step may have destroyed the owner
            if let Some(mut entity) = self.live_entity_mut(owner) {
                handler(&mut entity, other);
            }
        }
    }

    fn dispatch_impact(&mut self, a: EntityId, b: EntityId, normal: f32, tangent: f32) {
        for (owner, other) in [(a, b), (b, a)] {
            let Some(handler) = self.handlers.impact.get(&owner).cloned() else {
                continue;
            };
            if let Some(mut entity) = self.live_entity_mut(owner) {
                handler(&mut entity, other, normal, tangent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{EntityOptions, WorldConfig};
    use std::cell::RefCell;

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    #[test]
    fn test_key_down_reaches_live_entities_only() {
        let mut world = world();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let mut ids = Vec::new();
        for name in ["a", "b"] {
            let log = seen.clone();
            let id = world
                .create_entity(&[EntityOptions::new().with_name(name).on_key_down(
                    move |e, key| log.borrow_mut().push((e.name(), key.key_code)),
                )])
                .unwrap()
                .unwrap();
            ids.push(id);
        }

        world.entity_mut(ids[1]).unwrap().destroy();
        world.key_down(&KeyEvent::new("ArrowLeft", 37));

        assert_eq!(*seen.borrow(), vec![("a".to_string(), 37)]);
    }

    #[test]
    fn test_key_up_does_not_fire_key_down() {
        let mut world = world();
        let downs = Rc::new(RefCell::new(0));
        let counter = downs.clone();
        world
            .create_entity(&[EntityOptions::new().on_key_down(move |_, _| {
                *counter.borrow_mut() += 1;
            })])
            .unwrap();

        world.key_up(&KeyEvent::new("a", 65));
        assert_eq!(*downs.borrow(), 0);
        world.key_down(&KeyEvent::new("a", 65));
        assert_eq!(*downs.borrow(), 1);
    }

    #[test]
    fn test_contact_fans_out_to_both_sides() {
        let mut world = world();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = seen.clone();
        let a = world
            .create_entity(&[EntityOptions::new().on_start_contact(move |e, other| {
                log.borrow_mut().push((e.id(), other));
            })])
            .unwrap()
            .unwrap();
        let log = seen.clone();
        let b = world
            .create_entity(&[EntityOptions::new().on_start_contact(move |e, other| {
                log.borrow_mut().push((e.id(), other));
            })])
            .unwrap()
            .unwrap();

        world.dispatch_contact(ContactPhase::Start, a, b);
        assert_eq!(*seen.borrow(), vec![(a, b), (b, a)]);

        // Finish handlers are a separate map
        world.dispatch_contact(ContactPhase::Finish, a, b);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_handler_destroying_other_side_skips_it() {
        let mut world = world();
        let hits = Rc::new(RefCell::new(0));

        let a = world
            .create_entity(&[EntityOptions::new().on_impact(|e, other, _, _| {
                if let Some(mut other) = e.world_mut().entity_mut(other) {
                    other.destroy();
                }
            })])
            .unwrap()
            .unwrap();
        let counter = hits.clone();
        let b = world
            .create_entity(&[EntityOptions::new().on_impact(move |_, _, _, _| {
                *counter.borrow_mut() += 1;
            })])
            .unwrap()
            .unwrap();

        world.dispatch_impact(a, b, 1.0, 0.0);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_handler_maps_remove() {
        let mut maps = HandlerMaps::default();
        let id = EntityId(3);
        let handler: ContactHandler = Rc::new(|_, _| {});
        maps.contacts_mut(ContactPhase::Start).insert(id, handler.clone());
        maps.contacts_mut(ContactPhase::Finish).insert(id, handler);
        assert_eq!(maps.count_for(id), 2);

        maps.remove(id);
        assert_eq!(maps.count_for(id), 0);
    }
}
