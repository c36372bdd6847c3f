//! Physics events (contact begin/end, post-solve impacts)

use crate::collider::ColliderHandle;
use rapier2d::prelude as rapier;

/// Type of contact event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEventType {
    /// Two colliders started touching
    Started,
    /// Two colliders stopped touching
    Stopped,
}

/// A contact begin/end event between two colliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// First collider
    pub collider1: ColliderHandle,
    /// Second collider
    pub collider2: ColliderHandle,
    /// Event type
    pub event_type: ContactEventType,
    /// User data from collider 1
    pub user_data1: u128,
    /// User data from collider 2
    pub user_data2: u128,
}

impl ContactEvent {
    /// Check if this is a start event
    pub fn is_started(&self) -> bool {
        self.event_type == ContactEventType::Started
    }

    /// Check if this is a stop event
    pub fn is_stopped(&self) -> bool {
        self.event_type == ContactEventType::Stopped
    }
}

/// Solver result for a touching contact pair after a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactEvent {
    /// First collider
    pub collider1: ColliderHandle,
    /// Second collider
    pub collider2: ColliderHandle,
    /// Impulse along the contact normal at the first contact point
    pub normal_impulse: f32,
    /// Friction impulse along the contact tangent at the first contact point
    pub tangent_impulse: f32,
    /// User data from collider 1
    pub user_data1: u128,
    /// User data from collider 2
    pub user_data2: u128,
}

/// Everything the engine reported during one step, in report order
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsEvent {
    Contact(ContactEvent),
    Impact(ImpactEvent),
}

/// Buffer of events produced by the last step
#[derive(Debug, Default)]
pub struct EventCollector {
    /// Contact events this step
    pub contact_events: Vec<ContactEvent>,
    /// Impact events this step
    pub impact_events: Vec<ImpactEvent>,
}

impl EventCollector {
    /// Create a new event collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all collected events
    pub fn clear(&mut self) {
        self.contact_events.clear();
        self.impact_events.clear();
    }

    /// Drain events: contacts first (the engine reports them during the
    /// step), then impacts (reported after solving).
    pub fn drain(&mut self) -> Vec<PhysicsEvent> {
        let mut events = Vec::with_capacity(self.contact_events.len() + self.impact_events.len());
        events.extend(self.contact_events.drain(..).map(PhysicsEvent::Contact));
        events.extend(self.impact_events.drain(..).map(PhysicsEvent::Impact));
        events
    }

    /// Get contact start events
    pub fn started_contacts(&self) -> impl Iterator<Item = &ContactEvent> {
        self.contact_events.iter().filter(|e| e.is_started())
    }

    /// Get contact end events
    pub fn stopped_contacts(&self) -> impl Iterator<Item = &ContactEvent> {
        self.contact_events.iter().filter(|e| e.is_stopped())
    }
}

/// Channel-based collector handed to the Rapier pipeline
pub(crate) struct ChannelEventCollector {
    pub(crate) collision_events: crossbeam_channel::Sender<rapier::CollisionEvent>,
}

impl rapier::EventHandler for ChannelEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &rapier::RigidBodySet,
        _colliders: &rapier::ColliderSet,
        event: rapier::CollisionEvent,
        _contact_pair: Option<&rapier::ContactPair>,
    ) {
        let _ = self.collision_events.send(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &rapier::RigidBodySet,
        _colliders: &rapier::ColliderSet,
        _contact_pair: &rapier::ContactPair,
        _total_force_magnitude: f32,
    ) {
        // Impacts are read from the narrow phase after the step
    }
}

/// Signed value of a single-axis tangent impulse
pub(crate) trait TangentComponent {
    fn component(&self) -> f32;
}

impl TangentComponent for f32 {
    fn component(&self) -> f32 {
        *self
    }
}

impl TangentComponent for rapier2d::na::Vector1<f32> {
    fn component(&self) -> f32 {
        self.x
    }
}

impl TangentComponent for [f32; 1] {
    fn component(&self) -> f32 {
        self[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(event_type: ContactEventType) -> ContactEvent {
        ContactEvent {
            collider1: ColliderHandle(rapier::ColliderHandle::invalid()),
            collider2: ColliderHandle(rapier::ColliderHandle::invalid()),
            event_type,
            user_data1: 1,
            user_data2: 2,
        }
    }

    #[test]
    fn test_drain_orders_contacts_before_impacts() {
        let mut collector = EventCollector::new();
        collector.impact_events.push(ImpactEvent {
            collider1: ColliderHandle(rapier::ColliderHandle::invalid()),
            collider2: ColliderHandle(rapier::ColliderHandle::invalid()),
            normal_impulse: 1.0,
            tangent_impulse: 0.0,
            user_data1: 1,
            user_data2: 2,
        });
        collector.contact_events.push(contact(ContactEventType::Started));

        let events = collector.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PhysicsEvent::Contact(_)));
        assert!(matches!(events[1], PhysicsEvent::Impact(_)));
        assert!(collector.contact_events.is_empty());
    }

    #[test]
    fn test_started_and_stopped_filters() {
        let mut collector = EventCollector::new();
        collector.contact_events.push(contact(ContactEventType::Started));
        collector.contact_events.push(contact(ContactEventType::Stopped));
        collector.contact_events.push(contact(ContactEventType::Started));

        assert_eq!(collector.started_contacts().count(), 2);
        assert_eq!(collector.stopped_contacts().count(), 1);
    }
}
