//! Event system for thread-safe simulation state updates.
//!
//! Uses an event queue to collect state changes from parallel organism updates,
//! then applies them serially to avoid race conditions.

use log::debug;

use super::ecosystem::Ecosystem;
use super::registry::EntityId;

/// Events that modify simulation state.
///
/// Collected during parallel updates and applied serially to maintain consistency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationEvent {
    /// A hunting organism touched its target.
    ContactFeed {
        /// ID of the organism that tries to eat.
        consumer: EntityId,
        /// ID of the entity it touched.
        consumed: EntityId,
    },
    /// An organism's wander timer elapsed and it needs a new wander spot.
    WanderExpired {
        /// ID of the organism.
        organism: EntityId,
    },
}

impl SimulationEvent {
    /// Organism that produced the event.
    pub fn source(&self) -> EntityId {
        match self {
            SimulationEvent::ContactFeed { consumer, .. } => *consumer,
            SimulationEvent::WanderExpired { organism } => *organism,
        }
    }
}

/// Queue for collecting simulation events from parallel updates.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SimulationEvent>,
}

impl EventQueue {
    /// Creates an empty event queue.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Adds an event to the queue.
    pub fn push(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    /// Adds all events from one organism update.
    pub fn extend(&mut self, events: impl IntoIterator<Item = SimulationEvent>) {
        self.events.extend(events);
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drains all events, ordered by source organism id.
    ///
    /// Parallel pushes arrive in arbitrary order; sorting makes the serial
    /// phase deterministic, and the lowest consumer id wins contested food.
    pub fn drain_sorted(&mut self) -> std::vec::Drain<'_, SimulationEvent> {
        self.events.sort_by_key(SimulationEvent::source);
        self.events.drain(..)
    }
}

/// Applies all queued events to the ecosystem state.
pub fn apply_events(state: &mut Ecosystem, mut queue: EventQueue) {
    for event in queue.drain_sorted() {
        match event {
            SimulationEvent::WanderExpired { organism } => {
                state.reroll_wander_spot(organism);
            }
            SimulationEvent::ContactFeed { consumer, consumed } => {
                // Losers of a contested meal see a stale id here.
                if let Err(err) = state.contact_feed(consumer, consumed) {
                    debug!("contact feed {consumer} -> {consumed} dropped: {err}");
                }
            }
        }
    }
}
