//! Bounded history of notable ecosystem events.
//!
//! Births, deaths, feeds, growth, energy spending and goal progress are
//! recorded with their simulation time. Only the newest entries are kept.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One recorded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Simulation time in seconds.
    pub time: f32,
    /// Short description, e.g. "Fox ate Rabbit".
    pub description: String,
    /// What kind of change this was.
    pub category: EventCategory,
}

/// Kinds of recorded events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    /// Spawns, placements and offspring
    Birth,
    /// Starvation, culling and removals
    Death,
    /// Successful feeds
    Feeding,
    /// Plants becoming fully grown
    Growth,
    /// Energy spent by player actions
    Energy,
    /// Win-condition progress
    Goal,
}

/// Ring of the most recent events, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    entries: VecDeque<LoggedEvent>,
    capacity: usize,
}

impl EventLog {
    /// Keeps at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records an event, dropping the oldest one when full.
    pub fn log(&mut self, time: f32, description: String, category: EventCategory) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(LoggedEvent {
            time,
            description,
            category,
        });
    }

    /// Retained events, newest first.
    pub fn events(&self) -> &VecDeque<LoggedEvent> {
        &self.entries
    }

    /// Retained events in `category`.
    pub fn count(&self, category: EventCategory) -> usize {
        self.entries.iter().filter(|e| e.category == category).count()
    }
}
