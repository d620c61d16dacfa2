//! Animals: position, hunger, behavior and wander timer.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::behavior::Behavior;
use super::hunger::HungerModel;
use super::registry::EntityId;
use super::scheduler::Periodic;
use super::species::{Species, SpeciesId};

/// A live animal.
///
/// The target is a weak reference: an id looked up in the registry every
/// time it is used, because the target may be eaten or starve at any step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organism {
    /// Unique identifier.
    pub id: EntityId,
    /// Species of this animal.
    pub species: SpeciesId,
    /// Time alive in simulation seconds.
    pub age: f32,
    /// Position in 2D space.
    pub pos: Array1<f32>,
    /// Displacement per second during the last behavior update.
    pub velocity: Array1<f32>,
    /// Facing right (sprite flip), from the sign of the last horizontal move.
    pub facing_right: bool,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Predators closer than this trigger fleeing.
    pub min_dist_from_predator: f32,
    /// Hunger state.
    pub hunger: HungerModel,
    /// Current behavior mode.
    pub behavior: Behavior,
    /// Current hunting target, if any.
    pub target: Option<EntityId>,
    /// Point the animal walks to while wandering.
    pub wander_spot: Array1<f32>,
    /// Re-rolls the wander spot; phase and interval are random per animal.
    pub wander_timer: Periodic,
}

impl Organism {
    /// Creates an animal of `species` at `pos`, wandering toward its own position.
    pub fn new(id: EntityId, species: &Species, pos: Array1<f32>, wander_timer: Periodic) -> Self {
        Self {
            id,
            species: species.id,
            age: 0.0,
            velocity: Array1::zeros(2),
            wander_spot: pos.clone(),
            pos,
            facing_right: false,
            speed: species.animal.speed,
            min_dist_from_predator: species.animal.min_dist_from_predator,
            hunger: HungerModel::from_traits(&species.animal),
            behavior: Behavior::Wandering,
            target: None,
            wander_timer,
        }
    }

    /// Checks if the organism is alive.
    pub fn is_alive(&self) -> bool {
        !self.hunger.is_starved()
    }

    /// Increments the organism's age.
    pub fn age_by(&mut self, dt: f32) {
        self.age += dt;
    }

    /// Zeroes velocity.
    pub fn stop(&mut self) {
        self.velocity.fill(0.0);
    }

    /// Whether the organism moved during its last update.
    pub fn is_moving(&self) -> bool {
        self.velocity.iter().any(|v| *v != 0.0)
    }
}
