//! Nuts dropped by fully grown plants.
//!
//! A nut has a fixed nutrition value and disappears when eaten.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::registry::EntityId;
use super::species::{Species, SpeciesId};

/// A nut lying on the ground.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nut {
    /// Unique identifier.
    pub id: EntityId,
    /// Species of this nut.
    pub species: SpeciesId,
    /// Position in 2D space.
    pub pos: Array1<f32>,
    /// Hunger restored when eaten.
    pub nutrition: f32,
    /// Age of the nut in seconds.
    pub age: f32,
}

impl Nut {
    /// Creates a nut of `species` at `pos`.
    pub fn new(id: EntityId, species: &Species, pos: Array1<f32>) -> Self {
        Self {
            id,
            species: species.id,
            pos,
            nutrition: species.nut.nutrition,
            age: 0.0,
        }
    }
}
