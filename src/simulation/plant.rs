//! Plants and their growth model.
//!
//! Growth is a scalar in `[floor, max_growth]`. A plant is fully grown exactly
//! when growth reaches the maximum, and only fully grown plants reproduce.
//! The model never touches the energy pool; callers pay before asking.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::{Result, SimError};
use super::registry::EntityId;
use super::species::{Species, SpeciesId};

/// What a fully grown plant can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offspring {
    /// A nut of the plant's nut species.
    Nut,
    /// A seedling of the plant's own species.
    Plant,
}

/// A live plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    /// Unique identifier.
    pub id: EntityId,
    /// Species of this plant.
    pub species: SpeciesId,
    /// Nut species dropped when reproducing, if any.
    pub nut_species: Option<SpeciesId>,
    /// Position in 2D space.
    pub pos: Array1<f32>,
    /// Time alive in simulation seconds.
    pub age: f32,
    /// Current growth.
    pub growth: f32,
    /// Growth at which the plant is fully grown.
    pub max_growth: f32,
    /// Growth added per natural growth check.
    pub growth_rate: f32,
    /// `true` iff `growth >= max_growth`.
    pub fully_grown: bool,
}

impl Plant {
    /// Creates a plant of `species` at `pos` with the species' initial growth.
    pub fn new(id: EntityId, species: &Species, pos: Array1<f32>) -> Self {
        let traits = &species.plant;
        let growth = traits.initial_growth.min(traits.max_growth);
        Self {
            id,
            species: species.id,
            nut_species: species.nut_species,
            pos,
            age: 0.0,
            growth,
            max_growth: traits.max_growth,
            growth_rate: traits.growth_rate,
            fully_grown: growth >= traits.max_growth,
        }
    }

    /// Adds `amount` growth, clamped to the maximum.
    ///
    /// # Returns
    ///
    /// `true` if this boost made the plant fully grown.
    pub fn boost_growth(&mut self, amount: f32) -> bool {
        let was_grown = self.fully_grown;
        self.growth = (self.growth + amount.max(0.0)).min(self.max_growth);
        self.fully_grown = self.growth >= self.max_growth;
        self.fully_grown && !was_grown
    }

    /// One natural growth check.
    pub fn grow(&mut self) -> bool {
        self.boost_growth(self.growth_rate)
    }

    /// Grazing: removes `amount` growth, never going below `floor`.
    pub fn on_consumed(&mut self, amount: f32, floor: f32) {
        self.growth = (self.growth - amount).max(floor.min(self.max_growth));
        self.fully_grown = self.growth >= self.max_growth;
    }

    /// Growth as a fraction of the maximum, for scaling sprites.
    pub fn growth_ratio(&self) -> f32 {
        self.growth / self.max_growth
    }

    /// Species to spawn for the requested offspring.
    ///
    /// Fails unless the plant is fully grown, or when a nut is requested from
    /// a plant that drops none.
    pub fn offspring_species(&self, kind: Offspring) -> Result<SpeciesId> {
        if !self.fully_grown {
            return Err(SimError::NotFullyGrown(self.id));
        }
        match kind {
            Offspring::Plant => Ok(self.species),
            Offspring::Nut => self.nut_species.ok_or(SimError::WrongKind {
                id: self.id,
                expected: "nut-bearing plant",
            }),
        }
    }
}
