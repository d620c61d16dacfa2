//! Trait for entities that have a position and can be updated.
//!
//! Animals, plants and nuts all implement it, which lets the spatial index and
//! the registry treat them uniformly.

use ndarray::Array1;

use super::nut::Nut;
use super::organism::Organism;
use super::plant::Plant;
use super::registry::EntityId;
use super::species::SpeciesId;

/// Trait for entities with a position that age over time.
pub trait Locatable {
    /// Registry id of the entity.
    fn id(&self) -> EntityId;

    /// Species of the entity.
    fn species(&self) -> SpeciesId;

    /// Returns a reference to the entity's position.
    fn pos(&self) -> &Array1<f32>;

    /// Returns a mutable reference to the entity's position.
    fn pos_mut(&mut self) -> &mut Array1<f32>;

    /// Advances the entity's own clock by `dt` seconds.
    fn update(&mut self, dt: f32);
}

impl Locatable for Organism {
    fn id(&self) -> EntityId {
        self.id
    }

    fn species(&self) -> SpeciesId {
        self.species
    }

    fn pos(&self) -> &Array1<f32> {
        &self.pos
    }

    fn pos_mut(&mut self) -> &mut Array1<f32> {
        &mut self.pos
    }

    fn update(&mut self, dt: f32) {
        self.age_by(dt);
    }
}

impl Locatable for Plant {
    fn id(&self) -> EntityId {
        self.id
    }

    fn species(&self) -> SpeciesId {
        self.species
    }

    fn pos(&self) -> &Array1<f32> {
        &self.pos
    }

    fn pos_mut(&mut self) -> &mut Array1<f32> {
        &mut self.pos
    }

    fn update(&mut self, dt: f32) {
        self.age += dt;
    }
}

impl Locatable for Nut {
    fn id(&self) -> EntityId {
        self.id
    }

    fn species(&self) -> SpeciesId {
        self.species
    }

    fn pos(&self) -> &Array1<f32> {
        &self.pos
    }

    fn pos_mut(&mut self) -> &mut Array1<f32> {
        &mut self.pos
    }

    fn update(&mut self, dt: f32) {
        self.age += dt;
    }
}
