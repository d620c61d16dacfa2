//! The organism registry: single owner of every live entity.
//!
//! Animals, plants and nuts are stored in id-ordered maps so iteration is
//! deterministic (lowest id first). A per-species index answers population
//! queries without scanning. Everything else in the simulation refers to
//! entities by [`EntityId`] and looks them up here.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::{Result, SimError};
use super::locatable::Locatable;
use super::nut::Nut;
use super::organism::Organism;
use super::plant::Plant;
use super::species::{SpeciesId, SpeciesKind};

/// Unique handle of a live or dead entity. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Maximum number of live entities per kind.
#[derive(Debug, Clone, Copy)]
pub struct Capacity {
    /// Maximum live animals.
    pub animals: usize,
    /// Maximum live plants.
    pub plants: usize,
    /// Maximum live nuts.
    pub nuts: usize,
}

/// Borrowed view of any entity.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    /// An animal.
    Animal(&'a Organism),
    /// A plant.
    Plant(&'a Plant),
    /// A nut.
    Nut(&'a Nut),
}

impl EntityRef<'_> {
    /// Kind of the entity.
    pub fn kind(&self) -> SpeciesKind {
        match self {
            EntityRef::Animal(_) => SpeciesKind::Animal,
            EntityRef::Plant(_) => SpeciesKind::Plant,
            EntityRef::Nut(_) => SpeciesKind::Nut,
        }
    }

    fn locatable(&self) -> &dyn Locatable {
        match self {
            EntityRef::Animal(a) => *a,
            EntityRef::Plant(p) => *p,
            EntityRef::Nut(n) => *n,
        }
    }

    /// Species of the entity.
    pub fn species(&self) -> SpeciesId {
        self.locatable().species()
    }

    /// Position of the entity.
    pub fn pos(&self) -> &Array1<f32> {
        self.locatable().pos()
    }
}

/// An entity removed from the registry.
#[derive(Debug, Clone)]
pub enum Entity {
    /// An animal.
    Animal(Organism),
    /// A plant.
    Plant(Plant),
    /// A nut.
    Nut(Nut),
}

impl Entity {
    /// Species of the entity.
    pub fn species(&self) -> SpeciesId {
        match self {
            Entity::Animal(a) => a.species,
            Entity::Plant(p) => p.species,
            Entity::Nut(n) => n.species,
        }
    }
}

/// Species-keyed collection of all live entities.
#[derive(Debug, Clone)]
pub struct OrganismRegistry {
    animals: BTreeMap<EntityId, Organism>,
    plants: BTreeMap<EntityId, Plant>,
    nuts: BTreeMap<EntityId, Nut>,
    by_species: HashMap<SpeciesId, BTreeSet<EntityId>>,
    next_id: u64,
    capacity: Capacity,
}

impl OrganismRegistry {
    /// Creates an empty registry with the given caps.
    pub fn new(capacity: Capacity) -> Self {
        Self {
            animals: BTreeMap::new(),
            plants: BTreeMap::new(),
            nuts: BTreeMap::new(),
            by_species: HashMap::new(),
            next_id: 1,
            capacity,
        }
    }

    /// Fails with [`SimError::CapacityExceeded`] if `kind` is at its cap.
    pub fn ensure_room(&self, kind: SpeciesKind) -> Result<()> {
        let (len, limit, name) = match kind {
            SpeciesKind::Animal => (self.animals.len(), self.capacity.animals, "animal"),
            SpeciesKind::Plant => (self.plants.len(), self.capacity.plants, "plant"),
            SpeciesKind::Nut => (self.nuts.len(), self.capacity.nuts, "nut"),
        };
        if len >= limit {
            return Err(SimError::CapacityExceeded { kind: name, limit });
        }
        Ok(())
    }

    /// Whether another entity of `kind` fits.
    pub fn has_room(&self, kind: SpeciesKind) -> bool {
        self.ensure_room(kind).is_ok()
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn index(&mut self, species: SpeciesId, id: EntityId) {
        self.by_species.entry(species).or_default().insert(id);
    }

    /// Inserts an animal built from a freshly allocated id.
    pub fn spawn_animal(&mut self, make: impl FnOnce(EntityId) -> Organism) -> Result<EntityId> {
        self.ensure_room(SpeciesKind::Animal)?;
        let id = self.allocate();
        let organism = make(id);
        self.index(organism.species, id);
        self.animals.insert(id, organism);
        Ok(id)
    }

    /// Inserts a plant built from a freshly allocated id.
    pub fn spawn_plant(&mut self, make: impl FnOnce(EntityId) -> Plant) -> Result<EntityId> {
        self.ensure_room(SpeciesKind::Plant)?;
        let id = self.allocate();
        let plant = make(id);
        self.index(plant.species, id);
        self.plants.insert(id, plant);
        Ok(id)
    }

    /// Inserts a nut built from a freshly allocated id.
    pub fn spawn_nut(&mut self, make: impl FnOnce(EntityId) -> Nut) -> Result<EntityId> {
        self.ensure_room(SpeciesKind::Nut)?;
        let id = self.allocate();
        let nut = make(id);
        self.index(nut.species, id);
        self.nuts.insert(id, nut);
        Ok(id)
    }

    /// Removes an entity. Returns `None` if it was already gone.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = if let Some(a) = self.animals.remove(&id) {
            Entity::Animal(a)
        } else if let Some(p) = self.plants.remove(&id) {
            Entity::Plant(p)
        } else if let Some(n) = self.nuts.remove(&id) {
            Entity::Nut(n)
        } else {
            return None;
        };

        if let Some(members) = self.by_species.get_mut(&entity.species()) {
            members.remove(&id);
        }
        Some(entity)
    }

    /// Whether the id refers to a live entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.animals.contains_key(&id) || self.plants.contains_key(&id) || self.nuts.contains_key(&id)
    }

    /// Looks up any entity.
    pub fn get(&self, id: EntityId) -> Option<EntityRef<'_>> {
        self.animals
            .get(&id)
            .map(EntityRef::Animal)
            .or_else(|| self.plants.get(&id).map(EntityRef::Plant))
            .or_else(|| self.nuts.get(&id).map(EntityRef::Nut))
    }

    /// Looks up any entity, failing with [`SimError::InvalidReference`].
    pub fn require(&self, id: EntityId) -> Result<EntityRef<'_>> {
        self.get(id).ok_or(SimError::InvalidReference(id))
    }

    /// Looks up an animal.
    pub fn animal(&self, id: EntityId) -> Option<&Organism> {
        self.animals.get(&id)
    }

    /// Looks up an animal mutably.
    pub fn animal_mut(&mut self, id: EntityId) -> Option<&mut Organism> {
        self.animals.get_mut(&id)
    }

    /// Looks up a plant.
    pub fn plant(&self, id: EntityId) -> Option<&Plant> {
        self.plants.get(&id)
    }

    /// Looks up a plant mutably.
    pub fn plant_mut(&mut self, id: EntityId) -> Option<&mut Plant> {
        self.plants.get_mut(&id)
    }

    /// Looks up a nut.
    pub fn nut(&self, id: EntityId) -> Option<&Nut> {
        self.nuts.get(&id)
    }

    /// All animals in id order.
    pub fn animals(&self) -> &BTreeMap<EntityId, Organism> {
        &self.animals
    }

    /// All animals in id order, mutably.
    pub fn animals_mut(&mut self) -> &mut BTreeMap<EntityId, Organism> {
        &mut self.animals
    }

    /// All plants in id order.
    pub fn plants(&self) -> &BTreeMap<EntityId, Plant> {
        &self.plants
    }

    /// All plants in id order, mutably.
    pub fn plants_mut(&mut self) -> &mut BTreeMap<EntityId, Plant> {
        &mut self.plants
    }

    /// All nuts in id order.
    pub fn nuts(&self) -> &BTreeMap<EntityId, Nut> {
        &self.nuts
    }

    /// All nuts in id order, mutably.
    pub fn nuts_mut(&mut self) -> &mut BTreeMap<EntityId, Nut> {
        &mut self.nuts
    }

    /// Live members of a species, in id order.
    pub fn members(&self, species: SpeciesId) -> impl Iterator<Item = EntityId> + '_ {
        self.by_species
            .get(&species)
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }

    /// Live count of a species.
    pub fn count(&self, species: SpeciesId) -> usize {
        self.by_species.get(&species).map_or(0, BTreeSet::len)
    }

    /// Live count of every species that has ever had a member.
    pub fn counts(&self) -> BTreeMap<SpeciesId, usize> {
        self.by_species
            .iter()
            .map(|(species, ids)| (*species, ids.len()))
            .collect()
    }

    /// Total live entities.
    pub fn len(&self) -> usize {
        self.animals.len() + self.plants.len() + self.nuts.len()
    }

    /// Whether nothing is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::geometric_utils::pos2;
    use crate::simulation::level::{LevelConfig, SpeciesDef};
    use crate::simulation::scheduler::Periodic;
    use crate::simulation::species::SpeciesTable;

    fn table() -> SpeciesTable {
        let level = LevelConfig {
            name: "registry".into(),
            species: vec![
                SpeciesDef::new("Clover", SpeciesKind::Plant),
                SpeciesDef::new("Rabbit", SpeciesKind::Animal).with_prey(&["Clover"]),
            ],
        };
        SpeciesTable::from_level(&level).unwrap()
    }

    fn capacity(animals: usize) -> Capacity {
        Capacity {
            animals,
            plants: 10,
            nuts: 10,
        }
    }

    #[test]
    fn spawn_and_remove_keep_index_in_sync() {
        let table = table();
        let rabbit = table.get(table.id("Rabbit").unwrap());
        let clover = table.get(table.id("Clover").unwrap());
        let mut registry = OrganismRegistry::new(capacity(10));

        let a = registry
            .spawn_animal(|id| Organism::new(id, rabbit, pos2(0.0, 0.0), Periodic::new(1.0)))
            .unwrap();
        let p = registry
            .spawn_plant(|id| Plant::new(id, clover, pos2(1.0, 1.0)))
            .unwrap();

        assert_ne!(a, p);
        assert_eq!(registry.count(rabbit.id), 1);
        assert_eq!(registry.count(clover.id), 1);
        assert_eq!(registry.get(p).unwrap().kind(), SpeciesKind::Plant);

        assert!(matches!(registry.remove(a), Some(Entity::Animal(_))));
        assert!(registry.remove(a).is_none());
        assert_eq!(registry.count(rabbit.id), 0);
        assert!(!registry.contains(a));
        assert!(matches!(registry.require(a), Err(SimError::InvalidReference(_))));
    }

    #[test]
    fn capacity_is_enforced() {
        let table = table();
        let rabbit = table.get(table.id("Rabbit").unwrap());
        let mut registry = OrganismRegistry::new(capacity(2));

        for _ in 0..2 {
            registry
                .spawn_animal(|id| Organism::new(id, rabbit, pos2(0.0, 0.0), Periodic::new(1.0)))
                .unwrap();
        }
        let err = registry
            .spawn_animal(|id| Organism::new(id, rabbit, pos2(0.0, 0.0), Periodic::new(1.0)))
            .unwrap_err();
        assert!(matches!(err, SimError::CapacityExceeded { limit: 2, .. }));
        assert_eq!(registry.count(rabbit.id), 2);
    }

    #[test]
    fn ids_are_never_reused() {
        let table = table();
        let clover = table.get(table.id("Clover").unwrap());
        let mut registry = OrganismRegistry::new(capacity(1));

        let first = registry
            .spawn_plant(|id| Plant::new(id, clover, pos2(0.0, 0.0)))
            .unwrap();
        registry.remove(first);
        let second = registry
            .spawn_plant(|id| Plant::new(id, clover, pos2(0.0, 0.0)))
            .unwrap();
        assert!(second > first);
    }
}
