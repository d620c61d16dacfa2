//! Species identity and the food web.
//!
//! Species names are interned into [`SpeciesId`]s when a level is loaded and
//! the declared prey names are resolved into an explicit set of
//! `(predator, prey)` pairs. Resolution keeps the name-based matching rule of
//! the level format: a prey entry selects every species whose name contains
//! it, so `"nut"` selects both `"Hazelnut"` and `"Chestnut"`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{Result, SimError};
use super::level::{AnimalTraits, LevelConfig, NutTraits, PlantTraits};

/// Interned species identifier, stable for the lifetime of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub u16);

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "species#{}", self.0)
    }
}

/// What kind of entity a species produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeciesKind {
    /// Moving, hungry organisms.
    Animal,
    /// Stationary, growing organisms.
    Plant,
    /// Consumables dropped by plants.
    Nut,
}

/// Resolved species with its traits.
#[derive(Debug, Clone)]
pub struct Species {
    /// Interned id.
    pub id: SpeciesId,
    /// Name from the level file.
    pub name: String,
    /// Entity kind.
    pub kind: SpeciesKind,
    /// Base population for the food-web heuristic.
    pub base_population: i32,
    /// Energy cost of placing one individual by hand.
    pub placement_cost: u32,
    /// Animal traits.
    pub animal: AnimalTraits,
    /// Plant traits.
    pub plant: PlantTraits,
    /// Nut traits.
    pub nut: NutTraits,
    /// Nut species dropped by this plant.
    pub nut_species: Option<SpeciesId>,
}

/// Explicit predator/prey relation table.
#[derive(Debug, Clone, Default)]
pub struct FoodWeb {
    eats: BTreeSet<(SpeciesId, SpeciesId)>,
}

impl FoodWeb {
    /// Records that `predator` eats `prey`.
    pub fn add(&mut self, predator: SpeciesId, prey: SpeciesId) {
        self.eats.insert((predator, prey));
    }

    /// Whether `predator` eats `prey`.
    pub fn eats(&self, predator: SpeciesId, prey: SpeciesId) -> bool {
        self.eats.contains(&(predator, prey))
    }

    /// Everything `predator` eats, in id order.
    pub fn prey_of(&self, predator: SpeciesId) -> impl Iterator<Item = SpeciesId> + '_ {
        self.eats
            .range((predator, SpeciesId(0))..=(predator, SpeciesId(u16::MAX)))
            .map(|&(_, prey)| prey)
    }

    /// Every species that eats `prey`, in id order.
    pub fn predators_of(&self, prey: SpeciesId) -> impl Iterator<Item = SpeciesId> + '_ {
        self.eats
            .iter()
            .filter(move |&&(_, p)| p == prey)
            .map(|&(predator, _)| predator)
    }

    /// A species nothing eats.
    pub fn is_apex(&self, species: SpeciesId) -> bool {
        self.predators_of(species).next().is_none()
    }
}

/// All species of a level plus their food web.
#[derive(Debug, Clone)]
pub struct SpeciesTable {
    species: Vec<Species>,
    by_name: HashMap<String, SpeciesId>,
    web: FoodWeb,
}

impl SpeciesTable {
    /// Interns the level's species and resolves prey names into the food web.
    pub fn from_level(level: &LevelConfig) -> Result<Self> {
        if level.species.len() > usize::from(u16::MAX) {
            return Err(SimError::InvalidLevel("too many species".into()));
        }

        let by_name: HashMap<String, SpeciesId> = level
            .species
            .iter()
            .enumerate()
            .map(|(i, def)| (def.name.clone(), SpeciesId(i as u16)))
            .collect();

        let mut species = Vec::with_capacity(level.species.len());
        for (i, def) in level.species.iter().enumerate() {
            let nut_species = match &def.plant.nut {
                Some(nut) if def.kind == SpeciesKind::Plant => Some(
                    *by_name
                        .get(nut)
                        .ok_or_else(|| SimError::UnknownSpecies(nut.clone()))?,
                ),
                _ => None,
            };
            species.push(Species {
                id: SpeciesId(i as u16),
                name: def.name.clone(),
                kind: def.kind,
                base_population: def.base_population,
                placement_cost: def.placement_cost,
                animal: def.animal.clone(),
                plant: def.plant.clone(),
                nut: def.nut.clone(),
                nut_species,
            });
        }

        let mut web = FoodWeb::default();
        for (i, def) in level.species.iter().enumerate() {
            let predator = SpeciesId(i as u16);
            for entry in &def.prey {
                for candidate in &species {
                    if candidate.name.contains(entry.as_str()) {
                        web.add(predator, candidate.id);
                    }
                }
            }
        }

        Ok(Self {
            species,
            by_name,
            web,
        })
    }

    /// Looks up a species by exact name.
    pub fn id(&self, name: &str) -> Option<SpeciesId> {
        self.by_name.get(name).copied()
    }

    /// Looks up a species by exact name, failing with [`SimError::UnknownSpecies`].
    pub fn require(&self, name: &str) -> Result<SpeciesId> {
        self.id(name)
            .ok_or_else(|| SimError::UnknownSpecies(name.to_string()))
    }

    /// The species behind an id.
    ///
    /// Ids only come from this table, so indexing cannot fail.
    pub fn get(&self, id: SpeciesId) -> &Species {
        &self.species[usize::from(id.0)]
    }

    /// Name of a species.
    pub fn name(&self, id: SpeciesId) -> &str {
        &self.get(id).name
    }

    /// All species in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Number of species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// The resolved food web.
    pub fn web(&self) -> &FoodWeb {
        &self.web
    }

    /// Whether `species` eats anything of the given kind.
    pub fn eats_kind(&self, species: SpeciesId, kind: SpeciesKind) -> bool {
        self.web.prey_of(species).any(|p| self.get(p).kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::level::SpeciesDef;

    fn level() -> LevelConfig {
        LevelConfig {
            name: "web".into(),
            species: vec![
                SpeciesDef::new("Hazelnut", SpeciesKind::Nut),
                SpeciesDef::new("Chestnut", SpeciesKind::Nut),
                SpeciesDef::new("Squirrel", SpeciesKind::Animal).with_prey(&["nut"]),
                SpeciesDef::new("Hawk", SpeciesKind::Animal).with_prey(&["Squirrel"]),
            ],
        }
    }

    #[test]
    fn prey_names_resolve_by_substring() {
        let table = SpeciesTable::from_level(&level()).unwrap();
        let squirrel = table.require("Squirrel").unwrap();
        let hawk = table.require("Hawk").unwrap();

        let prey: Vec<_> = table.web().prey_of(squirrel).collect();
        assert_eq!(
            prey,
            vec![table.id("Hazelnut").unwrap(), table.id("Chestnut").unwrap()]
        );
        assert!(table.web().eats(hawk, squirrel));
        assert!(!table.web().eats(squirrel, hawk));
        assert!(table.eats_kind(squirrel, SpeciesKind::Nut));
        assert!(!table.eats_kind(hawk, SpeciesKind::Plant));
    }

    #[test]
    fn apex_has_no_predators() {
        let table = SpeciesTable::from_level(&level()).unwrap();
        let hawk = table.require("Hawk").unwrap();
        let squirrel = table.require("Squirrel").unwrap();

        assert!(table.web().is_apex(hawk));
        assert!(!table.web().is_apex(squirrel));
        assert_eq!(table.web().predators_of(squirrel).collect::<Vec<_>>(), vec![hawk]);
    }

    #[test]
    fn unknown_name_is_an_error() {
        let table = SpeciesTable::from_level(&level()).unwrap();
        assert!(matches!(
            table.require("Moose"),
            Err(SimError::UnknownSpecies(_))
        ));
    }
}
