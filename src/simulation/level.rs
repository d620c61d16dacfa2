//! Static level definitions.
//!
//! A level lists every species that can appear, how many individuals exist at
//! the start, the goal population the player is asked to reach, and the prey
//! names that make up the food web. Levels are plain JSON so they can be
//! authored outside the simulation.

use std::collections::HashSet;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::{Result, SimError};
use super::species::SpeciesKind;

/// Hunger and movement traits of an animal species.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimalTraits {
    /// Hunger every new individual starts with.
    pub initial_hunger: f32,
    /// Hunger lost per decay tick.
    pub hunger_decline_rate: f32,
    /// At or below this hunger the animal hunts.
    pub feed_threshold: f32,
    /// At or below this hunger the animal is starving.
    pub starving_threshold: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Predators closer than this make the animal flee.
    pub min_dist_from_predator: f32,
}

impl Default for AnimalTraits {
    fn default() -> Self {
        Self {
            initial_hunger: 10.0,
            hunger_decline_rate: 1.0,
            feed_threshold: 5.0,
            starving_threshold: 2.0,
            speed: 1.0,
            min_dist_from_predator: 2.0,
        }
    }
}

/// Growth traits of a plant species.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantTraits {
    /// Growth every new plant starts with.
    pub initial_growth: f32,
    /// Growth at which the plant is fully grown.
    pub max_growth: f32,
    /// Growth added on each natural growth check.
    pub growth_rate: f32,
    /// Nut species this plant drops, if any.
    pub nut: Option<String>,
}

impl Default for PlantTraits {
    fn default() -> Self {
        Self {
            initial_growth: 1.0,
            max_growth: 5.0,
            growth_rate: 0.1,
            nut: None,
        }
    }
}

/// Traits of a nut species.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NutTraits {
    /// Hunger restored when eaten.
    pub nutrition: f32,
}

impl Default for NutTraits {
    fn default() -> Self {
        Self { nutrition: 3.0 }
    }
}

/// One species as authored in a level file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesDef {
    /// Display name, also used for prey matching.
    pub name: String,
    /// Animal, plant or nut.
    pub kind: SpeciesKind,
    /// Names (or name fragments) of what this species eats.
    #[serde(default)]
    pub prey: Vec<String>,
    /// Individuals spawned when the level starts.
    #[serde(default)]
    pub initial_population: usize,
    /// Population the player must reach.
    #[serde(default)]
    pub goal: Option<usize>,
    /// Base population used by the food-web heuristic.
    #[serde(default = "default_base_population")]
    pub base_population: i32,
    /// Energy cost of placing one individual by hand.
    #[serde(default)]
    pub placement_cost: u32,
    /// Animal traits (ignored for other kinds).
    #[serde(default)]
    pub animal: AnimalTraits,
    /// Plant traits (ignored for other kinds).
    #[serde(default)]
    pub plant: PlantTraits,
    /// Nut traits (ignored for other kinds).
    #[serde(default)]
    pub nut: NutTraits,
}

fn default_base_population() -> i32 {
    1
}

impl SpeciesDef {
    /// Species definition with default traits.
    pub fn new(name: &str, kind: SpeciesKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            prey: Vec::new(),
            initial_population: 0,
            goal: None,
            base_population: default_base_population(),
            placement_cost: 0,
            animal: AnimalTraits::default(),
            plant: PlantTraits::default(),
            nut: NutTraits::default(),
        }
    }

    /// Sets the prey names.
    #[must_use]
    pub fn with_prey(mut self, prey: &[&str]) -> Self {
        self.prey = prey.iter().map(|p| (*p).to_string()).collect();
        self
    }

    /// Sets the starting population.
    #[must_use]
    pub fn with_initial(mut self, count: usize) -> Self {
        self.initial_population = count;
        self
    }

    /// Sets the goal population.
    #[must_use]
    pub fn with_goal(mut self, goal: usize) -> Self {
        self.goal = Some(goal);
        self
    }
}

/// A complete level: its name and all species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Level name shown in logs.
    pub name: String,
    /// Every species that may appear in the level.
    pub species: Vec<SpeciesDef>,
}

impl LevelConfig {
    /// Loads a level from a JSON file and validates it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let level: LevelConfig = serde_json::from_str(&json)?;
        level.validate()?;
        Ok(level)
    }

    /// Writes the level as pretty JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks that the level is internally consistent.
    ///
    /// Prey names that match no species are only warned about: such entries
    /// simply never produce a target.
    pub fn validate(&self) -> Result<()> {
        if self.species.is_empty() {
            return Err(SimError::InvalidLevel("level has no species".into()));
        }

        let mut names = HashSet::new();
        for def in &self.species {
            if def.name.trim().is_empty() {
                return Err(SimError::InvalidLevel("species with empty name".into()));
            }
            if !names.insert(def.name.as_str()) {
                return Err(SimError::InvalidLevel(format!(
                    "species `{}` defined twice",
                    def.name
                )));
            }
        }

        for def in &self.species {
            match def.kind {
                SpeciesKind::Plant => {
                    if def.plant.max_growth <= 0.0 {
                        return Err(SimError::InvalidLevel(format!(
                            "plant `{}` needs a positive max_growth",
                            def.name
                        )));
                    }
                    if let Some(nut) = &def.plant.nut {
                        let is_nut = self
                            .species
                            .iter()
                            .any(|s| &s.name == nut && s.kind == SpeciesKind::Nut);
                        if !is_nut {
                            return Err(SimError::InvalidLevel(format!(
                                "plant `{}` drops unknown nut `{nut}`",
                                def.name
                            )));
                        }
                    }
                }
                SpeciesKind::Animal => {
                    let traits = &def.animal;
                    if !(traits.speed.is_finite() && traits.speed >= 0.0) {
                        return Err(SimError::InvalidLevel(format!(
                            "animal `{}` needs a finite, non-negative speed",
                            def.name
                        )));
                    }
                    if !(traits.hunger_decline_rate.is_finite() && traits.hunger_decline_rate > 0.0) {
                        return Err(SimError::InvalidLevel(format!(
                            "animal `{}` needs a positive hunger_decline_rate",
                            def.name
                        )));
                    }
                    if !traits.initial_hunger.is_finite() {
                        return Err(SimError::InvalidLevel(format!(
                            "animal `{}` has a non-finite initial_hunger",
                            def.name
                        )));
                    }
                }
                SpeciesKind::Nut => {}
            }

            for prey in &def.prey {
                if !self.species.iter().any(|s| s.name.contains(prey.as_str())) {
                    warn!("{}: prey `{prey}` matches no species", def.name);
                }
            }
        }

        Ok(())
    }

    /// The forest level: five plants, two nuts, seven animals.
    pub fn forest() -> Self {
        let plant = |name: &str, initial: usize, goal: usize, nut: Option<&str>| {
            let mut def = SpeciesDef::new(name, SpeciesKind::Plant)
                .with_initial(initial)
                .with_goal(goal);
            def.plant.nut = nut.map(str::to_string);
            def.placement_cost = 10;
            def
        };
        let animal = |name: &str,
                      prey: &[&str],
                      initial: usize,
                      goal: usize,
                      speed: f32,
                      decline: f32| {
            let mut def = SpeciesDef::new(name, SpeciesKind::Animal)
                .with_prey(prey)
                .with_initial(initial)
                .with_goal(goal);
            def.animal.speed = speed;
            def.animal.hunger_decline_rate = decline;
            def.placement_cost = 20;
            def
        };

        let mut hawk = animal("Hawk", &["Squirrel", "Cottontail", "Robin"], 1, 1, 2.5, 1.0);
        hawk.animal.min_dist_from_predator = 0.0;
        let mut bear = animal(
            "BlackBear",
            &["Deer", "Acorn", "Beautyberry", "Hazelnut"],
            1,
            1,
            1.2,
            1.5,
        );
        bear.animal.min_dist_from_predator = 0.0;

        LevelConfig {
            name: "Forest".to_string(),
            species: vec![
                plant("Oak", 3, 5, Some("Acorn")),
                plant("Hazel", 3, 5, Some("Hazelnut")),
                plant("PoisonIvy", 6, 10, None),
                plant("Dandelion", 6, 10, None),
                plant("Beautyberry", 6, 10, None),
                SpeciesDef::new("Acorn", SpeciesKind::Nut),
                SpeciesDef::new("Hazelnut", SpeciesKind::Nut),
                hawk,
                bear,
                animal("Graywolf", &["Deer", "Cottontail"], 3, 5, 2.0, 1.2),
                animal("Squirrel", &["Acorn", "Hazelnut", "Beautyberry"], 10, 22, 1.5, 1.0),
                animal("Cottontail", &["Dandelion", "Beautyberry"], 10, 24, 1.6, 1.0),
                animal("Robin", &["Beautyberry", "PoisonIvy"], 12, 28, 2.0, 0.8),
                animal("Deer", &["Dandelion", "PoisonIvy", "Acorn"], 8, 20, 1.4, 1.0),
            ],
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::forest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forest_level_is_valid() {
        let level = LevelConfig::forest();
        assert!(level.validate().is_ok());
        assert_eq!(level.species.len(), 14);
    }

    #[test]
    fn duplicate_species_rejected() {
        let level = LevelConfig {
            name: "dup".into(),
            species: vec![
                SpeciesDef::new("Deer", SpeciesKind::Animal),
                SpeciesDef::new("Deer", SpeciesKind::Animal),
            ],
        };
        assert!(matches!(level.validate(), Err(SimError::InvalidLevel(_))));
    }

    #[test]
    fn hunger_must_decline() {
        for rate in [0.0, -1.0, f32::NAN] {
            let mut deer = SpeciesDef::new("Deer", SpeciesKind::Animal);
            deer.animal.hunger_decline_rate = rate;
            let level = LevelConfig {
                name: "stale".into(),
                species: vec![deer],
            };
            assert!(matches!(level.validate(), Err(SimError::InvalidLevel(_))));
        }
    }

    #[test]
    fn plant_with_unknown_nut_rejected() {
        let mut oak = SpeciesDef::new("Oak", SpeciesKind::Plant);
        oak.plant.nut = Some("Acorn".into());
        let level = LevelConfig {
            name: "nutless".into(),
            species: vec![oak],
        };
        assert!(level.validate().is_err());
    }

    #[test]
    fn json_defaults_fill_missing_traits() {
        let json = r#"{
            "name": "tiny",
            "species": [
                { "name": "Clover", "kind": "Plant", "initial_population": 2 },
                { "name": "Rabbit", "kind": "Animal", "prey": ["Clover"], "goal": 4 }
            ]
        }"#;
        let level: LevelConfig = serde_json::from_str(json).unwrap();
        assert!(level.validate().is_ok());
        assert_eq!(level.species[0].plant.max_growth, 5.0);
        assert_eq!(level.species[1].goal, Some(4));
        assert_eq!(level.species[1].animal.initial_hunger, 10.0);
        assert_eq!(level.species[1].base_population, 1);
    }
}
