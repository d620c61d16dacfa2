//! Validation and application of consumption.
//!
//! A feed either fully applies or leaves the world untouched. Animals and nuts
//! are removed exactly once; plants are grazed and stay rooted.

use log::debug;

use super::behavior::{self, Behavior};
use super::error::{Result, SimError};
use super::params::Params;
use super::registry::{EntityId, EntityRef, OrganismRegistry};
use super::species::{SpeciesId, SpeciesKind, SpeciesTable};

/// What a successful feed did.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOutcome {
    /// The animal that ate.
    pub consumer: EntityId,
    /// What was eaten.
    pub consumed: EntityId,
    /// Species of what was eaten.
    pub consumed_species: SpeciesId,
    /// Kind of what was eaten.
    pub consumed_kind: SpeciesKind,
    /// Whether `consumed` left the registry.
    pub removed: bool,
    /// Consumer hunger after the feed.
    pub hunger: f32,
    /// Consumer behavior after the feed.
    pub behavior: Behavior,
}

/// Checks that `consumer` may eat `consumed` without touching anything.
pub fn validate(
    registry: &OrganismRegistry,
    species: &SpeciesTable,
    consumer: EntityId,
    consumed: EntityId,
) -> Result<(SpeciesId, SpeciesKind)> {
    let eater = match registry.require(consumer)? {
        EntityRef::Animal(org) => org,
        _ => {
            return Err(SimError::WrongKind {
                id: consumer,
                expected: "animal",
            });
        }
    };
    let food = registry.require(consumed)?;

    if consumer == consumed || !species.web().eats(eater.species, food.species()) {
        return Err(SimError::InvalidFeed {
            consumer: species.name(eater.species).to_string(),
            consumed: species.name(food.species()).to_string(),
        });
    }
    Ok((food.species(), food.kind()))
}

/// Feeds `consumer` with `consumed`, adding exactly `amount` hunger.
///
/// # Errors
///
/// [`SimError::InvalidReference`] if either id is not live,
/// [`SimError::WrongKind`] if the consumer is not an animal and
/// [`SimError::InvalidFeed`] if the food web forbids the meal and
/// [`SimError::InvalidAmount`] unless `amount` is positive and finite. On
/// error nothing has changed.
pub fn resolve(
    registry: &mut OrganismRegistry,
    species: &SpeciesTable,
    params: &Params,
    consumer: EntityId,
    consumed: EntityId,
    amount: f32,
) -> Result<FeedOutcome> {
    let (consumed_species, consumed_kind) = validate(registry, species, consumer, consumed)?;
    if !(amount.is_finite() && amount > 0.0) {
        return Err(SimError::InvalidAmount(amount));
    }

    let removed = match consumed_kind {
        SpeciesKind::Plant => {
            if let Some(plant) = registry.plant_mut(consumed) {
                plant.on_consumed(params.graze_amount, params.growth_floor);
            }
            false
        }
        SpeciesKind::Animal | SpeciesKind::Nut => registry.remove(consumed).is_some(),
    };

    let org = registry
        .animal_mut(consumer)
        .ok_or(SimError::InvalidReference(consumer))?;
    org.hunger.feed(amount);
    let consumer_species = org.species;
    if removed && org.target == Some(consumed) {
        org.target = None;
    }
    let hunger = org.hunger.hunger;
    let behavior = behavior::rederive(registry, species, consumer).unwrap_or(Behavior::Wandering);

    debug!(
        "{} {consumer} ate {} {consumed} (+{amount}, hunger {hunger:.1})",
        species.name(consumer_species),
        species.name(consumed_species),
    );

    Ok(FeedOutcome {
        consumer,
        consumed,
        consumed_species,
        consumed_kind,
        removed,
        hunger,
        behavior,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::geometric_utils::pos2;
    use crate::simulation::level::{LevelConfig, SpeciesDef};
    use crate::simulation::nut::Nut;
    use crate::simulation::organism::Organism;
    use crate::simulation::plant::Plant;
    use crate::simulation::registry::Capacity;
    use crate::simulation::scheduler::Periodic;

    struct World {
        table: SpeciesTable,
        reg: OrganismRegistry,
        params: Params,
    }

    fn world() -> World {
        let level = LevelConfig {
            name: "feed".into(),
            species: vec![
                SpeciesDef::new("Acorn", SpeciesKind::Nut),
                SpeciesDef::new("Clover", SpeciesKind::Plant),
                SpeciesDef::new("Rabbit", SpeciesKind::Animal).with_prey(&["Clover", "Acorn"]),
                SpeciesDef::new("Fox", SpeciesKind::Animal).with_prey(&["Rabbit"]),
            ],
        };
        World {
            table: SpeciesTable::from_level(&level).unwrap(),
            reg: OrganismRegistry::new(Capacity {
                animals: 10,
                plants: 10,
                nuts: 10,
            }),
            params: Params::default(),
        }
    }

    impl World {
        fn animal(&mut self, name: &str, hunger: f32) -> EntityId {
            let species = self.table.get(self.table.id(name).unwrap());
            self.reg
                .spawn_animal(|id| {
                    let mut org = Organism::new(id, species, pos2(0.0, 0.0), Periodic::new(5.0));
                    org.hunger.hunger = hunger;
                    org
                })
                .unwrap()
        }

        fn hunger(&self, id: EntityId) -> f32 {
            self.reg.animal(id).unwrap().hunger.hunger
        }
    }

    #[test]
    fn valid_feed_adds_amount_and_removes_once() {
        let mut w = world();
        let fox = w.animal("Fox", 3.0);
        let rabbit = w.animal("Rabbit", 8.0);

        let outcome = resolve(&mut w.reg, &w.table, &w.params, fox, rabbit, 5.0).unwrap();
        assert!(outcome.removed);
        assert!((outcome.hunger - 8.0).abs() < 1e-6);
        assert_eq!(outcome.behavior, Behavior::Wandering);
        assert!(!w.reg.contains(rabbit));

        let again = resolve(&mut w.reg, &w.table, &w.params, fox, rabbit, 5.0);
        assert!(matches!(again, Err(SimError::InvalidReference(id)) if id == rabbit));
        assert!((w.hunger(fox) - 8.0).abs() < 1e-6);
    }

    #[test]
    fn invalid_feed_changes_nothing() {
        let mut w = world();
        let fox = w.animal("Fox", 3.0);
        let rabbit = w.animal("Rabbit", 4.0);

        let err = resolve(&mut w.reg, &w.table, &w.params, rabbit, fox, 5.0).unwrap_err();
        assert!(matches!(err, SimError::InvalidFeed { .. }));
        assert!(w.reg.contains(fox));
        assert!((w.hunger(rabbit) - 4.0).abs() < 1e-6);

        let err = resolve(&mut w.reg, &w.table, &w.params, fox, fox, 5.0).unwrap_err();
        assert!(matches!(err, SimError::InvalidFeed { .. }));
        assert!((w.hunger(fox) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let mut w = world();
        let fox = w.animal("Fox", 10.0);
        let rabbit = w.animal("Rabbit", 8.0);

        for amount in [-100.0, 0.0, f32::NAN, f32::INFINITY] {
            let err = resolve(&mut w.reg, &w.table, &w.params, fox, rabbit, amount).unwrap_err();
            assert!(matches!(err, SimError::InvalidAmount(_)));
        }
        assert!(w.reg.contains(rabbit));
        assert!((w.hunger(fox) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn plants_are_grazed_not_removed() {
        let mut w = world();
        let rabbit = w.animal("Rabbit", 1.0);
        let clover = w.table.get(w.table.id("Clover").unwrap()).clone();
        let plant = w
            .reg
            .spawn_plant(|id| {
                let mut p = Plant::new(id, &clover, pos2(0.0, 0.0));
                p.growth = p.max_growth;
                p.fully_grown = true;
                p
            })
            .unwrap();

        let outcome = resolve(&mut w.reg, &w.table, &w.params, rabbit, plant, 5.0).unwrap();
        assert!(!outcome.removed);
        let p = w.reg.plant(plant).unwrap();
        assert!(!p.fully_grown);
        assert!((p.growth - (p.max_growth - w.params.graze_amount)).abs() < 1e-6);
    }

    #[test]
    fn nuts_are_removed() {
        let mut w = world();
        let rabbit = w.animal("Rabbit", 1.0);
        let acorn = w.table.get(w.table.id("Acorn").unwrap()).clone();
        let nut = w.reg.spawn_nut(|id| Nut::new(id, &acorn, pos2(0.0, 0.0))).unwrap();

        let outcome = resolve(&mut w.reg, &w.table, &w.params, rabbit, nut, 3.0).unwrap();
        assert!(outcome.removed);
        assert_eq!(outcome.consumed_kind, SpeciesKind::Nut);
        assert!(w.reg.nut(nut).is_none());
    }

    #[test]
    fn fed_prey_still_flees() {
        let mut w = world();
        let _fox = w.animal("Fox", 10.0);
        let rabbit = w.animal("Rabbit", 1.0);
        let acorn = w.table.get(w.table.id("Acorn").unwrap()).clone();
        let nut = w.reg.spawn_nut(|id| Nut::new(id, &acorn, pos2(0.0, 0.0))).unwrap();

        let outcome = resolve(&mut w.reg, &w.table, &w.params, rabbit, nut, 3.0).unwrap();
        assert_eq!(outcome.behavior, Behavior::FleeingPredator);
    }
}
