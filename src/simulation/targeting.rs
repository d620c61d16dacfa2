//! Nearest-prey target selection.
//!
//! Candidates are every indexed animal, plus plants when the hunter eats some
//! plant species, plus nuts when it eats some nut species. A candidate is
//! valid when the food web says the hunter's species eats it. The nearest
//! valid candidate wins, lowest id on ties. With no valid candidate the
//! hunter targets itself, which means "stand still".

use ndarray::Array1;

use super::registry::EntityId;
use super::spatial::{Sighting, SpatialIndex};
use super::species::{SpeciesId, SpeciesKind, SpeciesTable};

/// Picks hunting targets from a spatial snapshot.
pub struct TargetSelector<'a> {
    index: &'a SpatialIndex,
    species: &'a SpeciesTable,
}

impl<'a> TargetSelector<'a> {
    /// Creates a selector over a snapshot.
    pub fn new(index: &'a SpatialIndex, species: &'a SpeciesTable) -> Self {
        Self { index, species }
    }

    /// Whether `hunter` may eat `candidate`.
    pub fn is_valid(&self, hunter: EntityId, hunter_species: SpeciesId, candidate: &Sighting) -> bool {
        candidate.id != hunter && self.species.web().eats(hunter_species, candidate.species)
    }

    /// Nearest valid prey with its distance.
    pub fn nearest_prey(
        &self,
        hunter: EntityId,
        hunter_species: SpeciesId,
        pos: &Array1<f32>,
    ) -> Option<(f32, &'a Sighting)> {
        let mut kinds = vec![SpeciesKind::Animal];
        if self.species.eats_kind(hunter_species, SpeciesKind::Plant) {
            kinds.push(SpeciesKind::Plant);
        }
        if self.species.eats_kind(hunter_species, SpeciesKind::Nut) {
            kinds.push(SpeciesKind::Nut);
        }

        let index = self.index;
        kinds
            .into_iter()
            .filter_map(|kind| {
                index.nearest_matching(kind, pos, |s| self.is_valid(hunter, hunter_species, s))
            })
            .min_by(|(da, a), (db, b)| da.total_cmp(db).then(a.id.cmp(&b.id)))
    }

    /// Target id for `hunter`: nearest valid prey, or `hunter` itself if none.
    pub fn select_target(&self, hunter: EntityId, hunter_species: SpeciesId, pos: &Array1<f32>) -> EntityId {
        self.nearest_prey(hunter, hunter_species, pos)
            .map_or(hunter, |(_, s)| s.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::geometric_utils::pos2;
    use crate::simulation::level::{LevelConfig, SpeciesDef};
    use crate::simulation::nut::Nut;
    use crate::simulation::organism::Organism;
    use crate::simulation::plant::Plant;
    use crate::simulation::registry::{Capacity, OrganismRegistry};
    use crate::simulation::scheduler::Periodic;

    fn setup() -> (SpeciesTable, OrganismRegistry) {
        let level = LevelConfig {
            name: "hunt".into(),
            species: vec![
                SpeciesDef::new("Acorn", SpeciesKind::Nut),
                SpeciesDef::new("Clover", SpeciesKind::Plant),
                SpeciesDef::new("Squirrel", SpeciesKind::Animal).with_prey(&["Acorn"]),
                SpeciesDef::new("Rabbit", SpeciesKind::Animal).with_prey(&["Clover"]),
                SpeciesDef::new("Fox", SpeciesKind::Animal).with_prey(&["Squirrel", "Rabbit"]),
            ],
        };
        let table = SpeciesTable::from_level(&level).unwrap();
        let registry = OrganismRegistry::new(Capacity {
            animals: 100,
            plants: 100,
            nuts: 100,
        });
        (table, registry)
    }

    fn animal(reg: &mut OrganismRegistry, table: &SpeciesTable, name: &str, x: f32, y: f32) -> EntityId {
        let species = table.get(table.id(name).unwrap());
        reg.spawn_animal(|id| Organism::new(id, species, pos2(x, y), Periodic::new(5.0)))
            .unwrap()
    }

    #[test]
    fn picks_nearest_valid_prey() {
        let (table, mut reg) = setup();
        let fox = animal(&mut reg, &table, "Fox", 0.0, 0.0);
        let _far = animal(&mut reg, &table, "Squirrel", 5.0, 0.0);
        let near = animal(&mut reg, &table, "Rabbit", 0.0, 2.0);
        let _other_fox = animal(&mut reg, &table, "Fox", 0.5, 0.0);

        let index = SpatialIndex::build(&reg).unwrap();
        let selector = TargetSelector::new(&index, &table);
        let fox_species = table.id("Fox").unwrap();
        assert_eq!(selector.select_target(fox, fox_species, &pos2(0.0, 0.0)), near);
    }

    #[test]
    fn nuts_only_considered_for_nut_eaters() {
        let (table, mut reg) = setup();
        let squirrel = animal(&mut reg, &table, "Squirrel", 0.0, 0.0);
        let rabbit = animal(&mut reg, &table, "Rabbit", 10.0, 0.0);
        let acorn = table.get(table.id("Acorn").unwrap());
        let clover = table.get(table.id("Clover").unwrap());
        let nut = reg.spawn_nut(|id| Nut::new(id, acorn, pos2(1.0, 0.0))).unwrap();
        let plant = reg.spawn_plant(|id| Plant::new(id, clover, pos2(9.0, 0.0))).unwrap();

        let index = SpatialIndex::build(&reg).unwrap();
        let selector = TargetSelector::new(&index, &table);
        assert_eq!(
            selector.select_target(squirrel, table.id("Squirrel").unwrap(), &pos2(0.0, 0.0)),
            nut
        );
        assert_eq!(
            selector.select_target(rabbit, table.id("Rabbit").unwrap(), &pos2(10.0, 0.0)),
            plant
        );
    }

    #[test]
    fn no_prey_targets_self() {
        let (table, mut reg) = setup();
        let rabbit = animal(&mut reg, &table, "Rabbit", 0.0, 0.0);
        animal(&mut reg, &table, "Fox", 1.0, 0.0);

        let index = SpatialIndex::build(&reg).unwrap();
        let selector = TargetSelector::new(&index, &table);
        assert_eq!(
            selector.select_target(rabbit, table.id("Rabbit").unwrap(), &pos2(0.0, 0.0)),
            rabbit
        );
    }

    #[test]
    fn ties_go_to_lowest_id() {
        let (table, mut reg) = setup();
        let fox = animal(&mut reg, &table, "Fox", 0.0, 0.0);
        let first = animal(&mut reg, &table, "Rabbit", 2.0, 0.0);
        let _second = animal(&mut reg, &table, "Squirrel", -2.0, 0.0);
        let _third = animal(&mut reg, &table, "Rabbit", 0.0, 2.0);

        let index = SpatialIndex::build(&reg).unwrap();
        let selector = TargetSelector::new(&index, &table);
        assert_eq!(
            selector.select_target(fox, table.id("Fox").unwrap(), &pos2(0.0, 0.0)),
            first
        );
    }
}
