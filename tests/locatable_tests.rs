#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use helios::simulation::geometric_utils::pos2;
use helios::simulation::hunger::HungerModel;
use helios::simulation::behavior::Behavior;
use helios::simulation::locatable::Locatable;
use helios::simulation::registry::EntityId;
use helios::simulation::scheduler::Periodic;
use helios::simulation::species::SpeciesId;
use helios::simulation::{nut::Nut, organism::Organism, plant::Plant};

fn plant_at(x: f32, y: f32) -> Plant {
    Plant {
        id: EntityId(1),
        species: SpeciesId(0),
        nut_species: None,
        pos: pos2(x, y),
        age: 0.0,
        growth: 1.0,
        max_growth: 5.0,
        growth_rate: 0.1,
        fully_grown: false,
    }
}

#[test]
fn test_nut_locatable() {
    let mut nut = Nut {
        id: EntityId(7),
        species: SpeciesId(2),
        pos: pos2(10.0, 20.0),
        nutrition: 3.0,
        age: 0.0,
    };

    // Test pos accessor
    assert_eq!(nut.pos()[0], 10.0);
    assert_eq!(nut.pos()[1], 20.0);
    assert_eq!(nut.id(), EntityId(7));
    assert_eq!(nut.species(), SpeciesId(2));

    // Test update
    nut.update(1.0);
    assert_eq!(nut.age, 1.0);

    // Test pos_mut accessor
    nut.pos_mut()[0] = 15.0;
    assert_eq!(nut.pos()[0], 15.0);
}

#[test]
fn test_plant_update_does_not_grow() {
    let mut plant = plant_at(0.0, 0.0);

    // Aging is continuous, growth only happens on scheduled checks
    plant.update(2.5);
    assert_eq!(plant.age, 2.5);
    assert_eq!(plant.growth, 1.0);
}

#[test]
fn test_locatable_trait_polymorphism() {
    let nut = Nut {
        id: EntityId(2),
        species: SpeciesId(1),
        pos: pos2(5.0, 5.0),
        nutrition: 3.0,
        age: 0.0,
    };
    let plant = plant_at(10.0, 10.0);

    // We can work with them through the trait
    fn get_distance(a: &dyn Locatable, b: &dyn Locatable) -> f32 {
        let dx = a.pos()[0] - b.pos()[0];
        let dy = a.pos()[1] - b.pos()[1];
        (dx * dx + dy * dy).sqrt()
    }

    let distance = get_distance(&nut, &plant);
    assert!((distance - 7.071).abs() < 0.1); // sqrt((10-5)^2 + (10-5)^2) ≈ 7.071
}

#[test]
fn test_organism_locatable_update() {
    let mut organism = Organism {
        id: EntityId(3),
        species: SpeciesId(4),
        age: 0.0,
        pos: pos2(1.0, 2.0),
        velocity: pos2(0.0, 0.0),
        facing_right: false,
        speed: 1.0,
        min_dist_from_predator: 2.0,
        hunger: HungerModel {
            hunger: 10.0,
            decline_rate: 1.0,
            feed_threshold: 5.0,
            starving_threshold: 2.0,
        },
        behavior: Behavior::Wandering,
        target: None,
        wander_spot: pos2(1.0, 2.0),
        wander_timer: Periodic::new(5.0),
    };

    organism.update(1.0);
    assert_eq!(organism.age, 1.0);

    // Updating the clock leaves hunger and the wander timer alone
    organism.update(0.5);
    assert_eq!(organism.age, 1.5);
    assert_eq!(organism.hunger.hunger, 10.0);
    assert_eq!(organism.wander_timer.remaining(), 5.0);
    assert!(!organism.is_moving());
}
