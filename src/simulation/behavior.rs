//! Per-animal behavior state machine and steering.
//!
//! Behavior is re-derived from scratch every tick: a predator closer than the
//! animal's flee distance always wins, otherwise hunger decides between
//! wandering and hunting. Updates only touch the animal itself; anything that
//! affects another entity is returned as a [`SimulationEvent`].

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::events::SimulationEvent;
use super::geometric_utils::{away_from, clamp_to_bounds_mut, distance, move_towards};
use super::hunger::HungerModel;
use super::locatable::Locatable;
use super::organism::Organism;
use super::params::Params;
use super::registry::{EntityId, OrganismRegistry};
use super::spatial::{Sighting, SpatialIndex};
use super::species::{SpeciesKind, SpeciesTable};
use super::targeting::TargetSelector;

/// What an animal is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    /// Walking to a random spot.
    Wandering,
    /// Walking to a prey target.
    Hunting,
    /// Running from the nearest predator.
    FleeingPredator,
}

impl Behavior {
    /// Derives the behavior from the nearest predator distance and hunger.
    ///
    /// A predator strictly closer than `min_dist` preempts everything.
    pub fn derive(predator_dist: Option<f32>, min_dist: f32, hunger: &HungerModel) -> Self {
        match predator_dist {
            Some(d) if d < min_dist => Behavior::FleeingPredator,
            _ if hunger.wants_food() => Behavior::Hunting,
            _ => Behavior::Wandering,
        }
    }
}

/// Read-only world view shared by all animals during the behavior phase.
pub struct BehaviorContext<'a> {
    /// Snapshot of every entity at the start of the step.
    pub index: &'a SpatialIndex,
    /// Species and food web.
    pub species: &'a SpeciesTable,
    /// World parameters.
    pub params: &'a Params,
}

impl BehaviorContext<'_> {
    /// Nearest predator of `org` inside its flee distance.
    pub fn nearest_predator(&self, org: &Organism) -> Option<(f32, &Sighting)> {
        let web = self.species.web();
        self.index
            .query(SpeciesKind::Animal, &org.pos, org.min_dist_from_predator)
            .into_iter()
            .filter(|(d, s)| s.id != org.id && *d < org.min_dist_from_predator && web.eats(s.species, org.species))
            .min_by(|(da, a), (db, b)| da.total_cmp(db).then(a.id.cmp(&b.id)))
    }

    /// Position of `org`'s target if it is still live, edible prey.
    fn valid_target(&self, org: &Organism) -> Option<&Sighting> {
        let target = org.target.filter(|t| *t != org.id)?;
        self.index
            .get(target)
            .filter(|s| self.species.web().eats(org.species, s.species))
    }
}

/// Nearest predator by linear scan of the live registry.
///
/// Used outside the behavior phase, where no snapshot exists.
pub fn nearest_predator_live(
    registry: &OrganismRegistry,
    species: &SpeciesTable,
    org: &Organism,
) -> Option<(f32, EntityId)> {
    registry
        .animals()
        .values()
        .filter(|other| other.id != org.id && species.web().eats(other.species, org.species))
        .map(|other| (distance(&org.pos, &other.pos), other.id))
        .min_by(|(da, a), (db, b)| da.total_cmp(db).then(a.cmp(b)))
}

/// Re-derives the behavior of animal `id` against the live registry.
///
/// # Returns
///
/// The new behavior, or `None` if `id` is not a live animal.
pub fn rederive(registry: &mut OrganismRegistry, species: &SpeciesTable, id: EntityId) -> Option<Behavior> {
    let predator = {
        let live: &OrganismRegistry = registry;
        live.animal(id)
            .and_then(|org| nearest_predator_live(live, species, org))
            .map(|(d, _)| d)
    };
    let org = registry.animal_mut(id)?;
    org.behavior = Behavior::derive(predator, org.min_dist_from_predator, &org.hunger);
    Some(org.behavior)
}

/// Moves `org` toward `dest`, clamped to the world, and records velocity.
fn steer(org: &mut Organism, dest: &Array1<f32>, params: &Params, dt: f32) {
    if dt <= 0.0 || distance(&org.pos, dest) <= params.arrival_epsilon {
        org.stop();
        return;
    }

    let mut next = move_towards(&org.pos, dest, org.speed * dt);
    clamp_to_bounds_mut(&mut next, &params.bounds);

    let delta = &next - &org.pos;
    if delta[0] != 0.0 {
        org.facing_right = delta[0] > 0.0;
    }
    org.velocity = delta / dt;
    *org.pos_mut() = next;
}

/// Advances one animal by `dt`.
///
/// # Returns
///
/// Events for the serial phase: wander re-rolls and feed attempts.
pub fn update(org: &mut Organism, ctx: &BehaviorContext<'_>, dt: f32) -> Vec<SimulationEvent> {
    let mut events = Vec::new();
    org.update(dt);

    if org.wander_timer.tick(dt) > 0 {
        events.push(SimulationEvent::WanderExpired { organism: org.id });
    }

    let predator = ctx.nearest_predator(org).map(|(d, s)| (d, s.pos.clone()));
    org.behavior = Behavior::derive(
        predator.as_ref().map(|(d, _)| *d),
        org.min_dist_from_predator,
        &org.hunger,
    );

    match org.behavior {
        Behavior::FleeingPredator => {
            if let Some((_, threat)) = predator {
                let mut dest = away_from(&org.pos, &threat);
                clamp_to_bounds_mut(&mut dest, &ctx.params.bounds);
                steer(org, &dest, ctx.params, dt);
            }
        }
        Behavior::Wandering => {
            let spot = org.wander_spot.clone();
            steer(org, &spot, ctx.params, dt);
        }
        Behavior::Hunting => match ctx.valid_target(org).map(|s| (s.id, s.pos.clone())) {
            Some((target, pos)) => {
                steer(org, &pos, ctx.params, dt);
                if distance(&org.pos, &pos) <= ctx.params.contact_radius {
                    events.push(SimulationEvent::ContactFeed {
                        consumer: org.id,
                        consumed: target,
                    });
                }
            }
            None => {
                let selector = TargetSelector::new(ctx.index, ctx.species);
                org.target = Some(selector.select_target(org.id, org.species, &org.pos));
                org.stop();
            }
        },
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::geometric_utils::pos2;
    use crate::simulation::level::{LevelConfig, SpeciesDef};
    use crate::simulation::registry::Capacity;
    use crate::simulation::scheduler::Periodic;

    fn hunger(value: f32) -> HungerModel {
        HungerModel {
            hunger: value,
            decline_rate: 1.0,
            feed_threshold: 5.0,
            starving_threshold: 2.0,
        }
    }

    fn setup() -> (SpeciesTable, OrganismRegistry) {
        let level = LevelConfig {
            name: "behavior".into(),
            species: vec![
                SpeciesDef::new("Rabbit", SpeciesKind::Animal),
                SpeciesDef::new("Fox", SpeciesKind::Animal).with_prey(&["Rabbit"]),
            ],
        };
        let table = SpeciesTable::from_level(&level).unwrap();
        let registry = OrganismRegistry::new(Capacity {
            animals: 10,
            plants: 10,
            nuts: 10,
        });
        (table, registry)
    }

    fn spawn(reg: &mut OrganismRegistry, table: &SpeciesTable, name: &str, x: f32, y: f32, h: f32) -> EntityId {
        let species = table.get(table.id(name).unwrap());
        reg.spawn_animal(|id| {
            let mut org = Organism::new(id, species, pos2(x, y), Periodic::new(100.0));
            org.hunger.hunger = h;
            org
        })
        .unwrap()
    }

    #[test]
    fn derive_flee_preempts_hunger() {
        assert_eq!(Behavior::derive(Some(1.0), 2.0, &hunger(1.0)), Behavior::FleeingPredator);
        assert_eq!(Behavior::derive(Some(2.0), 2.0, &hunger(1.0)), Behavior::Hunting);
        assert_eq!(Behavior::derive(None, 2.0, &hunger(5.0)), Behavior::Hunting);
        assert_eq!(Behavior::derive(None, 2.0, &hunger(6.0)), Behavior::Wandering);
    }

    #[test]
    fn hunter_selects_then_closes_in_and_touches() {
        let (table, mut reg) = setup();
        let fox = spawn(&mut reg, &table, "Fox", 0.0, 0.0, 1.0);
        let rabbit = spawn(&mut reg, &table, "Rabbit", 1.0, 0.0, 10.0);
        let params = Params::default();
        let index = SpatialIndex::build(&reg).unwrap();
        let ctx = BehaviorContext {
            index: &index,
            species: &table,
            params: &params,
        };

        let org = reg.animal_mut(fox).unwrap();
        assert!(update(org, &ctx, 0.1).is_empty());
        assert_eq!(org.target, Some(rabbit));
        assert!(!org.is_moving());

        let events = update(org, &ctx, 0.8);
        assert_eq!(org.behavior, Behavior::Hunting);
        assert!(org.facing_right);
        assert!(matches!(
            events.as_slice(),
            [SimulationEvent::ContactFeed { consumer, consumed }] if *consumer == fox && *consumed == rabbit
        ));
    }

    #[test]
    fn prey_flees_away_from_predator() {
        let (table, mut reg) = setup();
        spawn(&mut reg, &table, "Fox", 0.0, 0.0, 10.0);
        let rabbit = spawn(&mut reg, &table, "Rabbit", 1.0, 0.0, 1.0);
        let params = Params::default();
        let index = SpatialIndex::build(&reg).unwrap();
        let ctx = BehaviorContext {
            index: &index,
            species: &table,
            params: &params,
        };

        let org = reg.animal_mut(rabbit).unwrap();
        update(org, &ctx, 0.5);
        assert_eq!(org.behavior, Behavior::FleeingPredator);
        assert!(org.pos[0] > 1.0);
    }

    #[test]
    fn wanderer_stops_at_spot_and_stays_in_bounds() {
        let (table, mut reg) = setup();
        let rabbit = spawn(&mut reg, &table, "Rabbit", 7.5, 0.0, 10.0);
        let params = Params::default();
        let index = SpatialIndex::build(&reg).unwrap();
        let ctx = BehaviorContext {
            index: &index,
            species: &table,
            params: &params,
        };

        let org = reg.animal_mut(rabbit).unwrap();
        org.wander_spot = pos2(20.0, 0.0);
        update(org, &ctx, 2.0);
        assert!((org.pos[0] - params.bounds.max_x).abs() < 1e-6);

        org.wander_spot = org.pos.clone();
        update(org, &ctx, 1.0);
        assert!(!org.is_moving());
    }

    #[test]
    fn wander_timer_emits_reroll() {
        let (table, mut reg) = setup();
        let rabbit = spawn(&mut reg, &table, "Rabbit", 0.0, 0.0, 10.0);
        let params = Params::default();
        let index = SpatialIndex::build(&reg).unwrap();
        let ctx = BehaviorContext {
            index: &index,
            species: &table,
            params: &params,
        };

        let org = reg.animal_mut(rabbit).unwrap();
        org.wander_timer = Periodic::with_delay(0.5, 5.0);
        assert!(update(org, &ctx, 0.25).is_empty());
        assert!(matches!(
            update(org, &ctx, 0.25).as_slice(),
            [SimulationEvent::WanderExpired { .. }]
        ));
    }

    #[test]
    fn live_scan_finds_predator() {
        let (table, mut reg) = setup();
        let fox = spawn(&mut reg, &table, "Fox", 3.0, 4.0, 10.0);
        let rabbit = spawn(&mut reg, &table, "Rabbit", 0.0, 0.0, 1.0);

        let org = reg.animal(rabbit).unwrap().clone();
        let (d, id) = nearest_predator_live(&reg, &table, &org).unwrap();
        assert_eq!(id, fox);
        assert!((d - 5.0).abs() < 1e-5);
        assert!(nearest_predator_live(&reg, &table, reg.animal(fox).unwrap()).is_none());
    }
}
