//! Main ecosystem simulation with parallel organism updates.
//!
//! The ecosystem owns the registry, the energy pool, the scheduler and the
//! only random number generator. A step has two phases:
//! - a parallel behavior phase (rayon) where every animal reads an immutable
//!   spatial snapshot and only mutates itself, pushing feed attempts and
//!   wander re-rolls onto an event queue;
//! - a serial phase that applies those events in id order and then runs the
//!   scheduled tasks (hunger decay, growth, rebalancing, income, goal check).

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use log::{debug, info, warn};
use ndarray::Array1;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::behavior::{self, BehaviorContext};
use super::energy::EnergyPool;
use super::error::{Result, SimError};
use super::event_log::{EventCategory, EventLog};
use super::events::{self, EventQueue};
use super::feeding::{self, FeedOutcome};
use super::geometric_utils::{clamp_to_bounds_mut, pos2, random_in_bounds, random_in_circle};
use super::goals::{GoalCheck, GoalStatus, GoalTracker, SpeciesGoals};
use super::hunger::HungerStatus;
use super::level::LevelConfig;
use super::locatable::Locatable;
use super::nut::Nut;
use super::organism::Organism;
use super::params::Params;
use super::plant::{Offspring, Plant};
use super::population::{Adjustment, PopulationBalancer, Targets};
use super::registry::{Capacity, EntityId, EntityRef, OrganismRegistry};
use super::scheduler::{Periodic, Scheduler, TaskKind};
use super::spatial::SpatialIndex;
use super::species::{SpeciesId, SpeciesKind, SpeciesTable};
use super::targeting::TargetSelector;

/// Most runs of one task per step; a longer backlog is dropped.
const MAX_CATCH_UP: u32 = 100;

/// Running totals since the level started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemStats {
    /// Entities spawned (initial, rebalanced, placed or offspring).
    pub births: u64,
    /// Animals that starved.
    pub starved: u64,
    /// Successful feeds.
    pub feeds: u64,
    /// Entities removed by a culling policy.
    pub culled: u64,
}

/// Snapshot of the level state for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcosystemSummary {
    /// Level name.
    pub level: String,
    /// Simulation time in seconds.
    pub time: f32,
    /// Energy in the pool.
    pub energy: u32,
    /// Live count per species name.
    pub populations: BTreeMap<String, usize>,
    /// Live count and goal per goal species.
    pub goals: BTreeMap<String, GoalStatus>,
    /// Consecutive satisfied goal checks.
    pub goal_streak: u32,
    /// Whether the level has been won.
    pub won: bool,
    /// Running totals.
    pub stats: EcosystemStats,
}

/// The main ecosystem containing all simulation state.
#[derive(Debug)]
pub struct Ecosystem {
    level_name: String,
    params: Params,
    species: SpeciesTable,
    goals: SpeciesGoals,
    registry: OrganismRegistry,
    energy: EnergyPool,
    scheduler: Scheduler,
    balancer: PopulationBalancer,
    goal_tracker: GoalTracker,
    targets: Targets,
    event_log: EventLog,
    stats: EcosystemStats,
    rng: StdRng,
    time: f32,
}

impl Ecosystem {
    /// Creates an ecosystem for `level`, spawns the initial populations at
    /// random positions and starts the periodic tasks.
    ///
    /// The same level, params and seed always produce the same run.
    pub fn new(level: &LevelConfig, params: Params, seed: u64) -> Result<Self> {
        level.validate()?;
        params.validate()?;
        let species = SpeciesTable::from_level(level)?;
        let goals = SpeciesGoals::from_level(level, &species);
        let registry = OrganismRegistry::new(Capacity {
            animals: params.max_animals,
            plants: params.max_plants,
            nuts: params.max_nuts,
        });

        let mut ecosystem = Self {
            level_name: level.name.clone(),
            energy: EnergyPool::new(params.starting_energy),
            goal_tracker: GoalTracker::new(params.goal_tolerance_ratio, params.goal_required_checks),
            event_log: EventLog::new(params.event_log_size),
            targets: goals.as_map().clone(),
            params,
            species,
            goals,
            registry,
            scheduler: Scheduler::new(),
            balancer: PopulationBalancer::default(),
            stats: EcosystemStats::default(),
            rng: StdRng::seed_from_u64(seed),
            time: 0.0,
        };

        for def in &level.species {
            let id = ecosystem.species.require(&def.name)?;
            for _ in 0..def.initial_population {
                let pos = random_in_bounds(&mut ecosystem.rng, &ecosystem.params.bounds);
                match ecosystem.spawn_species(id, pos) {
                    Ok(_) => {}
                    Err(err @ SimError::CapacityExceeded { .. }) => {
                        warn!("initial {} population truncated: {err}", def.name);
                        break;
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        ecosystem.start_tasks();
        info!(
            "level {} started with {} entities, {} energy",
            ecosystem.level_name,
            ecosystem.registry.len(),
            ecosystem.energy.amount()
        );
        Ok(ecosystem)
    }

    /// Replaces the population balancer.
    #[must_use]
    pub fn with_balancer(mut self, balancer: PopulationBalancer) -> Self {
        self.balancer = balancer;
        self
    }

    fn start_tasks(&mut self) {
        let p = &self.params;
        self.scheduler
            .schedule(TaskKind::HungerDecay, Periodic::new(p.hunger_decay_interval));
        self.scheduler
            .schedule(TaskKind::GrowthCheck, Periodic::new(p.growth_check_interval));
        if let Some(interval) = p.rebalance_interval {
            self.scheduler.schedule(TaskKind::Rebalance, Periodic::new(interval));
        }
        self.scheduler
            .schedule(TaskKind::EnergyIncome, Periodic::new(p.energy_income_interval));
        if !self.goals.is_empty() {
            self.scheduler
                .schedule(TaskKind::GoalCheck, Periodic::new(p.goal_check_interval));
        }
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// A step that spans many task periods runs each task at most
    /// `MAX_CATCH_UP` times.
    pub fn step(&mut self, dt: f32) -> Result<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidStep(dt));
        }
        self.time += dt;

        let index = SpatialIndex::build(&self.registry)?;
        let ctx = BehaviorContext {
            index: &index,
            species: &self.species,
            params: &self.params,
        };
        let event_queue = Mutex::new(EventQueue::new());

        // parallel phase, only apply updates to the animal itself
        self.registry.animals_mut().par_iter_mut().for_each(|(_, org)| {
            let local_events = behavior::update(org, &ctx, dt);
            if !local_events.is_empty() {
                let mut queue = event_queue.lock().unwrap_or_else(PoisonError::into_inner);
                queue.extend(local_events);
            }
        });

        for plant in self.registry.plants_mut().values_mut() {
            plant.update(dt);
        }
        for nut in self.registry.nuts_mut().values_mut() {
            nut.update(dt);
        }

        let queue = event_queue.into_inner().unwrap_or_else(PoisonError::into_inner);
        events::apply_events(self, queue);

        for (kind, fired) in self.scheduler.advance(dt) {
            if fired > MAX_CATCH_UP {
                warn!("{kind:?} fell {fired} periods behind, running {MAX_CATCH_UP}");
            }
            for _ in 0..fired.min(MAX_CATCH_UP) {
                if !self.scheduler.is_scheduled(kind) {
                    break;
                }
                self.run_task(kind)?;
            }
        }
        Ok(())
    }

    fn run_task(&mut self, kind: TaskKind) -> Result<()> {
        match kind {
            TaskKind::HungerDecay => {
                self.decay_hunger();
            }
            TaskKind::GrowthCheck => {
                self.grow_plants();
            }
            TaskKind::Rebalance => {
                self.rebalance()?;
            }
            TaskKind::EnergyIncome => {
                self.gain_energy(self.params.energy_income);
            }
            TaskKind::GoalCheck => {
                self.check_goals();
            }
        }
        Ok(())
    }

    /// One hunger decay tick for every animal. Starved animals are removed.
    ///
    /// # Returns
    ///
    /// Ids of the animals that starved.
    pub fn decay_hunger(&mut self) -> Vec<EntityId> {
        let mut starved = Vec::new();
        for (id, org) in self.registry.animals_mut() {
            let before = org.hunger.status();
            match org.hunger.decay() {
                HungerStatus::Starved => starved.push(*id),
                HungerStatus::Starving if before != HungerStatus::Starving => {
                    debug!("{id} is starving (hunger {:.1})", org.hunger.hunger);
                }
                _ => {}
            }
        }

        for id in &starved {
            self.remove_starved(*id);
        }
        starved
    }

    fn remove_starved(&mut self, id: EntityId) {
        if let Some(species) = self.registry.remove(id).map(|e| e.species()) {
            let name = self.species.name(species);
            info!("{name} {id} starved");
            self.event_log
                .log(self.time, format!("{name} starved"), EventCategory::Death);
            self.stats.starved += 1;
        }
    }

    /// One natural growth check for every plant.
    ///
    /// # Returns
    ///
    /// Ids of the plants that became fully grown.
    pub fn grow_plants(&mut self) -> Vec<EntityId> {
        let grown: Vec<(EntityId, SpeciesId)> = self
            .registry
            .plants_mut()
            .values_mut()
            .filter_map(|plant| plant.grow().then_some((plant.id, plant.species)))
            .collect();

        for (id, species) in &grown {
            let name = self.species.name(*species);
            debug!("{name} {id} is fully grown");
            self.event_log
                .log(self.time, format!("{name} fully grown"), EventCategory::Growth);
        }
        grown.into_iter().map(|(id, _)| id).collect()
    }

    /// One rebalancing pass.
    ///
    /// Spawns stop at the first capacity error; the rest of the plan is
    /// still applied.
    ///
    /// # Returns
    ///
    /// Number of entities spawned.
    pub fn rebalance(&mut self) -> Result<usize> {
        let (targets, plan) = self
            .balancer
            .plan(&self.registry, &self.species, &self.goals);
        self.targets = targets;

        let mut spawned = 0;
        for adjustment in plan {
            match adjustment {
                Adjustment::Spawn { species, count } => {
                    for _ in 0..count {
                        let pos = random_in_bounds(&mut self.rng, &self.params.bounds);
                        match self.spawn_species(species, pos) {
                            Ok(_) => spawned += 1,
                            Err(err @ SimError::CapacityExceeded { .. }) => {
                                warn!("rebalance of {} stopped: {err}", self.species.name(species));
                                break;
                            }
                            Err(err) => return Err(err),
                        }
                    }
                }
                Adjustment::Cull { species, ids } => {
                    let name = self.species.name(species).to_string();
                    for id in ids {
                        if self.registry.remove(id).is_some() {
                            debug!("culled {name} {id}");
                            self.event_log
                                .log(self.time, format!("{name} culled"), EventCategory::Death);
                            self.stats.culled += 1;
                        }
                    }
                }
            }
        }
        Ok(spawned)
    }

    /// One win-condition check. Winning stops further checks.
    pub fn check_goals(&mut self) -> GoalCheck {
        let registry = &self.registry;
        let result = self
            .goal_tracker
            .check(&self.goals, |species| registry.count(species));

        if result == GoalCheck::Won && self.scheduler.cancel(TaskKind::GoalCheck) {
            info!("level {} won at t={:.1}s", self.level_name, self.time);
            self.event_log
                .log(self.time, "all goals reached".to_string(), EventCategory::Goal);
        }
        result
    }

    fn spawn_species(&mut self, species: SpeciesId, mut pos: Array1<f32>) -> Result<EntityId> {
        clamp_to_bounds_mut(&mut pos, &self.params.bounds);
        let def = self.species.get(species);
        let id = match def.kind {
            SpeciesKind::Animal => {
                let p = &self.params;
                let timer = Periodic::jittered(
                    &mut self.rng,
                    p.wander_delay_min,
                    p.wander_interval_min,
                    p.wander_jitter,
                );
                self.registry
                    .spawn_animal(|id| Organism::new(id, def, pos, timer))?
            }
            SpeciesKind::Plant => self.registry.spawn_plant(|id| Plant::new(id, def, pos))?,
            SpeciesKind::Nut => self.registry.spawn_nut(|id| Nut::new(id, def, pos))?,
        };

        debug!("spawned {} {id}", def.name);
        self.event_log
            .log(self.time, format!("{} spawned", def.name), EventCategory::Birth);
        self.stats.births += 1;
        Ok(id)
    }

    fn checked_position(&self, x: f32, y: f32) -> Result<Array1<f32>> {
        if !(x.is_finite() && y.is_finite() && self.params.bounds.contains(x, y)) {
            return Err(SimError::OutOfBounds { x, y });
        }
        Ok(pos2(x, y))
    }

    /// Spawns one member of `species` at `(x, y)`, free of charge.
    pub fn spawn(&mut self, species: &str, x: f32, y: f32) -> Result<EntityId> {
        let id = self.species.require(species)?;
        let pos = self.checked_position(x, y)?;
        self.spawn_species(id, pos)
    }

    /// Player placement: spawns at `(x, y)` after paying the species'
    /// placement cost. Nothing is spent if the placement cannot happen.
    pub fn place(&mut self, species: &str, x: f32, y: f32) -> Result<EntityId> {
        let id = self.species.require(species)?;
        let pos = self.checked_position(x, y)?;
        let def = self.species.get(id);
        self.registry.ensure_room(def.kind)?;
        self.spend_energy(def.placement_cost)?;
        self.spawn_species(id, pos)
    }

    /// Feeds `consumer` with `consumed`, adding exactly `amount` hunger.
    ///
    /// With `replace_on_consume` set, a removed prey is replaced by a new
    /// member of its species at a random position.
    pub fn attempt_feed(&mut self, consumer: EntityId, consumed: EntityId, amount: f32) -> Result<FeedOutcome> {
        let outcome = feeding::resolve(
            &mut self.registry,
            &self.species,
            &self.params,
            consumer,
            consumed,
            amount,
        )
        .inspect_err(|err| debug!("feed {consumer} -> {consumed} rejected: {err}"))?;

        self.stats.feeds += 1;
        let description = format!(
            "{} ate {}",
            self.registry
                .animal(consumer)
                .map_or("?", |o| self.species.name(o.species)),
            self.species.name(outcome.consumed_species)
        );
        self.event_log.log(self.time, description, EventCategory::Feeding);

        if self.params.replace_on_consume && outcome.removed {
            let pos = random_in_bounds(&mut self.rng, &self.params.bounds);
            if let Err(err) = self.spawn_species(outcome.consumed_species, pos) {
                warn!("replacement {} not spawned: {err}", self.species.name(outcome.consumed_species));
            }
        }
        Ok(outcome)
    }

    /// Feed triggered by contact. Nuts give their own nutrition, everything
    /// else gives `feed_amount`.
    pub fn contact_feed(&mut self, consumer: EntityId, consumed: EntityId) -> Result<FeedOutcome> {
        let amount = match self.registry.require(consumed)? {
            EntityRef::Nut(nut) => nut.nutrition,
            _ => self.params.feed_amount,
        };
        self.attempt_feed(consumer, consumed, amount)
    }

    /// Draws a new wander spot for an animal.
    pub fn reroll_wander_spot(&mut self, id: EntityId) {
        if !self.registry.animals().contains_key(&id) {
            return;
        }
        let (cx, cy) = self.params.bounds.center();
        let mut spot = random_in_circle(&mut self.rng, &pos2(cx, cy), self.params.wander_radius);
        clamp_to_bounds_mut(&mut spot, &self.params.bounds);
        if let Some(org) = self.registry.animal_mut(id) {
            org.wander_spot = spot;
        }
    }

    /// Nearest valid prey of an animal, or the animal itself.
    pub fn select_target(&self, id: EntityId) -> Result<EntityId> {
        let org = self.animal_or_err(id)?;
        let index = SpatialIndex::build(&self.registry)?;
        let selector = TargetSelector::new(&index, &self.species);
        Ok(selector.select_target(org.id, org.species, &org.pos))
    }

    fn animal_or_err(&self, id: EntityId) -> Result<&Organism> {
        match self.registry.require(id)? {
            EntityRef::Animal(org) => Ok(org),
            _ => Err(SimError::WrongKind {
                id,
                expected: "animal",
            }),
        }
    }

    fn plant_or_err(&self, id: EntityId) -> Result<&Plant> {
        match self.registry.require(id)? {
            EntityRef::Plant(plant) => Ok(plant),
            _ => Err(SimError::WrongKind { id, expected: "plant" }),
        }
    }

    /// Spends energy, all or nothing.
    pub fn spend_energy(&mut self, cost: u32) -> Result<u32> {
        let left = self.energy.spend(cost)?;
        if cost > 0 {
            self.event_log
                .log(self.time, format!("spent {cost} energy"), EventCategory::Energy);
        }
        Ok(left)
    }

    /// Adds energy to the pool.
    pub fn gain_energy(&mut self, amount: u32) -> u32 {
        let total = self.energy.gain(amount);
        debug!("energy +{amount} -> {total}");
        total
    }

    /// Player action: pays the boost cost and grows a plant.
    ///
    /// # Returns
    ///
    /// The plant's growth after the boost.
    pub fn boost_plant(&mut self, id: EntityId) -> Result<f32> {
        self.plant_or_err(id)?;
        self.spend_energy(self.params.plant_boost_cost)?;

        let amount = self.params.plant_boost_amount;
        let plant = self
            .registry
            .plant_mut(id)
            .ok_or(SimError::InvalidReference(id))?;
        let became_grown = plant.boost_growth(amount);
        let (growth, species) = (plant.growth, plant.species);

        if became_grown {
            let name = self.species.name(species);
            debug!("{name} {id} is fully grown");
            self.event_log
                .log(self.time, format!("{name} fully grown"), EventCategory::Growth);
        }
        Ok(growth)
    }

    /// Player action: pays the energize cost and feeds an animal.
    ///
    /// # Returns
    ///
    /// The animal's hunger after the boost.
    pub fn energize_organism(&mut self, id: EntityId) -> Result<f32> {
        self.animal_or_err(id)?;
        self.spend_energy(self.params.organism_boost_cost)?;

        let amount = self.params.organism_boost_amount;
        let org = self
            .registry
            .animal_mut(id)
            .ok_or(SimError::InvalidReference(id))?;
        org.hunger.feed(amount);
        let hunger = org.hunger.hunger;
        behavior::rederive(&mut self.registry, &self.species, id);
        Ok(hunger)
    }

    /// Player action: a fully grown plant drops a nut next to it.
    pub fn spawn_nut(&mut self, plant: EntityId) -> Result<EntityId> {
        self.spawn_offspring(plant, Offspring::Nut, self.params.nut_spawn_cost)
    }

    /// Player action: a fully grown plant seeds a new plant next to it.
    pub fn spawn_new_plant(&mut self, plant: EntityId) -> Result<EntityId> {
        self.spawn_offspring(plant, Offspring::Plant, self.params.plant_spawn_cost)
    }

    fn spawn_offspring(&mut self, parent: EntityId, kind: Offspring, cost: u32) -> Result<EntityId> {
        let plant = self.plant_or_err(parent)?;
        let species = plant.offspring_species(kind)?;
        let origin = plant.pos.clone();
        self.registry.ensure_room(self.species.get(species).kind)?;
        self.spend_energy(cost)?;

        let pos = random_in_circle(&mut self.rng, &origin, self.params.offspring_radius);
        self.spawn_species(species, pos)
    }

    /// Live count and goal of a species, `None` if it has no goal.
    pub fn goal_status(&self, species: &str) -> Result<Option<GoalStatus>> {
        let id = self.species.require(species)?;
        Ok(self.goals.get(id).map(|goal| GoalStatus {
            current: self.registry.count(id),
            goal,
        }))
    }

    /// Live count of a species.
    pub fn count(&self, species: &str) -> Result<usize> {
        Ok(self.registry.count(self.species.require(species)?))
    }

    /// Level teardown: stops every scheduled task.
    pub fn end_level(&mut self) {
        self.scheduler.cancel_all();
        info!("level {} ended at t={:.1}s", self.level_name, self.time);
    }

    /// Reporting snapshot.
    pub fn summary(&self) -> EcosystemSummary {
        let populations = self
            .species
            .iter()
            .map(|s| (s.name.clone(), self.registry.count(s.id)))
            .collect();
        let goals = self
            .goals
            .iter()
            .map(|(id, goal)| {
                let status = GoalStatus {
                    current: self.registry.count(id),
                    goal,
                };
                (self.species.name(id).to_string(), status)
            })
            .collect();

        EcosystemSummary {
            level: self.level_name.clone(),
            time: self.time,
            energy: self.energy.amount(),
            populations,
            goals,
            goal_streak: self.goal_tracker.streak(),
            won: self.goal_tracker.is_won(),
            stats: self.stats,
        }
    }

    /// All live entities.
    pub fn registry(&self) -> &OrganismRegistry {
        &self.registry
    }

    /// Overrides an animal's hunger. At zero or below the animal starves
    /// and is removed, as on a decay tick.
    pub fn set_hunger(&mut self, id: EntityId, hunger: f32) -> Result<HungerStatus> {
        self.animal_or_err(id)?;
        if !hunger.is_finite() {
            return Err(SimError::InvalidAmount(hunger));
        }
        let org = self
            .registry
            .animal_mut(id)
            .ok_or(SimError::InvalidReference(id))?;
        org.hunger.hunger = hunger;
        let status = org.hunger.status();

        if status == HungerStatus::Starved {
            self.remove_starved(id);
        } else {
            behavior::rederive(&mut self.registry, &self.species, id);
        }
        Ok(status)
    }

    /// Overrides a plant's growth, clamped to `[0, max_growth]`.
    ///
    /// # Returns
    ///
    /// The growth actually set.
    pub fn set_growth(&mut self, id: EntityId, growth: f32) -> Result<f32> {
        self.plant_or_err(id)?;
        if !growth.is_finite() {
            return Err(SimError::InvalidAmount(growth));
        }
        let plant = self
            .registry
            .plant_mut(id)
            .ok_or(SimError::InvalidReference(id))?;
        plant.growth = growth.clamp(0.0, plant.max_growth);
        plant.fully_grown = plant.growth >= plant.max_growth;
        Ok(plant.growth)
    }

    /// Removes any entity, free of charge.
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        let entity = self.registry.remove(id).ok_or(SimError::InvalidReference(id))?;
        let name = self.species.name(entity.species());
        debug!("despawned {name} {id}");
        self.event_log
            .log(self.time, format!("{name} removed"), EventCategory::Death);
        Ok(())
    }

    /// Species of the level.
    pub fn species(&self) -> &SpeciesTable {
        &self.species
    }

    /// Level goals.
    pub fn goals(&self) -> &SpeciesGoals {
        &self.goals
    }

    /// Parameters in use.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Periodic tasks.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Targets from the last rebalance pass.
    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    /// Energy in the pool.
    pub fn energy(&self) -> u32 {
        self.energy.amount()
    }

    /// Recent events, newest first.
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Running totals.
    pub fn stats(&self) -> &EcosystemStats {
        &self.stats
    }

    /// Simulation time in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Whether the level has been won.
    pub fn is_won(&self) -> bool {
        self.goal_tracker.is_won()
    }
}
