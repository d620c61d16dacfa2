//! Population rebalancing.
//!
//! Every rebalance pass asks a [`TargetStrategy`] for a target count per
//! species and compares it with the live count. Deficits become spawn
//! requests. Surpluses are handed to a [`CullingPolicy`], which by default
//! removes nothing. The balancer only plans; the ecosystem applies the plan so
//! that capacity limits and randomness stay in one place.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use super::goals::SpeciesGoals;
use super::registry::{EntityId, OrganismRegistry};
use super::species::{SpeciesId, SpeciesTable};

/// Target population per species.
pub type Targets = BTreeMap<SpeciesId, usize>;

/// Inputs available to a target strategy.
pub struct PopulationContext<'a> {
    /// Species and food web.
    pub species: &'a SpeciesTable,
    /// Level goals.
    pub goals: &'a SpeciesGoals,
    /// Live count per species.
    pub counts: &'a BTreeMap<SpeciesId, usize>,
}

/// Source of target counts.
pub trait TargetStrategy: fmt::Debug + Send {
    /// Target count per species. Species missing from the map are left alone.
    fn targets(&mut self, ctx: &PopulationContext<'_>) -> Targets;
}

/// Targets are the level goals.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoalTargets;

impl TargetStrategy for GoalTargets {
    fn targets(&mut self, ctx: &PopulationContext<'_>) -> Targets {
        ctx.goals.as_map().clone()
    }
}

/// Predator/prey estimate recomputed from its own previous output.
///
/// For a species with base population `x`, `food` is the summed target of
/// its known prey over `countF` prey species and `eater` the summed target
/// of its known predators over `countE = max(1, predators)`. The new target
/// is `max(1, (food / countF - eater / countE) * x * (1 - x))` in integer
/// arithmetic, saturating instead of overflowing. Apex species and species
/// with no known prey keep their previous target.
#[derive(Debug, Clone)]
pub struct FoodWebHeuristic {
    previous: Targets,
}

impl FoodWebHeuristic {
    /// Starts from the given targets, usually the goals or initial populations.
    pub fn new(seed: Targets) -> Self {
        Self { previous: seed }
    }

    fn estimate(&self, species: &SpeciesTable, id: SpeciesId) -> Option<usize> {
        let web = species.web();
        if web.is_apex(id) {
            return None;
        }

        let (food, count_f) = sum_known(&self.previous, web.prey_of(id));
        if count_f == 0 {
            return None;
        }
        let (eater, count_e) = sum_known(&self.previous, web.predators_of(id));
        let count_e = count_e.max(1);

        let x = i64::from(species.get(id).base_population);
        let pop = (food / count_f - eater / count_e)
            .saturating_mul(x)
            .saturating_mul(1 - x);
        Some(usize::try_from(pop.max(1)).unwrap_or(usize::MAX))
    }
}

/// Sum of the targets of `ids` that have one, and how many did.
fn sum_known(targets: &Targets, ids: impl Iterator<Item = SpeciesId>) -> (i64, i64) {
    ids.filter_map(|s| targets.get(&s)).fold((0, 0), |(sum, n), &t| {
        let t = i64::try_from(t).unwrap_or(i64::MAX);
        (sum.saturating_add(t), n + 1)
    })
}

impl TargetStrategy for FoodWebHeuristic {
    fn targets(&mut self, ctx: &PopulationContext<'_>) -> Targets {
        let next: Targets = self
            .previous
            .iter()
            .map(|(&id, &prev)| (id, self.estimate(ctx.species, id).unwrap_or(prev)))
            .collect();
        self.previous = next.clone();
        next
    }
}

/// Chooses which members of an overpopulated species to remove.
pub trait CullingPolicy: fmt::Debug + Send {
    /// Picks up to `excess` ids out of `members` (id order, oldest first).
    fn select(&self, species: SpeciesId, excess: usize, members: &[EntityId]) -> Vec<EntityId>;
}

/// Never removes anything; overpopulation is left to starvation and predators.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCulling;

impl CullingPolicy for NoCulling {
    fn select(&self, _species: SpeciesId, _excess: usize, _members: &[EntityId]) -> Vec<EntityId> {
        Vec::new()
    }
}

/// One change requested by a rebalance pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustment {
    /// Spawn `count` new members at random positions.
    Spawn {
        /// Species to spawn.
        species: SpeciesId,
        /// How many.
        count: usize,
    },
    /// Remove these members.
    Cull {
        /// Species being culled.
        species: SpeciesId,
        /// Members to remove.
        ids: Vec<EntityId>,
    },
}

/// Plans spawns and culls from targets and live counts.
#[derive(Debug)]
pub struct PopulationBalancer {
    strategy: Box<dyn TargetStrategy>,
    culling: Box<dyn CullingPolicy>,
}

impl Default for PopulationBalancer {
    fn default() -> Self {
        Self::new(Box::new(GoalTargets), Box::new(NoCulling))
    }
}

impl PopulationBalancer {
    /// Creates a balancer from a strategy and a culling policy.
    pub fn new(strategy: Box<dyn TargetStrategy>, culling: Box<dyn CullingPolicy>) -> Self {
        Self { strategy, culling }
    }

    /// Replaces the culling policy.
    pub fn with_culling(mut self, culling: Box<dyn CullingPolicy>) -> Self {
        self.culling = culling;
        self
    }

    /// Computes this pass's targets and the adjustments that reach them.
    pub fn plan(
        &mut self,
        registry: &OrganismRegistry,
        species: &SpeciesTable,
        goals: &SpeciesGoals,
    ) -> (Targets, Vec<Adjustment>) {
        let counts = registry.counts();
        let ctx = PopulationContext {
            species,
            goals,
            counts: &counts,
        };
        let targets = self.strategy.targets(&ctx);
        let adjustments = self.reconcile(registry, &targets);
        (targets, adjustments)
    }

    /// Adjustments that bring live counts to `targets`.
    pub fn reconcile(&self, registry: &OrganismRegistry, targets: &Targets) -> Vec<Adjustment> {
        let mut adjustments = Vec::new();
        for (&species, &target) in targets {
            let live = registry.count(species);
            if live < target {
                adjustments.push(Adjustment::Spawn {
                    species,
                    count: target - live,
                });
            } else if live > target {
                let members: Vec<EntityId> = registry.members(species).collect();
                let mut ids = self.culling.select(species, live - target, &members);
                ids.truncate(live - target);
                if !ids.is_empty() {
                    debug!("culling {} of {species} ({live} live, target {target})", ids.len());
                    adjustments.push(Adjustment::Cull { species, ids });
                }
            }
        }
        adjustments
    }
}
