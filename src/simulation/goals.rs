//! Per-level population goals and the win condition.
//!
//! A goal is met while the live count is within a tolerance of the target.
//! The level is won after enough consecutive checks where every goal is met;
//! a single miss resets the streak.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::level::LevelConfig;
use super::species::{SpeciesId, SpeciesTable};

/// Target population per species, fixed for the lifetime of a level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesGoals {
    goals: BTreeMap<SpeciesId, usize>,
}

impl SpeciesGoals {
    /// Collects the goals declared in the level.
    pub fn from_level(level: &LevelConfig, species: &SpeciesTable) -> Self {
        let goals = level
            .species
            .iter()
            .filter_map(|def| Some((species.id(&def.name)?, def.goal?)))
            .collect();
        Self { goals }
    }

    /// Goal of one species.
    pub fn get(&self, species: SpeciesId) -> Option<usize> {
        self.goals.get(&species).copied()
    }

    /// All goals in species id order.
    pub fn iter(&self) -> impl Iterator<Item = (SpeciesId, usize)> + '_ {
        self.goals.iter().map(|(s, g)| (*s, *g))
    }

    /// The goals as a target map.
    pub fn as_map(&self) -> &BTreeMap<SpeciesId, usize> {
        &self.goals
    }

    /// Number of species with a goal.
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// Whether no species has a goal.
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}

impl FromIterator<(SpeciesId, usize)> for SpeciesGoals {
    fn from_iter<T: IntoIterator<Item = (SpeciesId, usize)>>(iter: T) -> Self {
        Self {
            goals: iter.into_iter().collect(),
        }
    }
}

/// Live count next to the goal, as shown in the goal panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStatus {
    /// Live members of the species.
    pub current: usize,
    /// Target population.
    pub goal: usize,
}

impl GoalStatus {
    /// Allowed distance from the goal: `max(1, ceil(goal * ratio))`.
    pub fn tolerance(&self, ratio: f32) -> usize {
        ((self.goal as f32 * ratio).ceil() as usize).max(1)
    }

    /// Whether the count is strictly within the tolerance.
    pub fn is_met(&self, ratio: f32) -> bool {
        self.current.abs_diff(self.goal) < self.tolerance(ratio)
    }
}

/// Result of one goal check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalCheck {
    /// Every goal met; the streak grew to this length.
    Satisfied(u32),
    /// At least one goal missed; the streak was reset.
    Missed,
    /// This check completed the streak.
    Won,
}

/// Counts consecutive satisfied checks.
#[derive(Debug, Clone)]
pub struct GoalTracker {
    tolerance_ratio: f32,
    required: u32,
    streak: u32,
    won: bool,
}

impl GoalTracker {
    /// Creates a tracker needing `required` consecutive satisfied checks.
    pub fn new(tolerance_ratio: f32, required: u32) -> Self {
        Self {
            tolerance_ratio,
            required: required.max(1),
            streak: 0,
            won: false,
        }
    }

    /// Compares every goal species against `count`.
    pub fn check(&mut self, goals: &SpeciesGoals, count: impl Fn(SpeciesId) -> usize) -> GoalCheck {
        if self.won {
            return GoalCheck::Won;
        }

        let missed = goals.iter().find(|&(species, goal)| {
            !GoalStatus {
                current: count(species),
                goal,
            }
            .is_met(self.tolerance_ratio)
        });

        if let Some((species, goal)) = missed {
            if self.streak > 0 {
                debug!("goal streak reset at {} by {species} (goal {goal})", self.streak);
            }
            self.streak = 0;
            return GoalCheck::Missed;
        }

        self.streak += 1;
        if self.streak >= self.required {
            self.won = true;
            info!("all population goals held for {} checks", self.streak);
            GoalCheck::Won
        } else {
            GoalCheck::Satisfied(self.streak)
        }
    }

    /// Current streak length.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Whether the level has been won.
    pub fn is_won(&self) -> bool {
        self.won
    }
}
