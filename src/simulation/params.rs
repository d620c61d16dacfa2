use serde::{Deserialize, Serialize};

use super::error::{Result, SimError};

/// Axis-aligned rectangle that organisms live in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub min_x: f32,
    /// Right edge.
    pub max_x: f32,
    /// Bottom edge.
    pub min_y: f32,
    /// Top edge.
    pub max_y: f32,
}

impl Bounds {
    /// Whether the point lies inside the rectangle (edges included).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Center of the rectangle.
    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: -8.0,
            max_x: 8.0,
            min_y: -4.0,
            max_y: 4.0,
        }
    }
}

/// Simulation parameters that control ecosystem behavior.
///
/// Species-specific values (speeds, thresholds, decline rates) live in the
/// level definition; everything here applies to the whole world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Playable area. Spawns and placements are kept inside it.
    pub bounds: Bounds,

    /// Seconds between hunger decay ticks.
    pub hunger_decay_interval: f32,
    /// Seconds between population rebalancing passes. `None` disables rebalancing.
    pub rebalance_interval: Option<f32>,
    /// Seconds between natural plant growth checks.
    pub growth_check_interval: f32,
    /// Seconds between passive energy income.
    pub energy_income_interval: f32,
    /// Seconds between win-condition checks.
    pub goal_check_interval: f32,

    /// Energy in the pool when a level starts.
    pub starting_energy: u32,
    /// Energy added on each income tick.
    pub energy_income: u32,

    /// Hunger gained when an animal eats another animal or a plant.
    pub feed_amount: f32,
    /// Spawn a replacement of the consumed species after a successful feed.
    pub replace_on_consume: bool,
    /// Distance under which a hunting animal touches its target.
    pub contact_radius: f32,
    /// Distance under which an animal counts as arrived and stops.
    pub arrival_epsilon: f32,

    /// Radius of the circle wander spots are drawn from (around the world center).
    pub wander_radius: f32,
    /// Minimum delay before an animal's first wander re-roll.
    pub wander_delay_min: f32,
    /// Minimum interval between wander re-rolls.
    pub wander_interval_min: f32,
    /// Random extra added to both delay and interval, drawn per animal.
    pub wander_jitter: f32,

    /// Growth removed when a plant is grazed.
    pub graze_amount: f32,
    /// Growth never drops below this when grazed.
    pub growth_floor: f32,
    /// Distance from the parent plant at which nuts and seedlings appear.
    pub offspring_radius: f32,

    /// Energy cost of boosting a plant.
    pub plant_boost_cost: u32,
    /// Growth added by a plant boost.
    pub plant_boost_amount: f32,
    /// Energy cost of energizing an animal.
    pub organism_boost_cost: u32,
    /// Hunger added by energizing an animal.
    pub organism_boost_amount: f32,
    /// Energy cost of making a fully grown plant drop a nut.
    pub nut_spawn_cost: u32,
    /// Energy cost of making a fully grown plant seed a new plant.
    pub plant_spawn_cost: u32,

    /// Maximum live animals.
    pub max_animals: usize,
    /// Maximum live plants.
    pub max_plants: usize,
    /// Maximum live nuts.
    pub max_nuts: usize,

    /// Goal tolerance as a fraction of the goal (rounded up, at least 1).
    pub goal_tolerance_ratio: f32,
    /// Consecutive satisfied goal checks needed to win.
    pub goal_required_checks: u32,

    /// Number of recent events kept in the event log.
    pub event_log_size: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            hunger_decay_interval: 5.0,
            rebalance_interval: Some(1.0),
            growth_check_interval: 1.0,
            energy_income_interval: 10.0,
            goal_check_interval: 2.0,
            starting_energy: 100,
            energy_income: 5,
            feed_amount: 5.0,
            replace_on_consume: false,
            contact_radius: 0.3,
            arrival_epsilon: 0.01,
            wander_radius: 10.0,
            wander_delay_min: 0.5,
            wander_interval_min: 4.5,
            wander_jitter: 1.0,
            graze_amount: 2.0,
            growth_floor: 0.5,
            offspring_radius: 0.5,
            plant_boost_cost: 5,
            plant_boost_amount: 1.0,
            organism_boost_cost: 10,
            organism_boost_amount: 5.0,
            nut_spawn_cost: 5,
            plant_spawn_cost: 15,
            max_animals: 500,
            max_plants: 200,
            max_nuts: 200,
            goal_tolerance_ratio: 0.1,
            goal_required_checks: 20,
            event_log_size: 50,
        }
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParams(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParams(format!("{name} must not be negative, got {value}")))
    }
}

impl Params {
    /// Checks bounds, intervals, amounts and capacities.
    pub fn validate(&self) -> Result<()> {
        let b = &self.bounds;
        let finite = [b.min_x, b.max_x, b.min_y, b.max_y].iter().all(|v| v.is_finite());
        if !finite || b.min_x > b.max_x || b.min_y > b.max_y {
            return Err(SimError::InvalidParams(format!(
                "bounds x {}..{} y {}..{} are empty or not finite",
                b.min_x, b.max_x, b.min_y, b.max_y
            )));
        }

        positive("hunger_decay_interval", self.hunger_decay_interval)?;
        positive("growth_check_interval", self.growth_check_interval)?;
        positive("energy_income_interval", self.energy_income_interval)?;
        positive("goal_check_interval", self.goal_check_interval)?;
        if let Some(interval) = self.rebalance_interval {
            positive("rebalance_interval", interval)?;
        }
        positive("wander_interval_min", self.wander_interval_min)?;
        non_negative("wander_delay_min", self.wander_delay_min)?;
        non_negative("wander_jitter", self.wander_jitter)?;
        non_negative("wander_radius", self.wander_radius)?;

        positive("feed_amount", self.feed_amount)?;
        positive("organism_boost_amount", self.organism_boost_amount)?;
        non_negative("plant_boost_amount", self.plant_boost_amount)?;
        non_negative("graze_amount", self.graze_amount)?;
        non_negative("growth_floor", self.growth_floor)?;
        non_negative("contact_radius", self.contact_radius)?;
        non_negative("arrival_epsilon", self.arrival_epsilon)?;
        non_negative("offspring_radius", self.offspring_radius)?;
        non_negative("goal_tolerance_ratio", self.goal_tolerance_ratio)?;

        for (name, cap) in [
            ("max_animals", self.max_animals),
            ("max_plants", self.max_plants),
            ("max_nuts", self.max_nuts),
        ] {
            if cap == 0 {
                return Err(SimError::InvalidParams(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn inverted_bounds_rejected() {
        let params = Params {
            bounds: Bounds {
                min_x: 5.0,
                max_x: -5.0,
                ..Bounds::default()
            },
            ..Params::default()
        };
        assert!(matches!(params.validate(), Err(SimError::InvalidParams(_))));
    }

    #[test]
    fn bad_intervals_and_capacities_rejected() {
        let zero_decay = Params {
            hunger_decay_interval: 0.0,
            ..Params::default()
        };
        let nan_rebalance = Params {
            rebalance_interval: Some(f32::NAN),
            ..Params::default()
        };
        let no_plants = Params {
            max_plants: 0,
            ..Params::default()
        };
        for params in [zero_decay, nan_rebalance, no_plants] {
            assert!(matches!(params.validate(), Err(SimError::InvalidParams(_))));
        }
    }
}
