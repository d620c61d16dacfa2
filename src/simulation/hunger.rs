//! Per-animal hunger.
//!
//! Hunger decays on a fixed schedule and rises by a fixed amount on every
//! feeding event. It has no upper bound. Reaching zero is fatal: the caller
//! must remove the animal from the registry in the same step.

use serde::{Deserialize, Serialize};

use super::level::AnimalTraits;

/// Coarse classification of a hunger value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HungerStatus {
    /// Above the feed threshold; the animal does not look for food.
    Sated,
    /// At or below the feed threshold.
    Hungry,
    /// At or below the starving threshold.
    Starving,
    /// Zero or below. The animal is dead.
    Starved,
}

/// Hunger state of one animal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HungerModel {
    /// Current hunger. Higher is better fed.
    pub hunger: f32,
    /// Hunger lost per decay tick.
    pub decline_rate: f32,
    /// Hunger at or below which the animal hunts.
    pub feed_threshold: f32,
    /// Hunger at or below which the animal is starving.
    pub starving_threshold: f32,
}

impl HungerModel {
    /// Builds the model from species traits.
    pub fn from_traits(traits: &AnimalTraits) -> Self {
        Self {
            hunger: traits.initial_hunger,
            decline_rate: traits.hunger_decline_rate,
            feed_threshold: traits.feed_threshold,
            starving_threshold: traits.starving_threshold,
        }
    }

    /// Decreases hunger by `rate * dt`.
    pub fn tick(&mut self, rate: f32, dt: f32) -> HungerStatus {
        self.hunger -= rate * dt;
        self.status()
    }

    /// One scheduled decay tick at the species' own rate.
    pub fn decay(&mut self) -> HungerStatus {
        self.tick(self.decline_rate, 1.0)
    }

    /// Increases hunger by exactly `amount`.
    pub fn feed(&mut self, amount: f32) -> HungerStatus {
        self.hunger += amount;
        self.status()
    }

    /// Current classification.
    pub fn status(&self) -> HungerStatus {
        if self.hunger <= 0.0 {
            HungerStatus::Starved
        } else if self.hunger <= self.starving_threshold {
            HungerStatus::Starving
        } else if self.hunger <= self.feed_threshold {
            HungerStatus::Hungry
        } else {
            HungerStatus::Sated
        }
    }

    /// Whether the animal should be hunting.
    pub fn wants_food(&self) -> bool {
        self.hunger <= self.feed_threshold
    }

    /// Whether the animal is dead.
    pub fn is_starved(&self) -> bool {
        self.hunger <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(hunger: f32) -> HungerModel {
        HungerModel {
            hunger,
            decline_rate: 2.0,
            feed_threshold: 10.0,
            starving_threshold: 3.0,
        }
    }

    #[test]
    fn tick_scales_with_dt() {
        let mut m = model(8.0);
        m.tick(2.0, 0.5);
        assert!((m.hunger - 7.0).abs() < 1e-6);
        m.decay();
        assert!((m.hunger - 5.0).abs() < 1e-6);
    }

    #[test]
    fn decay_is_strictly_decreasing() {
        let mut m = model(20.0);
        let mut last = m.hunger;
        for _ in 0..5 {
            m.decay();
            assert!(m.hunger < last);
            last = m.hunger;
        }
    }

    #[test]
    fn feed_adds_exact_amount_without_cap() {
        let mut m = model(8.0);
        assert_eq!(m.feed(5.0), HungerStatus::Sated);
        assert!((m.hunger - 13.0).abs() < 1e-6);
        m.feed(1000.0);
        assert!(m.hunger > 1000.0);
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(model(11.0).status(), HungerStatus::Sated);
        assert_eq!(model(10.0).status(), HungerStatus::Hungry);
        assert_eq!(model(3.0).status(), HungerStatus::Starving);
        assert_eq!(model(0.0).status(), HungerStatus::Starved);

        let mut m = model(1.0);
        assert_eq!(m.decay(), HungerStatus::Starved);
        assert!(m.is_starved());
    }
}
