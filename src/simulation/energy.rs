//! The player's energy pool.

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::{Result, SimError};

/// Single counter spent on player actions. Spending never goes negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyPool {
    amount: u32,
}

impl EnergyPool {
    /// Creates a pool holding `amount`.
    pub fn new(amount: u32) -> Self {
        Self { amount }
    }

    /// Current energy.
    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Whether `cost` can be paid.
    pub fn can_afford(&self, cost: u32) -> bool {
        self.amount >= cost
    }

    /// Spends `cost`, all or nothing.
    ///
    /// # Errors
    ///
    /// [`SimError::InsufficientEnergy`] if the pool holds less than `cost`;
    /// the pool is unchanged.
    pub fn spend(&mut self, cost: u32) -> Result<u32> {
        if !self.can_afford(cost) {
            debug!("energy spend of {cost} refused, pool at {}", self.amount);
            return Err(SimError::InsufficientEnergy {
                requested: cost,
                available: self.amount,
            });
        }
        self.amount -= cost;
        Ok(self.amount)
    }

    /// Adds `gain` to the pool.
    pub fn gain(&mut self, gain: u32) -> u32 {
        self.amount = self.amount.saturating_add(gain);
        self.amount
    }
}
