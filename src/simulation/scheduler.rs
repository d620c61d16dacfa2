//! Periodic timers driven by simulation time.
//!
//! Nothing here sleeps: timers are advanced by `dt` from the main step and
//! report how many times they elapsed. Scheduling a task kind that is already
//! running stops the old timer first, so a task never runs twice per period.

use std::collections::BTreeMap;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Smallest interval a timer accepts.
const MIN_INTERVAL: f32 = 1e-3;

/// A repeating timer with an initial delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Periodic {
    interval: f32,
    remaining: f32,
}

impl Periodic {
    /// Fires every `interval` seconds, first after one full interval.
    pub fn new(interval: f32) -> Self {
        Self::with_delay(interval, interval)
    }

    /// Fires first after `delay` seconds, then every `interval` seconds.
    pub fn with_delay(delay: f32, interval: f32) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            remaining: delay.max(0.0),
        }
    }

    /// Timer with a random phase and interval.
    ///
    /// Delay is `delay_min + U[0, jitter)` and interval is
    /// `interval_min + U[0, jitter)`, drawn once. Giving every animal its own
    /// phase keeps a herd from re-rolling wander spots in lockstep and piling
    /// onto the same point.
    pub fn jittered<R: Rng + ?Sized>(
        rng: &mut R,
        delay_min: f32,
        interval_min: f32,
        jitter: f32,
    ) -> Self {
        let mut draw = || {
            if jitter > 0.0 {
                rng.random_range(0.0..jitter)
            } else {
                0.0
            }
        };
        let delay = delay_min + draw();
        let interval = interval_min + draw();
        Self::with_delay(delay, interval)
    }

    /// Advances the timer. Returns how many times it fired.
    ///
    /// Non-finite or non-positive `dt` leaves the timer untouched.
    pub fn tick(&mut self, dt: f32) -> u32 {
        if !(dt.is_finite() && dt > 0.0) {
            return 0;
        }
        let remaining = f64::from(self.remaining) - f64::from(dt);
        if remaining > 0.0 {
            self.remaining = remaining as f32;
            return 0;
        }

        let interval = f64::from(self.interval);
        let fired = ((-remaining / interval).floor() + 1.0).min(f64::from(u32::MAX));
        self.remaining = (remaining + fired * interval).max(0.0) as f32;
        fired as u32
    }

    /// Repeat interval in seconds.
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Seconds until the next firing.
    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

/// Kinds of recurring ecosystem work, in the order they run within a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Hunger decay for every animal.
    HungerDecay,
    /// Natural plant growth.
    GrowthCheck,
    /// Population rebalancing.
    Rebalance,
    /// Passive energy income.
    EnergyIncome,
    /// Win-condition poll.
    GoalCheck,
}

/// Set of running periodic tasks, at most one per kind.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tasks: BTreeMap<TaskKind, Periodic>,
}

impl Scheduler {
    /// Creates a scheduler with no tasks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `kind` with the given timer, stopping any running one first.
    pub fn schedule(&mut self, kind: TaskKind, timer: Periodic) {
        if self.cancel(kind) {
            debug!("restarting scheduled task {kind:?}");
        }
        self.tasks.insert(kind, timer);
    }

    /// Stops `kind`. Returns `true` if it was running.
    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        self.tasks.remove(&kind).is_some()
    }

    /// Stops every task (level teardown).
    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    /// Whether `kind` is running.
    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.tasks.contains_key(&kind)
    }

    /// Timer of a running task.
    pub fn timer(&self, kind: TaskKind) -> Option<&Periodic> {
        self.tasks.get(&kind)
    }

    /// Advances all timers by `dt`.
    ///
    /// # Returns
    ///
    /// Tasks that fired, in [`TaskKind`] order, with their firing counts.
    pub fn advance(&mut self, dt: f32) -> Vec<(TaskKind, u32)> {
        self.tasks
            .iter_mut()
            .filter_map(|(kind, timer)| {
                let fired = timer.tick(dt);
                (fired > 0).then_some((*kind, fired))
            })
            .collect()
    }
}
