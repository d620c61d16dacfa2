//! # Helios - Ecosystem Simulation Core
//!
//! A headless simulation of a small food web: animals that get hungry, hunt
//! prey and flee predators, plants that grow and drop nuts, and a balancer
//! that keeps every species near the population goals of a level.
//!
//! ## Features
//!
//! - Per-animal hunger with feed and starving thresholds
//! - Nearest-prey targeting over k-d trees
//! - Wander / hunt / flee behavior, updated in parallel with rayon
//! - Plant growth, grazing, nuts and seedlings
//! - Population rebalancing with pluggable targets and culling
//! - Energy pool for player actions
//! - Win condition on sustained population goals
//! - JSON level definitions
//!
//! ## Core Modules
//!
//! - [`simulation::ecosystem`] - Main simulation logic
//! - [`simulation::registry`] - Ownership of every live entity
//! - [`simulation::behavior`] - Animal state machine
//! - [`simulation::feeding`] - Consumption rules
//! - [`simulation::population`] - Rebalancing
//! - [`simulation::events`] - Event system for thread-safe updates

/// Core simulation logic and data structures.
pub mod simulation {
    /// Wander / hunt / flee state machine and steering.
    pub mod behavior;
    /// Main ecosystem simulation with parallel updates.
    pub mod ecosystem;
    /// Player energy pool.
    pub mod energy;
    /// Error types.
    pub mod error;
    /// Bounded log of recent events.
    pub mod event_log;
    /// Event system for thread-safe state updates.
    pub mod events;
    /// Validation and application of feeds.
    pub mod feeding;
    /// Geometric utility functions for distance calculations and steering.
    pub mod geometric_utils;
    /// Population goals and the win condition.
    pub mod goals;
    /// Per-animal hunger.
    pub mod hunger;
    /// Static level definitions.
    pub mod level;
    /// Trait for locatable entities that can be updated.
    ///
    /// The [`locatable::Locatable`] trait is implemented by all entities that have
    /// a position in 2D space and can be updated over time (Organism, Plant, Nut).
    pub mod locatable;
    /// Nuts dropped by plants.
    pub mod nut;
    /// Animal state.
    pub mod organism;
    /// Simulation parameters.
    pub mod params;
    /// Plants and their growth model.
    pub mod plant;
    /// Population rebalancing strategies.
    pub mod population;
    /// Entity storage.
    pub mod registry;
    /// Periodic tasks.
    pub mod scheduler;
    /// K-d tree snapshot for neighbor queries.
    pub mod spatial;
    /// Species ids and the food web.
    pub mod species;
    /// Nearest-prey target selection.
    pub mod targeting;
}
