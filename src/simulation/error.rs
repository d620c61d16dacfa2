//! Error taxonomy for ecosystem requests.
//!
//! Every expected failure (stale handle, rejected feed, empty energy pool,
//! full registry) is a variant here and is returned to the caller instead of
//! panicking. Nothing is retried automatically.

use std::path::PathBuf;

use kdtree::ErrorKind as KdTreeError;
use thiserror::Error;

use super::registry::EntityId;

/// Errors produced by the ecosystem core.
#[derive(Debug, Error)]
pub enum SimError {
    /// A handle does not refer to a live entity (already consumed, starved or never existed).
    #[error("entity {0} is not alive")]
    InvalidReference(EntityId),

    /// The consumed entity is not prey of the consumer.
    #[error("{consumer} cannot eat {consumed}")]
    InvalidFeed {
        /// Species name of the consumer.
        consumer: String,
        /// Species name of the entity it tried to eat.
        consumed: String,
    },

    /// Not enough energy in the pool; nothing was spent.
    #[error("insufficient energy: requested {requested}, available {available}")]
    InsufficientEnergy {
        /// Amount the caller tried to spend.
        requested: u32,
        /// Amount left in the pool.
        available: u32,
    },

    /// A registry collection is at its configured maximum.
    #[error("capacity exceeded: {kind} limit is {limit}")]
    CapacityExceeded {
        /// Entity kind that is full.
        kind: &'static str,
        /// Configured cap.
        limit: usize,
    },

    /// No species with this name exists in the level.
    #[error("unknown species `{0}`")]
    UnknownSpecies(String),

    /// The request needs a different kind of entity (e.g. boosting an animal).
    #[error("entity {id} is not a {expected}")]
    WrongKind {
        /// Offending entity.
        id: EntityId,
        /// Kind the request works on.
        expected: &'static str,
    },

    /// Reproduction was requested on a plant that is not fully grown.
    #[error("plant {0} is not fully grown")]
    NotFullyGrown(EntityId),

    /// A placement position lies outside the world bounds.
    #[error("position ({x}, {y}) is outside the world bounds")]
    OutOfBounds {
        /// Requested x coordinate.
        x: f32,
        /// Requested y coordinate.
        y: f32,
    },

    /// A feed or hunger amount is not a positive finite number.
    #[error("invalid amount {0}")]
    InvalidAmount(f32),

    /// A step length is not a positive finite number.
    #[error("invalid step length {0}")]
    InvalidStep(f32),

    /// The simulation parameters are inconsistent.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The level definition is inconsistent.
    #[error("invalid level: {0}")]
    InvalidLevel(String),

    /// Reading or writing a level file failed.
    #[error("failed to access {path}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A level file is not valid JSON for [`super::level::LevelConfig`].
    #[error("malformed level file")]
    Json(#[from] serde_json::Error),

    /// The spatial index rejected a position (non-finite coordinate).
    #[error("spatial index error: {0:?}")]
    Spatial(KdTreeError),
}

impl From<KdTreeError> for SimError {
    fn from(err: KdTreeError) -> Self {
        SimError::Spatial(err)
    }
}

/// Result alias used throughout the simulation.
pub type Result<T> = std::result::Result<T, SimError>;
