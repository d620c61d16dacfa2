//! Spatial indexing for efficient neighbor queries.
//!
//! The index is a snapshot: it copies id, species and position of every live
//! entity at build time and keeps one KD-tree per entity kind. Animals read
//! it during the parallel behavior phase while their own state is mutated.

use std::collections::HashMap;

use kdtree::distance::squared_euclidean;
use kdtree::{ErrorKind as KdTreeError, KdTree};
use ndarray::Array1;

use super::locatable::Locatable;
use super::registry::{EntityId, OrganismRegistry};
use super::species::{SpeciesId, SpeciesKind};

/// Type alias for 2D spatial KD-tree used for efficient neighbor queries.
pub type Tree2D = KdTree<f32, usize, Vec<f32>>;

/// Points per KD-tree leaf before it splits.
const BUCKET_SIZE: usize = 16;

/// Frozen copy of one entity.
#[derive(Debug, Clone)]
pub struct Sighting {
    /// Entity id.
    pub id: EntityId,
    /// Entity species.
    pub species: SpeciesId,
    /// Entity kind.
    pub kind: SpeciesKind,
    /// Position at snapshot time.
    pub pos: Array1<f32>,
}

/// Result of a spatial radius query: `(distance, sighting)` pairs.
pub type SpatialQueryResult<'a> = Vec<(f32, &'a Sighting)>;

/// Spatial index containing KD-trees for all entity kinds.
pub struct SpatialIndex {
    sightings: Vec<Sighting>,
    by_id: HashMap<EntityId, usize>,
    animals: Tree2D,
    plants: Tree2D,
    nuts: Tree2D,
}

impl SpatialIndex {
    /// Builds a spatial index from the current registry.
    ///
    /// # Returns
    ///
    /// The index, or an error if a position is not finite.
    pub fn build(registry: &OrganismRegistry) -> Result<Self, KdTreeError> {
        let mut sightings = Vec::with_capacity(registry.len());
        let animals = build_tree(&mut sightings, registry.animals().values(), SpeciesKind::Animal)?;
        let plants = build_tree(&mut sightings, registry.plants().values(), SpeciesKind::Plant)?;
        let nuts = build_tree(&mut sightings, registry.nuts().values(), SpeciesKind::Nut)?;

        let by_id = sightings
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();

        Ok(Self {
            sightings,
            by_id,
            animals,
            plants,
            nuts,
        })
    }

    fn tree(&self, kind: SpeciesKind) -> &Tree2D {
        match kind {
            SpeciesKind::Animal => &self.animals,
            SpeciesKind::Plant => &self.plants,
            SpeciesKind::Nut => &self.nuts,
        }
    }

    /// Snapshot of an entity, if it was alive at build time.
    pub fn get(&self, id: EntityId) -> Option<&Sighting> {
        self.by_id.get(&id).map(|&i| &self.sightings[i])
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.sightings.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.sightings.is_empty()
    }

    /// Entities of `kind` within `radius` of `pos`, nearest first.
    pub fn query(&self, kind: SpeciesKind, pos: &Array1<f32>, radius: f32) -> SpatialQueryResult<'_> {
        self.tree(kind)
            .within(&pos.to_vec(), radius.powi(2), &squared_euclidean)
            .unwrap_or_default()
            .into_iter()
            .map(|(dist_sq, &idx)| (dist_sq.sqrt(), &self.sightings[idx]))
            .collect()
    }

    /// Nearest entity of `kind` accepted by `accept`.
    ///
    /// Equal distances are broken by lowest entity id.
    pub fn nearest_matching(
        &self,
        kind: SpeciesKind,
        pos: &Array1<f32>,
        accept: impl Fn(&Sighting) -> bool,
    ) -> Option<(f32, &Sighting)> {
        let point = pos.to_vec();
        let iter = self.tree(kind).iter_nearest(&point, &squared_euclidean).ok()?;

        let mut best: Option<(f32, &Sighting)> = None;
        for (dist_sq, &idx) in iter {
            if let Some((best_sq, _)) = best {
                if dist_sq > best_sq {
                    break;
                }
            }
            let sighting = &self.sightings[idx];
            if !accept(sighting) {
                continue;
            }
            best = match best {
                Some((best_sq, current)) if current.id <= sighting.id => Some((best_sq, current)),
                _ => Some((dist_sq, sighting)),
            };
        }
        best.map(|(dist_sq, s)| (dist_sq.sqrt(), s))
    }
}

fn build_tree<'a, T: Locatable + 'a>(
    sightings: &mut Vec<Sighting>,
    items: impl Iterator<Item = &'a T>,
    kind: SpeciesKind,
) -> Result<Tree2D, KdTreeError> {
    let mut tree = KdTree::with_capacity(2, BUCKET_SIZE);
    for item in items {
        let idx = sightings.len();
        tree.add(item.pos().to_vec(), idx)?;
        sightings.push(Sighting {
            id: item.id(),
            species: item.species(),
            kind,
            pos: item.pos().clone(),
        });
    }
    Ok(tree)
}
