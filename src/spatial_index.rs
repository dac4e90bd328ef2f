//! Spatial indexing for viewport queries.
//!
//! An R-tree over track bounding boxes answers "which tracks intersect this
//! viewport" in sublinear time. This is the hot path: every map pan or zoom
//! triggers a query, so candidates must come back without a linear scan.

use rstar::{RTree, RTreeObject, AABB};

use crate::{Bounds, TrackId};

/// Track bounds wrapper for R-tree spatial indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackBounds {
    pub track_id: TrackId,
    pub bounds: Bounds,
}

impl RTreeObject for TrackBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_lng, self.bounds.min_lat],
            [self.bounds.max_lng, self.bounds.max_lat],
        )
    }
}

/// R-tree spatial index over track bounding boxes.
///
/// Entries are inserted and removed incrementally as tracks come and go;
/// bulk loading is used when rebuilding from a snapshot.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<TrackBounds>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk-load the index from `(id, bounds)` pairs. Faster than repeated
    /// insertion when rebuilding the whole index at startup.
    pub fn bulk_load(entries: Vec<(TrackId, Bounds)>) -> Self {
        let objects = entries
            .into_iter()
            .map(|(track_id, bounds)| TrackBounds { track_id, bounds })
            .collect();
        Self {
            tree: RTree::bulk_load(objects),
        }
    }

    /// Insert a track's bounds.
    pub fn insert(&mut self, track_id: TrackId, bounds: Bounds) {
        self.tree.insert(TrackBounds { track_id, bounds });
    }

    /// Remove a track's entry. Returns true if it was present.
    pub fn remove(&mut self, track_id: TrackId, bounds: Bounds) -> bool {
        self.tree.remove(&TrackBounds { track_id, bounds }).is_some()
    }

    /// All tracks whose bounds intersect the query bounds.
    ///
    /// Touching edges count as intersecting. No ordering guarantee.
    pub fn query(&self, bounds: &Bounds) -> Vec<TrackId> {
        let envelope = AABB::from_corners(
            [bounds.min_lng, bounds.min_lat],
            [bounds.max_lng, bounds.max_lat],
        );

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.track_id)
            .collect()
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    /// Number of indexed tracks.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
