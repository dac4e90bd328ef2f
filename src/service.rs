//! The owned service object.
//!
//! [`TrackService`] holds the track store, spatial index, and response
//! cache behind one handle that is constructed at startup and shared with
//! request handlers via `Arc`. There is no global singleton: the process
//! owns exactly one dataset and passes it around explicitly.
//!
//! ## Locking discipline
//!
//! Store and index live under a single `RwLock` so no query can observe a
//! half-inserted track. Queries take the read lock; mutations (bulk import,
//! single upload, delete) take the write lock, keep store and index
//! consistent within one critical section, and bump the dataset generation
//! before releasing it. The response cache keys include that generation, so
//! an entry written by a reader that raced a mutation is keyed under the old
//! generation and can never be served against the new data. The cache is
//! also cleared after each mutation since entries for dead generations are
//! pure ballast.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use log::info;
use serde::Serialize;

use crate::cache::{ViewportCache, ViewportKey, DEFAULT_CACHE_CAPACITY};
use crate::geojson::FeatureCollection;
use crate::query::{self, PolygonSelection};
use crate::store::{TrackInput, TrackStore};
use crate::stream::ViewportStream;
use crate::{Bounds, Error, GpsPoint, Result, SpatialIndex, TrackId};

/// Store and index, always mutated together.
#[derive(Debug, Default)]
struct DataSet {
    store: TrackStore,
    index: SpatialIndex,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Service counters for the stats endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub tracks: usize,
    pub skipped: u64,
    pub cache_entries: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub generation: u64,
}

/// Owns the in-memory dataset and serves all query and mutation paths.
pub struct TrackService {
    data: RwLock<DataSet>,
    cache: Mutex<ViewportCache>,
    generation: AtomicU64,
}

impl Default for TrackService {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackService {
    /// Create an empty service with the default cache capacity.
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Create an empty service with an explicit cache capacity.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            data: RwLock::new(DataSet::default()),
            cache: Mutex::new(ViewportCache::new(capacity)),
            generation: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a batch of parsed tracks. Inputs with fewer than 2 points are
    /// counted as skipped.
    pub fn import_many(&self, inputs: Vec<TrackInput>) -> ImportSummary {
        let mut data = self.data.write().unwrap();
        let mut imported = 0;
        let mut skipped = 0;

        for input in inputs {
            match data.store.insert(input) {
                Some(id) => {
                    let bounds = data.store.get(id).map(|t| t.bounds);
                    if let Some(bounds) = bounds {
                        data.index.insert(id, bounds);
                    }
                    imported += 1;
                }
                None => skipped += 1,
            }
        }

        self.finish_mutation(data);
        info!("imported {} tracks, skipped {}", imported, skipped);
        ImportSummary { imported, skipped }
    }

    /// Replace the whole dataset with a fresh import. Ids continue the
    /// existing sequence rather than restarting at 1.
    pub fn replace_all(&self, inputs: Vec<TrackInput>) -> ImportSummary {
        let mut data = self.data.write().unwrap();
        data.store.clear();
        data.index.clear();

        let mut imported = 0;
        let mut skipped = 0;
        for input in inputs {
            match data.store.insert(input) {
                Some(id) => {
                    let bounds = data.store.get(id).map(|t| t.bounds);
                    if let Some(bounds) = bounds {
                        data.index.insert(id, bounds);
                    }
                    imported += 1;
                }
                None => skipped += 1,
            }
        }

        self.finish_mutation(data);
        info!("rebuilt store: {} tracks, skipped {}", imported, skipped);
        ImportSummary { imported, skipped }
    }

    /// Upload a single track. It is queryable as soon as this returns;
    /// returns `None` for inputs with fewer than 2 points.
    pub fn upload(&self, input: TrackInput) -> Option<TrackId> {
        let mut data = self.data.write().unwrap();
        let id = data.store.insert(input)?;
        if let Some(track) = data.store.get(id) {
            data.index.insert(id, track.bounds);
        }

        self.finish_mutation(data);
        Some(id)
    }

    /// Delete a track. Returns false when the id is unknown.
    pub fn remove(&self, id: TrackId) -> bool {
        let mut data = self.data.write().unwrap();
        let removed = match data.store.remove(id) {
            Some(track) => {
                data.index.remove(id, track.bounds);
                true
            }
            None => false,
        };

        if removed {
            self.finish_mutation(data);
        }
        removed
    }

    /// Bump the generation while still holding the write lock, then clear
    /// the cache after the new data is visible.
    fn finish_mutation(&self, data: std::sync::RwLockWriteGuard<'_, DataSet>) {
        self.generation.fetch_add(1, Ordering::Release);
        drop(data);
        self.cache.lock().unwrap().clear();
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Viewport query, answered from the cache when possible.
    pub fn query_viewport(&self, viewport: &Bounds, zoom: f64) -> Result<FeatureCollection> {
        validate_viewport(viewport, zoom)?;

        // A stale generation read here only produces a key that misses.
        let key = ViewportKey::new(viewport, zoom, self.generation.load(Ordering::Acquire));
        if let Some(hit) = self.cache.lock().unwrap().get(&key) {
            return Ok(hit);
        }

        let (result, generation) = {
            let data = self.data.read().unwrap();
            // Read the generation under the lock to bind it to this data.
            let generation = self.generation.load(Ordering::Acquire);
            let result = query::query_viewport(&data.store, &data.index, viewport, zoom, None);
            (result, generation)
        };

        let key = ViewportKey::new(viewport, zoom, generation);
        self.cache.lock().unwrap().insert(key, result.clone());
        Ok(result)
    }

    /// Viewport query restricted to a set of track ids. Bypasses the cache;
    /// unknown ids are silently excluded.
    pub fn query_viewport_filtered(
        &self,
        viewport: &Bounds,
        zoom: f64,
        filter: &HashSet<TrackId>,
    ) -> Result<FeatureCollection> {
        validate_viewport(viewport, zoom)?;
        let data = self.data.read().unwrap();
        Ok(query::query_viewport(
            &data.store,
            &data.index,
            viewport,
            zoom,
            Some(filter),
        ))
    }

    /// Lasso-polygon query over full-resolution geometry.
    pub fn query_polygon(&self, vertices: &[GpsPoint]) -> Result<Vec<PolygonSelection>> {
        let data = self.data.read().unwrap();
        query::query_polygon(&data.store, &data.index, vertices)
    }

    /// Build a streaming viewport query.
    ///
    /// Candidates are snapshotted under the read lock; the returned iterator
    /// holds no locks, so dropping it mid-stream cancels remaining work
    /// without affecting other requests.
    pub fn stream_viewport(
        &self,
        viewport: &Bounds,
        zoom: f64,
        chunk_size: Option<usize>,
        filter: Option<&HashSet<TrackId>>,
    ) -> Result<ViewportStream> {
        validate_viewport(viewport, zoom)?;
        let candidates = {
            let data = self.data.read().unwrap();
            query::candidate_tracks(&data.store, &data.index, viewport, filter)
        };
        Ok(ViewportStream::new(candidates, *viewport, zoom, chunk_size))
    }

    /// Current service counters.
    pub fn stats(&self) -> ServiceStats {
        let data = self.data.read().unwrap();
        let cache = self.cache.lock().unwrap();
        ServiceStats {
            tracks: data.store.len(),
            skipped: data.store.skipped(),
            cache_entries: cache.len(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
            generation: self.generation.load(Ordering::Acquire),
        }
    }

    /// Number of stored tracks.
    pub fn len(&self) -> usize {
        self.data.read().unwrap().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().unwrap().store.is_empty()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write the whole store to a snapshot file.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let data = self.data.read().unwrap();
        crate::persistence::save(&data.store, path)
    }

    /// Load a service from a snapshot file. The spatial index is rebuilt
    /// from the restored bounds via bulk load.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let store = crate::persistence::load(path)?;
        let entries = store.iter().map(|t| (t.id, t.bounds)).collect();
        let service = Self::new();
        {
            let mut data = service.data.write().unwrap();
            data.store = store;
            data.index = SpatialIndex::bulk_load(entries);
        }
        info!("loaded snapshot: {} tracks", service.len());
        Ok(service)
    }
}

/// Reject non-finite or inverted viewport parameters before any work.
fn validate_viewport(viewport: &Bounds, zoom: f64) -> Result<()> {
    let coords = [
        viewport.min_lat,
        viewport.max_lat,
        viewport.min_lng,
        viewport.max_lng,
    ];
    if coords.iter().any(|c| !c.is_finite()) || !zoom.is_finite() {
        return Err(Error::invalid_viewport("coordinates must be finite"));
    }
    if viewport.min_lat > viewport.max_lat || viewport.min_lng > viewport.max_lng {
        return Err(Error::invalid_viewport("min must not exceed max"));
    }
    Ok(())
}
