//! Response cache for viewport queries.
//!
//! Repeated pans over the same area hammer the query path with viewports
//! that differ only by floating-point jitter. Keys quantize each coordinate
//! to 3 decimal places (roughly 100m) so those near-identical requests hit
//! the same entry. Any track store mutation bumps a dataset generation that
//! is part of the key, so a reader that raced a mutation can never poison
//! the cache for the new data; the cache is also cleared outright on
//! mutation since writes are rare.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::geojson::FeatureCollection;
use crate::Bounds;

/// Default capacity of the viewport cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 2048;

/// Quantization factor: 3 decimal places of a degree.
const QUANT: f64 = 1000.0;

/// Cache key: viewport coordinates in quantized milli-degrees, zoom in
/// centi-units, plus the dataset generation the entry was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportKey {
    min_lat: i64,
    max_lat: i64,
    min_lng: i64,
    max_lng: i64,
    zoom: i64,
    generation: u64,
}

impl ViewportKey {
    pub fn new(viewport: &Bounds, zoom: f64, generation: u64) -> Self {
        Self {
            min_lat: quantize(viewport.min_lat),
            max_lat: quantize(viewport.max_lat),
            min_lng: quantize(viewport.min_lng),
            max_lng: quantize(viewport.max_lng),
            zoom: (zoom * 100.0).round() as i64,
            generation,
        }
    }
}

fn quantize(degrees: f64) -> i64 {
    (degrees * QUANT).round() as i64
}

/// LRU cache of viewport query results.
pub struct ViewportCache {
    entries: LruCache<ViewportKey, FeatureCollection>,
    hits: u64,
    misses: u64,
}

impl Default for ViewportCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ViewportCache {
    /// Create a cache with the given capacity (entries, not bytes).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(
                NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN),
            ),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a key, counting the hit or miss.
    pub fn get(&mut self, key: &ViewportKey) -> Option<FeatureCollection> {
        match self.entries.get(key) {
            Some(cached) => {
                self.hits += 1;
                Some(cached.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert a computed value.
    pub fn insert(&mut self, key: ViewportKey, value: FeatureCollection) {
        self.entries.put(key, value);
    }

    /// Look up a key, or compute and insert the value on a miss.
    pub fn get_or_compute<F>(&mut self, key: ViewportKey, compute: F) -> FeatureCollection
    where
        F: FnOnce() -> FeatureCollection,
    {
        if let Some(cached) = self.get(&key) {
            return cached;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    /// Drop every entry. Called on any track store mutation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
