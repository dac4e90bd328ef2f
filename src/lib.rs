//! # Runmap
//!
//! Spatial query and multi-resolution geometry serving for GPS activity
//! tracks. Imported tracks are held in memory with five pre-simplified
//! detail tiers; an R-tree over track bounding boxes answers viewport
//! queries in sublinear time, and results are delivered as GeoJSON either
//! buffered or as a chunked event stream.
//!
//! ## Architecture
//!
//! - [`store::TrackStore`] — all imported tracks (bounds, tiers, metadata)
//! - [`spatial_index::SpatialIndex`] — R-tree over track bounding boxes
//! - [`query`] — viewport and lasso-polygon queries with clip-or-fast-path
//! - [`cache::ViewportCache`] — LRU memoization of viewport results
//! - [`stream::ViewportStream`] — chunked delivery with progress events
//! - [`service::TrackService`] — owns the above, shared with handlers
//!
//! File-format parsing (GPX/FIT/TCX) is an external collaborator: the import
//! surface consumes already-decoded coordinate sequences plus metadata.
//!
//! ## Quick Start
//!
//! ```rust
//! use runmap::{GpsPoint, TrackInput, TrackMetadata};
//! use runmap::service::TrackService;
//!
//! let service = TrackService::new();
//! let points = vec![
//!     GpsPoint::new(39.41, -77.41),
//!     GpsPoint::new(39.42, -77.40),
//! ];
//! let id = service.upload(TrackInput::new(points, TrackMetadata::default()));
//! assert!(id.is_some());
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Error, Result};

// Douglas-Peucker tier generation
pub mod simplify;
pub use simplify::{DetailTier, TieredGeometry};

// Track storage with metadata
pub mod store;
pub use store::{ActivityType, Track, TrackId, TrackInput, TrackMetadata, TrackStore};

// R-tree over track bounding boxes
pub mod spatial_index;
pub use spatial_index::SpatialIndex;

// GeoJSON output types
pub mod geojson;
pub use geojson::{Feature, FeatureCollection, Geometry};

// Viewport and polygon queries
pub mod query;
pub use query::{query_polygon, query_viewport, PolygonSelection};

// LRU response cache keyed by quantized viewport
pub mod cache;
pub use cache::{ViewportCache, ViewportKey};

// Chunked delivery with progress events
pub mod stream;
pub use stream::{StreamEvent, ViewportStream, DEFAULT_CHUNK_SIZE};

// Owned service object shared with request handlers
pub mod service;
pub use service::{ImportSummary, ServiceStats, TrackService};

// Snapshot persistence (MessagePack blob)
pub mod persistence;

// HTTP surface (axum router + handlers)
pub mod http;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use runmap::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a point from a GeoJSON-ordered `[lon, lat]` pair.
    pub fn from_lon_lat(longitude: f64, latitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Axis-aligned bounding box for a track or viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Compute bounds from GPS points. Returns `None` for an empty slice.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Rectangle overlap test. Touching edges count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_lng <= other.max_lng
            && other.min_lng <= self.max_lng
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    /// True if `other` lies entirely within these bounds (edges inclusive).
    pub fn contains(&self, other: &Bounds) -> bool {
        self.min_lat <= other.min_lat
            && self.max_lat >= other.max_lat
            && self.min_lng <= other.min_lng
            && self.max_lng >= other.max_lng
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Convert to a `geo::Rect` (x = longitude, y = latitude).
    pub fn to_rect(&self) -> geo::Rect<f64> {
        geo::Rect::new(
            geo::Coord {
                x: self.min_lng,
                y: self.min_lat,
            },
            geo::Coord {
                x: self.max_lng,
                y: self.max_lat,
            },
        )
    }
}

/// Convert GPS points to a `geo::LineString` (x = longitude, y = latitude).
pub(crate) fn to_line_string(points: &[GpsPoint]) -> geo::LineString<f64> {
    geo::LineString::new(
        points
            .iter()
            .map(|p| geo::Coord {
                x: p.longitude,
                y: p.latitude,
            })
            .collect(),
    )
}
