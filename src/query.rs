//! Viewport and polygon queries.
//!
//! A viewport query asks: which tracks intersect this bounding box, at the
//! detail tier matching this zoom, clipped to the box when only partially
//! inside. Tracks whose bounds sit entirely within the viewport take the
//! fast path and skip clipping, which is a no-op for them.
//!
//! A polygon query is the lasso selection: a true geometric intersects test
//! of the full-resolution geometry against a user-drawn polygon. It runs
//! once per user action rather than per frame, so correctness wins over
//! speed and no clipping is applied — the UI wants the whole track.

use std::collections::HashSet;
use std::sync::Arc;

use geo::{Area, BooleanOps, Intersects, MultiLineString};
use serde::{Deserialize, Serialize};

use crate::geojson::{Feature, FeatureCollection, FeatureProperties, Geometry};
use crate::store::{Track, TrackMetadata, TrackStore};
use crate::{to_line_string, Bounds, DetailTier, Error, GpsPoint, Result, SpatialIndex, TrackId};

/// One track matched by a polygon query: full-resolution geometry plus
/// complete metadata, never clipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonSelection {
    pub id: TrackId,
    pub geometry: Geometry,
    pub metadata: TrackMetadata,
}

/// Candidate tracks for a viewport, in id order, with the optional caller
/// filter applied. Unknown filter ids simply match nothing.
pub fn candidate_tracks(
    store: &TrackStore,
    index: &SpatialIndex,
    viewport: &Bounds,
    filter: Option<&HashSet<TrackId>>,
) -> Vec<Arc<Track>> {
    let mut ids = index.query(viewport);
    ids.sort_unstable();

    ids.into_iter()
        .filter(|id| filter.map_or(true, |allowed| allowed.contains(id)))
        .filter_map(|id| store.get(id))
        .collect()
}

/// Emit one candidate for a viewport, or `None` when the clipped geometry
/// is empty.
///
/// Fully-contained tracks return the tier geometry unmodified; for them
/// clipping would reproduce the same line at the cost of a boolean op.
pub fn emit_candidate(track: &Track, tier: DetailTier, viewport: &Bounds) -> Option<Feature> {
    let points = track.geometry.tier(tier);

    let geometry = if viewport.contains(&track.bounds) {
        Geometry::line_from_points(points)
    } else {
        clip_to_viewport(points, viewport)?
    };

    Some(Feature::new(
        geometry,
        FeatureProperties::from_track(track.id, &track.metadata, tier),
    ))
}

/// Clip a line to a rectangular viewport.
///
/// Returns `None` when nothing of the line falls inside the rectangle; a
/// line split by the rectangle comes back as a `MultiLineString`.
pub fn clip_to_viewport(points: &[GpsPoint], viewport: &Bounds) -> Option<Geometry> {
    let line = MultiLineString::new(vec![to_line_string(points)]);
    let rect = viewport.to_rect().to_polygon();

    let clipped = rect.clip(&line, false);

    let mut parts: Vec<Vec<[f64; 2]>> = clipped
        .0
        .into_iter()
        .filter(|segment| segment.0.len() >= 2)
        .map(|segment| segment.0.into_iter().map(|c| [c.x, c.y]).collect())
        .collect();

    match parts.len() {
        0 => None,
        1 => Some(Geometry::LineString(parts.pop().unwrap())),
        _ => Some(Geometry::MultiLineString(parts)),
    }
}

/// Run a viewport query: tier by zoom, R-tree candidates, clip-or-fast-path
/// per candidate, features assembled in candidate order.
pub fn query_viewport(
    store: &TrackStore,
    index: &SpatialIndex,
    viewport: &Bounds,
    zoom: f64,
    filter: Option<&HashSet<TrackId>>,
) -> FeatureCollection {
    let tier = DetailTier::for_zoom(zoom);
    let features = candidate_tracks(store, index, viewport, filter)
        .iter()
        .filter_map(|track| emit_candidate(track, tier, viewport))
        .collect();

    FeatureCollection::new(features)
}

/// Validate a lasso polygon and close it if the caller left it open.
///
/// Requires at least 3 distinct vertices and a non-degenerate (non-zero
/// area) ring after closing.
pub fn validate_polygon(vertices: &[GpsPoint]) -> Result<geo::Polygon<f64>> {
    let mut ring: Vec<GpsPoint> = vertices.to_vec();

    // Auto-close: drop an explicit closing vertex, we re-close below
    if ring.len() >= 2 && ring.first() == ring.last() {
        ring.pop();
    }

    let mut distinct: Vec<GpsPoint> = Vec::with_capacity(ring.len());
    for p in &ring {
        if !p.is_valid() {
            return Err(Error::invalid_polygon(format!(
                "vertex ({}, {}) is not a valid coordinate",
                p.longitude, p.latitude
            )));
        }
        if !distinct.contains(p) {
            distinct.push(*p);
        }
    }

    if distinct.len() < 3 {
        return Err(Error::invalid_polygon(format!(
            "{} distinct vertices, at least 3 required",
            distinct.len()
        )));
    }

    let polygon = geo::Polygon::new(to_line_string(&ring), vec![]);
    if polygon.unsigned_area() == 0.0 {
        return Err(Error::invalid_polygon("polygon has zero area"));
    }

    Ok(polygon)
}

/// Run a lasso-polygon query.
///
/// Candidates come from the R-tree via the polygon's bounding box, then each
/// candidate's full-resolution geometry is tested with a true geometric
/// intersects check. Matches are returned whole, in id order.
pub fn query_polygon(
    store: &TrackStore,
    index: &SpatialIndex,
    vertices: &[GpsPoint],
) -> Result<Vec<PolygonSelection>> {
    let polygon = validate_polygon(vertices)?;

    let polygon_bounds = Bounds::from_points(vertices)
        .ok_or_else(|| Error::invalid_polygon("empty polygon"))?;

    let selections = candidate_tracks(store, index, &polygon_bounds, None)
        .iter()
        .filter(|track| {
            let line = to_line_string(&track.geometry.full);
            polygon.intersects(&line)
        })
        .map(|track| PolygonSelection {
            id: track.id,
            geometry: Geometry::line_from_points(&track.geometry.full),
            metadata: track.metadata.clone(),
        })
        .collect();

    Ok(selections)
}
