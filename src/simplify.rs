//! Multi-resolution geometry tiers.
//!
//! Each track is pre-simplified into five detail tiers at import time using
//! Douglas-Peucker reduction, so viewport queries can serve geometry sized
//! for the zoom level without touching the full-resolution track. The
//! simplification is display-only: it preserves endpoints but makes no
//! attempt to avoid self-intersections.

use geo::algorithm::simplify::Simplify;
use serde::{Deserialize, Serialize};

use crate::{to_line_string, GpsPoint};

/// A geometry detail tier, ordered from most to least detailed.
///
/// Tolerances step up roughly one order of magnitude per tier, matched to
/// the zoom band each tier serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailTier {
    Full,
    High,
    Mid,
    Low,
    Coarse,
}

impl DetailTier {
    /// All tiers, finest first.
    pub const ALL: [DetailTier; 5] = [
        DetailTier::Full,
        DetailTier::High,
        DetailTier::Mid,
        DetailTier::Low,
        DetailTier::Coarse,
    ];

    /// Douglas-Peucker tolerance in degrees. `Full` is unsimplified.
    pub fn tolerance(&self) -> f64 {
        match self {
            DetailTier::Full => 0.0,
            DetailTier::High => 0.0001,
            DetailTier::Mid => 0.0005,
            DetailTier::Low => 0.001,
            DetailTier::Coarse => 0.002,
        }
    }

    /// Select the tier serving a given map zoom level.
    pub fn for_zoom(zoom: f64) -> Self {
        if zoom >= 15.0 {
            DetailTier::Full
        } else if zoom >= 12.0 {
            DetailTier::High
        } else if zoom >= 9.0 {
            DetailTier::Mid
        } else if zoom >= 6.0 {
            DetailTier::Low
        } else {
            DetailTier::Coarse
        }
    }

    /// Tier name as used in feature properties.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailTier::Full => "full",
            DetailTier::High => "high",
            DetailTier::Mid => "mid",
            DetailTier::Low => "low",
            DetailTier::Coarse => "coarse",
        }
    }
}

/// Simplify a point sequence with the given tolerance (degrees).
///
/// Tolerance 0 returns the input unchanged. Endpoints are always preserved
/// by the Douglas-Peucker reduction.
pub fn simplify_points(points: &[GpsPoint], tolerance: f64) -> Vec<GpsPoint> {
    if tolerance <= 0.0 || points.len() <= 2 {
        return points.to_vec();
    }

    let line = to_line_string(points);
    let simplified = line.simplify(&tolerance);

    simplified.0.iter().map(|c| GpsPoint::new(c.y, c.x)).collect()
}

/// All five detail tiers of one track's geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TieredGeometry {
    pub full: Vec<GpsPoint>,
    pub high: Vec<GpsPoint>,
    pub mid: Vec<GpsPoint>,
    pub low: Vec<GpsPoint>,
    pub coarse: Vec<GpsPoint>,
}

impl TieredGeometry {
    /// Build all tiers from a full-resolution point sequence.
    ///
    /// The caller guarantees at least 2 points; shorter input is rejected
    /// by the track store before it reaches here.
    pub fn from_points(points: &[GpsPoint]) -> Self {
        Self {
            full: points.to_vec(),
            high: simplify_points(points, DetailTier::High.tolerance()),
            mid: simplify_points(points, DetailTier::Mid.tolerance()),
            low: simplify_points(points, DetailTier::Low.tolerance()),
            coarse: simplify_points(points, DetailTier::Coarse.tolerance()),
        }
    }

    /// Get the geometry for a tier.
    pub fn tier(&self, tier: DetailTier) -> &[GpsPoint] {
        match tier {
            DetailTier::Full => &self.full,
            DetailTier::High => &self.high,
            DetailTier::Mid => &self.mid,
            DetailTier::Low => &self.low,
            DetailTier::Coarse => &self.coarse,
        }
    }
}
