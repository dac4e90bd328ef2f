//! GeoJSON output types.
//!
//! Just the subset the serving layer emits: line geometries wrapped in
//! features with track properties. Coordinates follow GeoJSON order,
//! `[longitude, latitude]`.

use serde::{Deserialize, Serialize};

use crate::store::{Track, TrackMetadata};
use crate::{DetailTier, GpsPoint, TrackId};

/// A GeoJSON geometry. Clipping a line against a viewport can split it,
/// which is the only place `MultiLineString` appears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    LineString(Vec<[f64; 2]>),
    MultiLineString(Vec<Vec<[f64; 2]>>),
}

impl Geometry {
    /// Build a `LineString` from GPS points.
    pub fn line_from_points(points: &[GpsPoint]) -> Self {
        Geometry::LineString(points.iter().map(|p| [p.longitude, p.latitude]).collect())
    }

    /// Total number of coordinates across all parts.
    pub fn coord_count(&self) -> usize {
        match self {
            Geometry::LineString(coords) => coords.len(),
            Geometry::MultiLineString(lines) => lines.iter().map(|l| l.len()).sum(),
        }
    }
}

/// Properties attached to every emitted feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureProperties {
    pub id: TrackId,
    pub tier: String,
    pub activity_type: String,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    pub source_file: String,
}

impl FeatureProperties {
    pub fn from_track(id: TrackId, metadata: &TrackMetadata, tier: DetailTier) -> Self {
        Self {
            id,
            tier: tier.as_str().to_string(),
            activity_type: metadata.activity_type.as_str().to_string(),
            distance_meters: metadata.distance_meters,
            duration_seconds: metadata.duration_seconds,
            start_time: metadata.start_time.map(|t| t.to_rfc3339()),
            source_file: metadata.source_file.clone(),
        }
    }
}

/// A GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: String,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: FeatureProperties) -> Self {
        Self {
            feature_type: "Feature".to_string(),
            geometry,
            properties,
        }
    }

    /// Feature for a track's geometry at a tier, unclipped.
    pub fn from_track(track: &Track, tier: DetailTier) -> Self {
        Self::new(
            Geometry::line_from_points(track.geometry.tier(tier)),
            FeatureProperties::from_track(track.id, &track.metadata, tier),
        )
    }
}

/// A GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub collection_type: String,
    pub features: Vec<Feature>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            collection_type: "FeatureCollection".to_string(),
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
