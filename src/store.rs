//! Track storage.
//!
//! Holds every imported track as an immutable [`Track`] with its bounding
//! box, five geometry tiers, and metadata. Ids are assigned sequentially at
//! import time and never reused within a session, so a deleted track's id
//! stays dead. Inputs with fewer than two points are skipped, not stored.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::simplify::TieredGeometry;
use crate::{Bounds, GpsPoint};

/// Stable identifier for an imported track.
pub type TrackId = u64;

/// Normalized activity category.
///
/// Raw sport tags from GPS files are free text; this collapses them into a
/// closed set via keyword matching, defaulting to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Run,
    Bike,
    Walk,
    Hike,
    #[default]
    Other,
}

impl ActivityType {
    /// Normalize a raw free-text sport tag.
    pub fn from_raw(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("run") || lower.contains("jog") {
            ActivityType::Run
        } else if lower.contains("bike") || lower.contains("ride") || lower.contains("cycl") {
            ActivityType::Bike
        } else if lower.contains("hik") || lower.contains("trek") {
            ActivityType::Hike
        } else if lower.contains("walk") {
            ActivityType::Walk
        } else {
            ActivityType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Run => "run",
            ActivityType::Bike => "bike",
            ActivityType::Walk => "walk",
            ActivityType::Hike => "hike",
            ActivityType::Other => "other",
        }
    }
}

/// Metadata carried alongside a track's geometry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub activity_type: ActivityType,
    pub activity_raw: Option<String>,
    pub source_file: String,
}

impl TrackMetadata {
    /// Build metadata from an external parser's output, normalizing the
    /// raw sport tag.
    pub fn from_parsed(
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        distance_meters: f64,
        duration_seconds: f64,
        activity_raw: Option<String>,
        source_file: String,
    ) -> Self {
        let activity_type = activity_raw
            .as_deref()
            .map(ActivityType::from_raw)
            .unwrap_or_default();
        Self {
            start_time,
            end_time,
            distance_meters,
            duration_seconds,
            activity_type,
            activity_raw,
            source_file,
        }
    }
}

/// One parsed artifact handed over by the import collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInput {
    pub points: Vec<GpsPoint>,
    pub metadata: TrackMetadata,
}

impl TrackInput {
    pub fn new(points: Vec<GpsPoint>, metadata: TrackMetadata) -> Self {
        Self { points, metadata }
    }
}

/// An imported GPS activity. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub bounds: Bounds,
    pub geometry: TieredGeometry,
    pub metadata: TrackMetadata,
}

/// In-memory collection of all imported tracks.
///
/// Tracks are stored behind `Arc` so queries and streams can hold cheap
/// clones without keeping the store locked.
#[derive(Debug)]
pub struct TrackStore {
    tracks: HashMap<TrackId, Arc<Track>>,
    next_id: TrackId,
    skipped: u64,
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackStore {
    /// Create a new empty track store.
    pub fn new() -> Self {
        Self {
            tracks: HashMap::new(),
            next_id: 1,
            skipped: 0,
        }
    }

    /// Insert a track from parsed input.
    ///
    /// Returns `None` and increments the skip counter when the input has
    /// fewer than 2 points. Otherwise computes bounds from the full point
    /// sequence, builds all five tiers, and assigns the next sequential id.
    pub fn insert(&mut self, input: TrackInput) -> Option<TrackId> {
        if input.points.len() < 2 {
            self.skipped += 1;
            debug!(
                "skipping '{}': {} points",
                input.metadata.source_file,
                input.points.len()
            );
            return None;
        }

        // from_points only fails on empty input, excluded above
        let bounds = Bounds::from_points(&input.points)?;
        let geometry = TieredGeometry::from_points(&input.points);

        let id = self.next_id;
        self.next_id += 1;

        self.tracks.insert(
            id,
            Arc::new(Track {
                id,
                bounds,
                geometry,
                metadata: input.metadata,
            }),
        );
        Some(id)
    }

    /// Re-insert a previously stored track, e.g. when loading a snapshot.
    /// Keeps `next_id` ahead of every stored id.
    pub fn insert_existing(&mut self, track: Track) {
        if track.id >= self.next_id {
            self.next_id = track.id + 1;
        }
        self.tracks.insert(track.id, Arc::new(track));
    }

    /// Get a track by id.
    pub fn get(&self, id: TrackId) -> Option<Arc<Track>> {
        self.tracks.get(&id).cloned()
    }

    /// Check if a track exists.
    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    /// Remove a track by id, returning it if it existed.
    pub fn remove(&mut self, id: TrackId) -> Option<Arc<Track>> {
        self.tracks.remove(&id)
    }

    /// All track ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.keys().copied()
    }

    /// All tracks, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.values()
    }

    /// Clear all tracks. Ids are not reset; a bulk re-import continues the
    /// sequence rather than reusing ids from the cleared generation.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Number of stored tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of inputs rejected for having fewer than 2 points.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Restore the skip counter from a snapshot.
    pub(crate) fn set_skipped(&mut self, skipped: u64) {
        self.skipped = skipped;
    }

    /// Highest id handed out so far, or 0 for a fresh store.
    pub fn last_id(&self) -> TrackId {
        self.next_id - 1
    }
}
