//! Chunked delivery for large viewport results.
//!
//! A big viewport at low zoom can match thousands of tracks; buffering all
//! of them into one payload blocks the client until the last candidate is
//! clipped. [`ViewportStream`] instead walks the same candidate list lazily
//! and yields bounded chunks with progress events, so the map can render as
//! results arrive. Dropping the iterator cancels the remaining work: no
//! candidate past the current one is ever processed.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geojson::{Feature, FeatureCollection};
use crate::query::emit_candidate;
use crate::store::Track;
use crate::{Bounds, DetailTier};

/// Default number of features per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// One event in a streamed viewport response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Up to `chunk_size` features, in candidate-processing order.
    Chunk { features: FeatureCollection },
    /// Emitted once per processed candidate; `percent` never decreases.
    Progress {
        processed: usize,
        total: usize,
        percent: f64,
    },
    /// Terminal event, emitted exactly once after all chunks.
    Complete { total_features: usize },
}

impl StreamEvent {
    /// SSE event name for this variant.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Chunk { .. } => "chunk",
            StreamEvent::Progress { .. } => "progress",
            StreamEvent::Complete { .. } => "complete",
        }
    }
}

/// Lazy, finite iterator of [`StreamEvent`]s over a viewport query.
///
/// Built from a snapshot of the candidate tracks taken under the read lock
/// at construction; iteration holds no locks, so streams run concurrently
/// with queries and with each other.
pub struct ViewportStream {
    candidates: Vec<Arc<Track>>,
    viewport: Bounds,
    tier: DetailTier,
    chunk_size: usize,
    next_candidate: usize,
    buffer: Vec<Feature>,
    pending: VecDeque<StreamEvent>,
    emitted_features: usize,
    done: bool,
}

impl ViewportStream {
    /// Create a stream over pre-fetched candidates.
    ///
    /// `candidates` must be in the same order a non-streaming query over the
    /// same viewport would process them.
    pub fn new(
        candidates: Vec<Arc<Track>>,
        viewport: Bounds,
        zoom: f64,
        chunk_size: Option<usize>,
    ) -> Self {
        let chunk_size = chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE).max(1);
        Self {
            candidates,
            viewport,
            tier: DetailTier::for_zoom(zoom),
            chunk_size,
            next_candidate: 0,
            buffer: Vec::with_capacity(chunk_size),
            pending: VecDeque::new(),
            emitted_features: 0,
            done: false,
        }
    }

    /// Number of candidates this stream will process in total.
    pub fn total_candidates(&self) -> usize {
        self.candidates.len()
    }

    fn flush_chunk(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let features = std::mem::take(&mut self.buffer);
        self.emitted_features += features.len();
        self.pending.push_back(StreamEvent::Chunk {
            features: FeatureCollection::new(features),
        });
        self.buffer = Vec::with_capacity(self.chunk_size);
    }

    /// Process one candidate, queueing any events it produces.
    fn step(&mut self) {
        let track = &self.candidates[self.next_candidate];
        self.next_candidate += 1;

        if let Some(feature) = emit_candidate(track, self.tier, &self.viewport) {
            self.buffer.push(feature);
            if self.buffer.len() >= self.chunk_size {
                self.flush_chunk();
            }
        }

        let total = self.candidates.len();
        let processed = self.next_candidate;
        self.pending.push_back(StreamEvent::Progress {
            processed,
            total,
            percent: processed as f64 / total as f64 * 100.0,
        });
    }
}

impl Iterator for ViewportStream {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<StreamEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.done {
                return None;
            }
            if self.next_candidate < self.candidates.len() {
                self.step();
            } else {
                self.flush_chunk();
                self.pending.push_back(StreamEvent::Complete {
                    total_features: self.emitted_features,
                });
                self.done = true;
            }
        }
    }
}
