//! Snapshot persistence.
//!
//! The whole track store — tracks with all five tiers, metadata, skip
//! counter, and the id sequence — is written as one MessagePack blob and
//! loaded wholesale at startup. This is a snapshot format, not an append
//! log: saving rewrites the file atomically (temp file then rename) so a
//! crash mid-write never leaves a truncated snapshot behind.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::store::{Track, TrackStore};
use crate::{Error, Result};

/// Bumped when the snapshot layout changes incompatibly.
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    skipped: u64,
    tracks: Vec<Track>,
}

/// Serialize the store to a snapshot file.
pub fn save(store: &TrackStore, path: &Path) -> Result<()> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        skipped: store.skipped(),
        tracks: store.iter().map(|t| (**t).clone()).collect(),
    };

    let bytes = rmp_serde::to_vec(&snapshot)
        .map_err(|e| Error::persistence(format!("encode snapshot: {e}")))?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;

    debug!(
        "saved snapshot: {} tracks, {} bytes",
        snapshot.tracks.len(),
        bytes.len()
    );
    Ok(())
}

/// Load a store from a snapshot file.
pub fn load(path: &Path) -> Result<TrackStore> {
    let bytes = fs::read(path)?;
    let snapshot: Snapshot = rmp_serde::from_slice(&bytes)
        .map_err(|e| Error::persistence(format!("decode snapshot: {e}")))?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(Error::persistence(format!(
            "unsupported snapshot version {}",
            snapshot.version
        )));
    }

    let mut store = TrackStore::new();
    store.set_skipped(snapshot.skipped);
    for track in snapshot.tracks {
        store.insert_existing(track);
    }

    info!("loaded snapshot: {} tracks from {:?}", store.len(), path);
    Ok(store)
}
