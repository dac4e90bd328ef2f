//! Server binary.
//!
//! Loads the snapshot if one exists, builds the service, and serves the
//! API. Configuration comes from the environment:
//!
//! - `RUNMAP_ADDR` — bind address (default `127.0.0.1:8080`)
//! - `RUNMAP_SNAPSHOT` — snapshot path (default `runmap.snapshot`)

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use runmap::service::TrackService;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let addr = std::env::var("RUNMAP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let snapshot = PathBuf::from(
        std::env::var("RUNMAP_SNAPSHOT").unwrap_or_else(|_| "runmap.snapshot".to_string()),
    );

    let service = if snapshot.exists() {
        match TrackService::load_snapshot(&snapshot) {
            Ok(service) => service,
            Err(e) => {
                warn!("failed to load snapshot {:?}: {e}; starting empty", snapshot);
                TrackService::new()
            }
        }
    } else {
        info!("no snapshot at {:?}, starting empty", snapshot);
        TrackService::new()
    };

    runmap::http::serve(Arc::new(service), &addr).await
}
