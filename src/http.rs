//! HTTP surface.
//!
//! Thin axum routing over the service object; all payload contracts live
//! here, all query semantics live in [`crate::service`] and below.
//!
//! - `GET /api/runs` — buffered viewport query, GeoJSON FeatureCollection
//! - `GET /api/stream_runs` — SSE stream of `chunk`/`progress`/`complete`
//! - `POST /api/runs_in_area` — lasso-polygon selection
//! - `POST /api/upload` — single parsed track, immediately queryable
//! - `DELETE /api/runs/{id}` — remove one track
//! - `GET /api/stats` — service counters

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures::Stream;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

use crate::service::TrackService;
use crate::store::{TrackInput, TrackMetadata};
use crate::stream::StreamEvent;
use crate::{Bounds, Error, GpsPoint, TrackId};

/// Build the API router around a shared service handle.
pub fn router(service: Arc<TrackService>) -> Router {
    Router::new()
        .route("/api/runs", get(runs))
        .route("/api/stream_runs", get(stream_runs))
        .route("/api/runs_in_area", post(runs_in_area))
        .route("/api/upload", post(upload))
        .route("/api/runs/:id", delete(remove_run))
        .route("/api/stats", get(stats))
        .with_state(service)
}

/// Bind and serve the API until the process exits.
pub async fn serve(service: Arc<TrackService>, addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("runmap server listening on {addr}");
    axum::serve(listener, router(service)).await
}

// ============================================================================
// Error mapping
// ============================================================================

/// Wrapper turning [`Error`] into a JSON `{error}` response with the right
/// status: 4xx for input validation, 500 for everything else.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!("request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct ViewportParams {
    #[serde(rename = "minLat")]
    min_lat: f64,
    #[serde(rename = "minLng")]
    min_lng: f64,
    #[serde(rename = "maxLat")]
    max_lat: f64,
    #[serde(rename = "maxLng")]
    max_lng: f64,
    zoom: f64,
}

impl ViewportParams {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.min_lat, self.max_lat, self.min_lng, self.max_lng)
    }
}

async fn runs(
    State(service): State<Arc<TrackService>>,
    Query(params): Query<ViewportParams>,
) -> Result<Response, ApiError> {
    let collection = service.query_viewport(&params.bounds(), params.zoom)?;
    Ok(Json(collection).into_response())
}

#[derive(Debug, Deserialize)]
struct StreamParams {
    #[serde(rename = "minLat")]
    min_lat: f64,
    #[serde(rename = "minLng")]
    min_lng: f64,
    #[serde(rename = "maxLat")]
    max_lat: f64,
    #[serde(rename = "maxLng")]
    max_lng: f64,
    zoom: f64,
    chunk_size: Option<usize>,
    /// Comma-separated track ids to restrict results to.
    filter_runs: Option<String>,
}

impl StreamParams {
    fn bounds(&self) -> Bounds {
        Bounds::new(self.min_lat, self.max_lat, self.min_lng, self.max_lng)
    }
}

fn parse_filter(raw: &str) -> HashSet<TrackId> {
    raw.split(',')
        .filter_map(|token| token.trim().parse::<TrackId>().ok())
        .collect()
}

async fn stream_runs(
    State(service): State<Arc<TrackService>>,
    Query(params): Query<StreamParams>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>, ApiError> {
    let filter = params.filter_runs.as_deref().map(parse_filter);
    let stream = service.stream_viewport(
        &params.bounds(),
        params.zoom,
        params.chunk_size,
        filter.as_ref(),
    )?;

    // Dropping this stream on client disconnect stops candidate processing
    // at the next event boundary.
    let events = futures::stream::iter(stream.map(|event| Ok(to_sse_event(event))));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: StreamEvent) -> Event {
    let base = Event::default().event(event.name());
    let data = match &event {
        StreamEvent::Chunk { features } => serde_json::to_string(features),
        StreamEvent::Progress {
            processed,
            total,
            percent,
        } => serde_json::to_string(&json!({
            "processed": processed,
            "total": total,
            "percent": percent,
        })),
        StreamEvent::Complete { total_features } => {
            serde_json::to_string(&json!({ "totalFeatures": total_features }))
        }
    };
    match data {
        Ok(payload) => base.data(payload),
        // Serialization of these payloads cannot fail in practice
        Err(_) => base.data("{}"),
    }
}

#[derive(Debug, Deserialize)]
struct AreaBody {
    /// Lasso vertices in GeoJSON order, `[lon, lat]`.
    polygon: Vec<[f64; 2]>,
}

async fn runs_in_area(
    State(service): State<Arc<TrackService>>,
    Json(body): Json<AreaBody>,
) -> Result<Response, ApiError> {
    let vertices: Vec<GpsPoint> = body
        .polygon
        .iter()
        .map(|[lon, lat]| GpsPoint::from_lon_lat(*lon, *lat))
        .collect();

    let runs = service.query_polygon(&vertices)?;
    let total = runs.len();
    Ok(Json(json!({ "runs": runs, "total": total })).into_response())
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    /// Coordinates in GeoJSON order, `[lon, lat]`.
    points: Vec<[f64; 2]>,
    #[serde(default)]
    metadata: TrackMetadata,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum UploadResponse {
    Stored { id: TrackId },
    Skipped { skipped: bool },
}

async fn upload(
    State(service): State<Arc<TrackService>>,
    Json(body): Json<UploadBody>,
) -> Json<UploadResponse> {
    let points: Vec<GpsPoint> = body
        .points
        .iter()
        .map(|[lon, lat]| GpsPoint::from_lon_lat(*lon, *lat))
        .collect();

    match service.upload(TrackInput::new(points, body.metadata)) {
        Some(id) => Json(UploadResponse::Stored { id }),
        None => Json(UploadResponse::Skipped { skipped: true }),
    }
}

async fn remove_run(
    State(service): State<Arc<TrackService>>,
    Path(id): Path<TrackId>,
) -> StatusCode {
    if service.remove(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn stats(State(service): State<Arc<TrackService>>) -> Response {
    Json(service.stats()).into_response()
}
