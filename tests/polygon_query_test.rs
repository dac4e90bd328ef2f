//! Integration tests for lasso-polygon queries

use runmap::query::{query_polygon, validate_polygon};
use runmap::{Error, GpsPoint, SpatialIndex, TrackInput, TrackMetadata, TrackStore};

fn setup(tracks: Vec<Vec<GpsPoint>>) -> (TrackStore, SpatialIndex) {
    let mut store = TrackStore::new();
    let mut index = SpatialIndex::new();
    for points in tracks {
        if let Some(id) = store.insert(TrackInput::new(points, TrackMetadata::default())) {
            let bounds = store.get(id).unwrap().bounds;
            index.insert(id, bounds);
        }
    }
    (store, index)
}

fn frederick_track() -> Vec<GpsPoint> {
    vec![GpsPoint::new(39.41, -77.41), GpsPoint::new(39.42, -77.40)]
}

/// Rectangle as (lat, lng) corners, counter-clockwise, not closed.
fn rectangle(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Vec<GpsPoint> {
    vec![
        GpsPoint::new(min_lat, min_lng),
        GpsPoint::new(min_lat, max_lng),
        GpsPoint::new(max_lat, max_lng),
        GpsPoint::new(max_lat, min_lng),
    ]
}

#[test]
fn test_enclosing_rectangle_returns_track() {
    let (store, index) = setup(vec![frederick_track()]);

    let selections =
        query_polygon(&store, &index, &rectangle(39.0, 40.0, -78.0, -77.0)).unwrap();

    assert_eq!(selections.len(), 1);
    // Full-resolution geometry, never clipped
    assert_eq!(selections[0].geometry.coord_count(), 2);
}

#[test]
fn test_enclosing_triangle_returns_track() {
    let (store, index) = setup(vec![frederick_track()]);

    let triangle = vec![
        GpsPoint::new(39.0, -78.0),
        GpsPoint::new(39.0, -76.0),
        GpsPoint::new(40.5, -77.4),
    ];
    let selections = query_polygon(&store, &index, &triangle).unwrap();
    assert_eq!(selections.len(), 1);
}

#[test]
fn test_disjoint_polygon_returns_nothing() {
    let (store, index) = setup(vec![frederick_track()]);

    let selections = query_polygon(&store, &index, &rectangle(0.0, 1.0, 0.0, 1.0)).unwrap();
    assert!(selections.is_empty());
}

#[test]
fn test_polygon_crossing_track_matches_without_clipping() {
    // Polygon covers only the western half of the track
    let (store, index) = setup(vec![frederick_track()]);

    let selections =
        query_polygon(&store, &index, &rectangle(39.0, 40.0, -78.0, -77.405)).unwrap();

    assert_eq!(selections.len(), 1);
    // The whole track comes back, not just the part inside the lasso
    assert_eq!(selections[0].geometry.coord_count(), 2);
}

#[test]
fn test_bbox_overlap_alone_does_not_match() {
    // Diagonal track whose bbox overlaps the lasso but whose line does not
    let track = vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(1.0, 1.0)];
    let (store, index) = setup(vec![track]);

    // Small square tucked into the upper-left of the track's bbox
    let lasso = rectangle(0.8, 0.95, 0.05, 0.2);
    let selections = query_polygon(&store, &index, &lasso).unwrap();
    assert!(selections.is_empty());
}

#[test]
fn test_open_polygon_is_auto_closed() {
    let open = rectangle(39.0, 40.0, -78.0, -77.0);
    assert!(validate_polygon(&open).is_ok());

    let mut closed = open.clone();
    closed.push(open[0]);
    assert!(validate_polygon(&closed).is_ok());
}

#[test]
fn test_too_few_vertices_rejected() {
    let err = validate_polygon(&[GpsPoint::new(0.0, 0.0), GpsPoint::new(1.0, 1.0)]).unwrap_err();
    assert!(matches!(err, Error::InvalidPolygon { .. }));
}

#[test]
fn test_duplicate_vertices_do_not_count_as_distinct() {
    let err = validate_polygon(&[
        GpsPoint::new(0.0, 0.0),
        GpsPoint::new(0.0, 0.0),
        GpsPoint::new(1.0, 1.0),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::InvalidPolygon { .. }));
}

#[test]
fn test_degenerate_collinear_polygon_rejected() {
    let err = validate_polygon(&[
        GpsPoint::new(0.0, 0.0),
        GpsPoint::new(1.0, 1.0),
        GpsPoint::new(2.0, 2.0),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::InvalidPolygon { .. }));
}

#[test]
fn test_polygon_error_reports_as_client_error() {
    let err = validate_polygon(&[]).unwrap_err();
    assert!(err.is_client_error());
}

#[test]
fn test_selection_carries_metadata() {
    let mut store = TrackStore::new();
    let mut index = SpatialIndex::new();
    let id = store
        .insert(TrackInput::new(
            frederick_track(),
            TrackMetadata {
                distance_meters: 1500.0,
                source_file: "frederick.gpx".to_string(),
                ..TrackMetadata::default()
            },
        ))
        .unwrap();
    index.insert(id, store.get(id).unwrap().bounds);

    let selections =
        query_polygon(&store, &index, &rectangle(39.0, 40.0, -78.0, -77.0)).unwrap();

    assert_eq!(selections[0].id, id);
    assert_eq!(selections[0].metadata.distance_meters, 1500.0);
    assert_eq!(selections[0].metadata.source_file, "frederick.gpx");
}
