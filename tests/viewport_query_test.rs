//! Integration tests for viewport queries

use std::collections::HashSet;

use runmap::query::{clip_to_viewport, emit_candidate, query_viewport};
use runmap::{
    Bounds, DetailTier, Geometry, GpsPoint, SpatialIndex, TrackInput, TrackMetadata, TrackStore,
};

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

fn geometry_coords(geometry: &Geometry) -> Vec<[f64; 2]> {
    match geometry {
        Geometry::LineString(coords) => coords.clone(),
        Geometry::MultiLineString(lines) => lines.iter().flatten().copied().collect(),
    }
}

#[test]
fn test_contained_track_returned_at_high_zoom() {
    let (store, index) = setup(vec![frederick_track()]);
    let viewport = Bounds::new(39.0, 40.0, -78.0, -77.0);

    let collection = query_viewport(&store, &index, &viewport, 16.0, None);

    assert_eq!(collection.len(), 1);
    assert_eq!(collection.features[0].properties.tier, "full");
    assert_eq!(collection.features[0].geometry.coord_count(), 2);
}

#[test]
fn test_same_viewport_low_zoom_uses_coarse_tier() {
    let (store, index) = setup(vec![frederick_track()]);
    let viewport = Bounds::new(39.0, 40.0, -78.0, -77.0);

    let collection = query_viewport(&store, &index, &viewport, 5.0, None);

    assert_eq!(collection.len(), 1);
    assert_eq!(collection.features[0].properties.tier, "coarse");
}

#[test]
fn test_track_outside_viewport_never_returned() {
    let track = vec![GpsPoint::new(5.5, 5.5), GpsPoint::new(5.6, 5.6)];
    let (store, index) = setup(vec![track]);
    let viewport = Bounds::new(0.0, 1.0, 0.0, 1.0);

    for zoom in [0.0, 5.0, 10.0, 16.0] {
        let collection = query_viewport(&store, &index, &viewport, zoom, None);
        assert!(collection.is_empty());
    }
}

#[test]
fn test_partial_track_is_clipped_to_viewport() {
    // Horizontal line crossing the east edge of the viewport
    let track = vec![GpsPoint::new(0.5, 0.5), GpsPoint::new(0.5, 1.5)];
    let (store, index) = setup(vec![track]);
    let viewport = Bounds::new(0.0, 1.0, 0.0, 1.0);

    let collection = query_viewport(&store, &index, &viewport, 16.0, None);
    assert_eq!(collection.len(), 1);

    for [lng, lat] in geometry_coords(&collection.features[0].geometry) {
        assert!((-1e-6..=1.0 + 1e-6).contains(&lng), "lng {lng} outside viewport");
        assert!((-1e-6..=1.0 + 1e-6).contains(&lat), "lat {lat} outside viewport");
    }
}

#[test]
fn test_bbox_overlap_but_geometry_outside_is_dropped() {
    // L-shaped track whose bbox overlaps the viewport but whose line stays
    // clear of it
    let track = vec![
        GpsPoint::new(2.0, -1.0),
        GpsPoint::new(-1.0, -1.0),
        GpsPoint::new(-1.0, 2.0),
    ];
    let (store, index) = setup(vec![track]);
    let viewport = Bounds::new(0.0, 1.0, 0.0, 1.0);

    let collection = query_viewport(&store, &index, &viewport, 16.0, None);
    assert!(collection.is_empty());
}

#[test]
fn test_fast_path_matches_clipping() {
    let (store, index) = setup(vec![frederick_track()]);
    let viewport = Bounds::new(39.0, 40.0, -78.0, -77.0);
    let ids: Vec<u64> = store.ids().collect();
    let track = store.get(ids[0]).unwrap();

    assert!(viewport.contains(&track.bounds));

    let fast = emit_candidate(&track, DetailTier::Full, &viewport).unwrap();
    let clipped = clip_to_viewport(&track.geometry.full, &viewport).unwrap();

    let fast_coords = geometry_coords(&fast.geometry);
    let clip_coords = geometry_coords(&clipped);
    assert_eq!(fast_coords.len(), clip_coords.len());
    for (a, b) in fast_coords.iter().zip(&clip_coords) {
        assert!((a[0] - b[0]).abs() < 1e-6);
        assert!((a[1] - b[1]).abs() < 1e-6);
    }
}

#[test]
fn test_id_filter_restricts_results() {
    let (store, index) = setup(vec![
        frederick_track(),
        vec![GpsPoint::new(39.5, -77.5), GpsPoint::new(39.51, -77.49)],
    ]);
    let viewport = Bounds::new(39.0, 40.0, -78.0, -77.0);

    let all = query_viewport(&store, &index, &viewport, 16.0, None);
    assert_eq!(all.len(), 2);

    let first_id = all.features[0].properties.id;
    let filter: HashSet<u64> = [first_id].into_iter().collect();
    let filtered = query_viewport(&store, &index, &viewport, 16.0, Some(&filter));
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered.features[0].properties.id, first_id);
}

#[test]
fn test_unknown_filter_id_yields_nothing() {
    let (store, index) = setup(vec![frederick_track()]);
    let viewport = Bounds::new(39.0, 40.0, -78.0, -77.0);

    let filter: HashSet<u64> = [9999].into_iter().collect();
    let collection = query_viewport(&store, &index, &viewport, 16.0, Some(&filter));
    assert!(collection.is_empty());
}

#[test]
fn test_features_in_id_order() {
    let (store, index) = setup(vec![
        frederick_track(),
        vec![GpsPoint::new(39.5, -77.5), GpsPoint::new(39.51, -77.49)],
        vec![GpsPoint::new(39.6, -77.6), GpsPoint::new(39.61, -77.59)],
    ]);
    let viewport = Bounds::new(39.0, 40.0, -78.0, -77.0);

    let collection = query_viewport(&store, &index, &viewport, 16.0, None);
    let ids: Vec<u64> = collection.features.iter().map(|f| f.properties.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[test]
fn test_geojson_shape() {
    let (store, index) = setup(vec![frederick_track()]);
    let viewport = Bounds::new(39.0, 40.0, -78.0, -77.0);

    let collection = query_viewport(&store, &index, &viewport, 16.0, None);
    let json = serde_json::to_value(&collection).unwrap();

    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(json["features"][0]["type"], "Feature");
    assert_eq!(json["features"][0]["geometry"]["type"], "LineString");
    assert_eq!(
        json["features"][0]["geometry"]["coordinates"][0][0]
            .as_f64()
            .unwrap(),
        -77.41
    );
}
