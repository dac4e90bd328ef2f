//! Integration tests for SpatialIndex and the bounds overlap test

use runmap::{Bounds, SpatialIndex};

fn london() -> Bounds {
    Bounds::new(51.5, 51.52, -0.15, -0.10)
}

fn nyc() -> Bounds {
    Bounds::new(40.7, 40.75, -74.1, -74.0)
}

#[test]
fn test_insert_and_query() {
    let mut index = SpatialIndex::new();
    index.insert(1, london());
    index.insert(2, nyc());

    assert_eq!(index.len(), 2);

    let results = index.query(&Bounds::new(51.0, 52.0, -1.0, 0.0));
    assert_eq!(results, vec![1]);

    let results = index.query(&Bounds::new(40.0, 41.0, -75.0, -74.0));
    assert_eq!(results, vec![2]);
}

#[test]
fn test_query_empty_area() {
    let mut index = SpatialIndex::new();
    index.insert(1, london());

    // Tokyo
    let results = index.query(&Bounds::new(35.6, 35.7, 139.6, 139.8));
    assert!(results.is_empty());
}

#[test]
fn test_query_world_returns_everything() {
    let mut index = SpatialIndex::new();
    index.insert(1, london());
    index.insert(2, nyc());

    let mut results = index.query(&Bounds::new(-90.0, 90.0, -180.0, 180.0));
    results.sort_unstable();
    assert_eq!(results, vec![1, 2]);
}

#[test]
fn test_remove() {
    let mut index = SpatialIndex::new();
    index.insert(1, london());
    index.insert(2, nyc());

    assert!(index.remove(1, london()));
    assert_eq!(index.len(), 1);
    assert!(index.query(&london()).is_empty());

    // Already gone
    assert!(!index.remove(1, london()));
}

#[test]
fn test_bulk_load() {
    let index = SpatialIndex::bulk_load(vec![(1, london()), (2, nyc())]);
    assert_eq!(index.len(), 2);
    assert_eq!(index.query(&london()), vec![1]);
}

#[test]
fn test_touching_edges_intersect() {
    let mut index = SpatialIndex::new();
    index.insert(1, Bounds::new(0.0, 1.0, 0.0, 1.0));

    // Shares only the lng=1 edge
    let results = index.query(&Bounds::new(0.0, 1.0, 1.0, 2.0));
    assert_eq!(results, vec![1]);
}

#[test]
fn test_clear() {
    let mut index = SpatialIndex::new();
    index.insert(1, london());
    index.clear();
    assert!(index.is_empty());
}

#[test]
fn test_bounds_intersection_symmetric() {
    let a = Bounds::new(0.0, 2.0, 0.0, 2.0);
    let b = Bounds::new(1.0, 3.0, 1.0, 3.0);
    let c = Bounds::new(5.0, 6.0, 5.0, 6.0);

    assert_eq!(a.intersects(&b), b.intersects(&a));
    assert!(a.intersects(&b));
    assert_eq!(a.intersects(&c), c.intersects(&a));
    assert!(!a.intersects(&c));
}

#[test]
fn test_bounds_intersects_itself() {
    let a = Bounds::new(0.0, 2.0, 0.0, 2.0);
    assert!(a.intersects(&a));
}

#[test]
fn test_bounds_containment() {
    let outer = Bounds::new(0.0, 10.0, 0.0, 10.0);
    let inner = Bounds::new(1.0, 2.0, 1.0, 2.0);

    assert!(outer.contains(&inner));
    assert!(!inner.contains(&outer));
    // Containment is edge-inclusive
    assert!(outer.contains(&outer));
}
