mod common;

use common::{ALASKA_BANDS, init_logging, synthetic_alaska};
use serde_json::json;
use spatio_shapes::{
    BoundingBox, Config, DuplicatePolicy, Geometry, Record, Relation, ShapeIndex,
    ShapeIndexError, to_geojson,
};

#[test]
fn test_ingest_then_query_nested_bands() {
    init_logging();
    let index = ShapeIndex::new();

    let docs = synthetic_alaska(2_000, 7);
    let payloads: Vec<(i64, String)> = docs
        .iter()
        .map(|(id, geometry)| (*id, to_geojson(geometry).unwrap()))
        .collect();

    let report = index.ingest(payloads, 250).unwrap();
    assert_eq!(report.committed_count, 2_000);
    assert_eq!(report.skipped_count, 0);
    assert_eq!(report.commits, 8);
    assert_eq!(index.count().unwrap(), 2_000);

    let totals: Vec<usize> = ALASKA_BANDS
        .iter()
        .map(|band| index.query(*band, Relation::Within, 10).unwrap().total)
        .collect();

    assert!(totals[0] > 0);
    for pair in totals.windows(2) {
        assert!(pair[0] >= pair[1], "totals not monotonic: {:?}", totals);
    }
}

#[test]
fn test_hits_are_smallest_ids_in_order() {
    init_logging();
    let index = ShapeIndex::new();
    index.ingest(synthetic_alaska(500, 11), 100).unwrap();

    let limited = index.query(ALASKA_BANDS[0], Relation::Within, 5).unwrap();
    let full = index.scan(ALASKA_BANDS[0], Relation::Within).unwrap();

    assert_eq!(limited.total, full.total);
    assert_eq!(limited.hits.len(), 5.min(full.total));
    assert_eq!(limited.hits[..], full.hits[..limited.hits.len()]);
    assert!(limited.hits.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_ingest_records_with_inventory_field_names() {
    init_logging();
    let records: Vec<Record> = serde_json::from_value(json!([
        {"inventory_id": 1, "geog": "{\"type\":\"Point\",\"coordinates\":[-149.9,61.2]}"},
        {"inventory_id": 2, "geog": {"type": "Point", "coordinates": [-147.7, 64.8]}},
        {"inventory_id": 3, "geog": "{\"type\":\"MultiPoint\",\"coordinates\":[[0,0]]}"},
        {"id": 4, "geometry": {"type": "Polygon", "coordinates": [[[-151, 60], [-150, 60], [-150, 61], [-151, 61], [-151, 60]]]}}
    ]))
    .unwrap();

    let index = ShapeIndex::new();
    let report = index.ingest_records(records, 1000).unwrap();
    assert_eq!(report.committed_count, 3);
    assert_eq!(report.skipped_count, 1);
    assert_eq!(report.commits, 1);

    let result = index.query(ALASKA_BANDS[0], Relation::Within, 10).unwrap();
    assert_eq!(result.hits, vec![1, 4]);
}

#[test]
fn test_all_relations_against_one_polygon() {
    init_logging();
    let index = ShapeIndex::new();
    index.insert(1, Geometry::rectangle(-151.0, 60.0, -150.0, 61.0)).unwrap(); // inside band
    index.insert(2, Geometry::rectangle(-160.0, 55.0, -140.0, 70.0)).unwrap(); // covers band
    index.insert(3, Geometry::rectangle(-148.0, 61.0, -146.0, 63.0)).unwrap(); // straddles edge
    index.insert(4, Geometry::point(-130.0, 55.0)).unwrap(); // far away

    let band = ALASKA_BANDS[0];
    let hits = |relation| index.query(band, relation, 10).unwrap().hits;

    assert_eq!(hits(Relation::Within), vec![1]);
    assert_eq!(hits(Relation::Contains), vec![2]);
    assert_eq!(hits(Relation::Intersects), vec![1, 2, 3]);
    assert_eq!(hits(Relation::Disjoint), vec![4]);
}

#[test]
fn test_relation_parsed_from_text() {
    let index = ShapeIndex::new();
    index.insert(1, Geometry::point(-149.9, 61.2)).unwrap();

    let relation: Relation = " Within ".parse().unwrap();
    assert_eq!(index.query(ALASKA_BANDS[0], relation, 10).unwrap().total, 1);
    assert!("overlaps".parse::<Relation>().is_err());
}

#[test]
fn test_query_bbox() {
    let index = ShapeIndex::new();
    index.insert(1, Geometry::point(-149.9, 61.2)).unwrap();
    index.insert(2, Geometry::rectangle(-147.5, 59.5, -146.0, 60.0)).unwrap();
    index.insert(3, Geometry::point(10.0, 10.0)).unwrap();

    let result = index
        .query_bbox(&BoundingBox::new(-152.0, 59.0, -147.0, 62.0), 10)
        .unwrap();
    assert_eq!(result.hits, vec![1, 2]);
}

#[test]
fn test_single_document_writes_are_visible() {
    let index = ShapeIndex::new();
    index.insert(1, Geometry::point(-149.9, 61.2)).unwrap();
    assert_eq!(index.query(ALASKA_BANDS[0], Relation::Within, 10).unwrap().total, 1);

    // Move the document out of the band
    index.insert(1, Geometry::point(-140.0, 61.2)).unwrap();
    assert_eq!(index.query(ALASKA_BANDS[0], Relation::Within, 10).unwrap().total, 0);
    assert_eq!(index.count().unwrap(), 1);

    index.delete(1).unwrap();
    assert_eq!(index.count().unwrap(), 0);
    assert_eq!(index.stats().unwrap().grid.documents, 0);
}

#[test]
fn test_builder_configures_ingestion() {
    let index = ShapeIndex::builder()
        .batch_size(2)
        .duplicate_policy(DuplicatePolicy::Reject)
        .build()
        .unwrap();

    let mut ingestor = index.ingestor().unwrap();
    for id in 0..5 {
        ingestor.push(id, Geometry::point(id as f64, 0.0)).unwrap();
    }
    ingestor.push(0, Geometry::point(50.0, 0.0)).unwrap();
    let report = ingestor.finish().unwrap();

    assert_eq!(report.commits, 3);
    assert_eq!(report.committed_count, 5);
    assert_eq!(report.skipped_count, 1);
    assert_eq!(index.get(0).unwrap().geometry, Geometry::point(0.0, 0.0));
}

#[test]
fn test_capacity_limit_surfaces_progress() {
    init_logging();
    let index = ShapeIndex::with_config(Config::default().with_max_documents(250)).unwrap();

    let err = index.ingest(synthetic_alaska(1_000, 3), 100).unwrap_err();
    match err {
        ShapeIndexError::CommitFailure {
            committed, skipped, ..
        } => {
            assert_eq!(committed, 200);
            assert_eq!(skipped, 0);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Exactly the batches committed before the failure are visible
    assert_eq!(index.count().unwrap(), 200);
    assert_eq!(index.stats().unwrap().commits, 2);
}
