//! Loads a synthetic inventory over Alaska and runs five nested `within`
//! queries, printing timing and hit counts for each.
//!
//! Run with `RUST_LOG=debug` to see per-commit and per-query logging.

use spatio_shapes::{Geometry, Relation, ShapeIndex, to_geojson};
use std::time::Instant;

const BANDS: [&str; 5] = [
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,59],[-147,59],[-147,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,59],[-151,59],[-151,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,61],[-151,61],[-151,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,61],[-151.9,61],[-151.9,62],[-152,62]]]}"#,
    r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,61.9],[-151.9,61.9],[-151.9,62],[-152,62]]]}"#,
];

const RECORDS: usize = 200_000;
const BATCH_SIZE: usize = 10_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let index = ShapeIndex::builder().batch_size(BATCH_SIZE).build()?;

    // Points scattered over a 10 x 6 degree window, every hundredth one
    // malformed to show skipping
    let mut seed = 0x9e37_79b9_7f4a_7c15u64;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed >> 11) as f64 / (1u64 << 53) as f64
    };
    let mut records = Vec::with_capacity(RECORDS);
    for id in 0..RECORDS as i64 {
        let payload = if id % 100 == 99 {
            r#"{"type":"Point","coordinates":[-152.0]}"#.to_string()
        } else {
            let point = Geometry::point(-155.0 + next() * 10.0, 58.0 + next() * 6.0);
            to_geojson(&point)?
        };
        records.push((id, payload));
    }

    let mut ingestor = index.ingestor()?;
    for (id, payload) in records {
        ingestor.push(id, payload)?;
    }
    let report = ingestor.finish()?;
    println!(
        "Loaded {} documents ({} skipped) in {} commits, {:?}",
        report.committed_count, report.skipped_count, report.commits, report.elapsed
    );

    for (n, band) in BANDS.iter().enumerate() {
        let started = Instant::now();
        let result = index.query(*band, Relation::Within, 10)?;
        println!(
            "#{} time: {:?}, hits: {} (first ids {:?}, {} candidates, {} cells)",
            n + 1,
            started.elapsed(),
            result.total,
            result.hits,
            result.stats.candidates,
            result.stats.cells_visited
        );
    }

    let stats = index.stats()?;
    println!(
        "Grid: {} occupied cells, {:.1} entries per cell, {} coarse entries",
        stats.grid.occupied_cells, stats.grid.avg_entries_per_cell, stats.grid.coarse_entries
    );

    Ok(())
}
