//! Query execution against a consistent index state.

use super::internal::IndexState;
use crate::compute::relation::{self, PreparedQuery};
use crate::error::ValidationError;
use log::debug;
use spatio_shapes_types::{BoundingBox, DocId, Geometry, Relation};
use std::time::{Duration, Instant};

/// Work done by a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Occupied grid cells probed
    pub cells_visited: usize,
    /// Documents returned by the partition filter
    pub candidates: usize,
    /// Exact relation tests run
    pub exact_tests: usize,
}

/// Outcome of a query.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Number of matching documents, regardless of `limit`
    pub total: usize,
    /// Matching document ids, ascending, at most `limit` of them
    pub hits: Vec<DocId>,
    pub elapsed: Duration,
    pub stats: QueryStats,
}

impl QueryResult {
    fn empty(started: Instant) -> Self {
        Self {
            total: 0,
            hits: Vec::new(),
            elapsed: started.elapsed(),
            stats: QueryStats::default(),
        }
    }

    /// Whether `hits` holds every match.
    pub fn is_complete(&self) -> bool {
        self.hits.len() == self.total
    }
}

struct Collector {
    limit: usize,
    total: usize,
    hits: Vec<DocId>,
}

impl Collector {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            total: 0,
            hits: Vec::new(),
        }
    }

    fn push(&mut self, id: DocId) {
        self.total += 1;
        if self.hits.len() < self.limit {
            self.hits.push(id);
        }
    }

    fn finish(self, started: Instant, stats: QueryStats) -> QueryResult {
        QueryResult {
            total: self.total,
            hits: self.hits,
            elapsed: started.elapsed(),
            stats,
        }
    }
}

/// Filter through the grid, then test each candidate exactly.
pub(super) fn execute(
    state: &IndexState,
    query: &Geometry,
    relation: Relation,
    limit: usize,
) -> QueryResult {
    let started = Instant::now();
    let Some(prepared) = PreparedQuery::new(query) else {
        return QueryResult::empty(started);
    };

    let candidates = state.grid.candidates(prepared.bbox());
    let mut stats = QueryStats {
        cells_visited: candidates.cells_visited,
        candidates: candidates.ids.len(),
        exact_tests: 0,
    };
    let mut collector = Collector::new(limit);

    if relation == Relation::Disjoint {
        // Documents the filter did not return cannot touch the query
        for doc in state.store.iter() {
            if candidates.ids.binary_search(&doc.id).is_err() {
                collector.push(doc.id);
                continue;
            }
            stats.exact_tests += 1;
            if prepared.relate(relation, &doc.geometry, &doc.bbox) {
                collector.push(doc.id);
            }
        }
    } else {
        for id in candidates.ids {
            let Some(doc) = state.store.get(id) else {
                continue;
            };
            stats.exact_tests += 1;
            if prepared.relate(relation, &doc.geometry, &doc.bbox) {
                collector.push(id);
            }
        }
    }

    let result = collector.finish(started, stats);
    debug!(
        "{} {} query: {} matches, {} candidates from {} cells, {} exact tests in {:?}",
        query.kind(),
        relation,
        result.total,
        stats.candidates,
        stats.cells_visited,
        stats.exact_tests,
        result.elapsed
    );
    result
}

/// Test every committed document without the grid.
pub(super) fn scan(state: &IndexState, query: &Geometry, relation: Relation) -> QueryResult {
    let started = Instant::now();
    let mut stats = QueryStats::default();
    let mut collector = Collector::new(usize::MAX);

    for doc in state.store.iter() {
        stats.exact_tests += 1;
        if relation::evaluate(relation, query, &doc.geometry) {
            collector.push(doc.id);
        }
    }

    collector.finish(started, stats)
}

/// Documents whose geometry meets `bbox`, which may cross the antimeridian.
pub(super) fn execute_bbox(state: &IndexState, bbox: &BoundingBox, limit: usize) -> QueryResult {
    let started = Instant::now();
    let parts: Vec<Geometry> = bbox
        .split_antimeridian()
        .iter()
        .map(|part| Geometry::Polygon(part.to_polygon()))
        .collect();

    let candidates = state.grid.candidates(bbox);
    let mut stats = QueryStats {
        cells_visited: candidates.cells_visited,
        candidates: candidates.ids.len(),
        exact_tests: 0,
    };
    let mut collector = Collector::new(limit);

    for id in candidates.ids {
        let Some(doc) = state.store.get(id) else {
            continue;
        };
        stats.exact_tests += 1;
        if parts
            .iter()
            .any(|part| relation::intersects(part, &doc.geometry))
        {
            collector.push(id);
        }
    }

    let result = collector.finish(started, stats);
    debug!(
        "bbox query {:?}: {} matches, {} candidates in {:?}",
        bbox, result.total, stats.candidates, result.elapsed
    );
    result
}

/// Checks a caller-supplied box: finite, in range, and not inverted in
/// latitude. Longitude may wrap.
pub(super) fn validate_bbox(bbox: &BoundingBox) -> Result<(), ValidationError> {
    let corners = [
        (bbox.min_lon, bbox.min_lat, "min corner"),
        (bbox.max_lon, bbox.max_lat, "max corner"),
    ];
    for (lon, lat, location) in corners {
        crate::compute::validation::validate_coordinate(geo::Coord { x: lon, y: lat }, || {
            location.to_string()
        })?;
    }

    if bbox.min_lat > bbox.max_lat {
        return Err(ValidationError::Malformed(format!(
            "bounding box min latitude {} exceeds max latitude {}",
            bbox.min_lat, bbox.max_lat
        )));
    }
    Ok(())
}
