//! The shape index.
//!
//! [`ShapeIndex`] owns a document store and a partition grid behind one
//! `parking_lot::RwLock`. Queries hold the read lock for their whole run.
//! Commits are planned under an upgradable read lock, which admits readers
//! but no second planner, and published under the write lock.

use crate::builder::IndexBuilder;
use crate::compute::geojson::GeometryPayload;
use crate::config::Config;
use crate::error::{Result, ShapeIndexError};
use crate::storage::Document;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use spatio_shapes_types::{BoundingBox, DocId, Relation};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

mod batch;
mod internal;
mod query;

pub use batch::{BatchIngestor, IngestReport, IngestState, Record};
pub use internal::IndexStats;
pub use query::{QueryResult, QueryStats};

use internal::{BatchOp, CommitOutcome, IndexState, PlanRejection};

/// In-memory index of point and polygon documents answering `within`,
/// `contains`, `intersects` and `disjoint` queries.
///
/// Cloning is cheap and yields a handle to the same index, so one clone can
/// ingest while others query from different threads.
///
/// # Examples
///
/// ```rust
/// use spatio_shapes::{Relation, ShapeIndex};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let index = ShapeIndex::new();
///
/// let records = vec![
///     (1, r#"{"type":"Point","coordinates":[-149.9,61.2]}"#),
///     (2, r#"{"type":"Point","coordinates":[-147.7,64.8]}"#),
/// ];
/// let report = index.ingest(records, 1000)?;
/// assert_eq!(report.committed_count, 2);
///
/// let band = r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,59],[-147,59],[-147,62],[-152,62]]]}"#;
/// let result = index.query(band, Relation::Within, 10)?;
/// assert_eq!(result.hits, vec![1]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ShapeIndex {
    inner: Arc<RwLock<IndexState>>,
    config: Arc<Config>,
    queries: Arc<AtomicU64>,
}

impl ShapeIndex {
    /// Create an empty index with the default configuration.
    pub fn new() -> Self {
        Self::from_valid_config(Config::default())
    }

    /// Create an empty index, rejecting an invalid configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().map_err(ShapeIndexError::InvalidConfig)?;
        Ok(Self::from_valid_config(config))
    }

    pub fn builder() -> IndexBuilder {
        IndexBuilder::new()
    }

    fn from_valid_config(config: Config) -> Self {
        let state = IndexState::new(config.cell_size_degrees, config.max_cells_per_document);
        Self {
            inner: Arc::new(RwLock::new(state)),
            config: Arc::new(config),
            queries: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ===== Ingestion =====

    /// Ingest a stream of `(id, payload)` pairs, committing every
    /// `batch_size` records and once more at the end of the stream.
    ///
    /// Invalid payloads are skipped and counted. A failed commit stops the
    /// run with [`ShapeIndexError::CommitFailure`]; batches committed before
    /// it stay visible.
    pub fn ingest<I, P>(&self, stream: I, batch_size: usize) -> Result<IngestReport>
    where
        I: IntoIterator<Item = (DocId, P)>,
        P: GeometryPayload,
    {
        let mut ingestor = self.ingestor_with_threshold(batch_size)?;
        for (id, payload) in stream {
            ingestor.push(id, payload)?;
        }
        ingestor.finish()
    }

    /// Ingest decoded [`Record`]s.
    pub fn ingest_records<I>(&self, records: I, batch_size: usize) -> Result<IngestReport>
    where
        I: IntoIterator<Item = Record>,
    {
        self.ingest(
            records
                .into_iter()
                .map(|record| (record.id, record.geometry)),
            batch_size,
        )
    }

    /// Push-style ingestor using the configured batch size.
    pub fn ingestor(&self) -> Result<BatchIngestor> {
        self.ingestor_with_threshold(self.config.batch_size)
    }

    pub fn ingestor_with_threshold(&self, batch_size: usize) -> Result<BatchIngestor> {
        self.ensure_open()?;
        BatchIngestor::new(self.clone(), batch_size)
    }

    // ===== Single documents =====

    /// Insert or replace one document as its own commit.
    ///
    /// Under [`DuplicatePolicy::Reject`](crate::DuplicatePolicy::Reject) an
    /// existing id fails with [`ShapeIndexError::DuplicateDocument`].
    pub fn insert<P: GeometryPayload>(&self, id: DocId, payload: P) -> Result<()> {
        let geometry = payload.into_geometry()?;
        let outcome = self.commit_ops(vec![BatchOp::Put { id, geometry }])?;
        if outcome.rejected > 0 {
            return Err(ShapeIndexError::DuplicateDocument(id));
        }
        Ok(())
    }

    /// Remove one document as its own commit.
    pub fn delete(&self, id: DocId) -> Result<()> {
        self.commit_ops(vec![BatchOp::Delete { id }])?;
        Ok(())
    }

    pub fn get(&self, id: DocId) -> Result<Arc<Document>> {
        let state = self.read()?;
        state.get(id).cloned().ok_or(ShapeIndexError::NotFound(id))
    }

    pub fn contains(&self, id: DocId) -> Result<bool> {
        Ok(self.read()?.store.contains(id))
    }

    /// Number of committed documents.
    pub fn count(&self) -> Result<usize> {
        Ok(self.read()?.store.len())
    }

    // ===== Queries =====

    /// Documents standing in `relation` to the query geometry. `total` counts
    /// every match; `hits` holds the smallest `limit` matching ids.
    ///
    /// An invalid query geometry fails with
    /// [`ShapeIndexError::QueryGeometry`].
    pub fn query<P: GeometryPayload>(
        &self,
        payload: P,
        relation: Relation,
        limit: usize,
    ) -> Result<QueryResult> {
        let geometry = payload
            .into_geometry()
            .map_err(ShapeIndexError::QueryGeometry)?;

        let state = self.read()?;
        self.queries.fetch_add(1, Ordering::Relaxed);
        Ok(query::execute(&state, &geometry, relation, limit))
    }

    /// [`query`](Self::query) with the configured `default_limit`.
    pub fn query_default<P: GeometryPayload>(
        &self,
        payload: P,
        relation: Relation,
    ) -> Result<QueryResult> {
        self.query(payload, relation, self.config.default_limit)
    }

    /// Documents meeting a bounding box. `min_lon > max_lon` selects a box
    /// across the antimeridian.
    pub fn query_bbox(&self, bbox: &BoundingBox, limit: usize) -> Result<QueryResult> {
        query::validate_bbox(bbox).map_err(ShapeIndexError::QueryGeometry)?;

        let state = self.read()?;
        self.queries.fetch_add(1, Ordering::Relaxed);
        Ok(query::execute_bbox(&state, bbox, limit))
    }

    /// Every matching document, found by testing all of them without the
    /// partition grid.
    pub fn scan<P: GeometryPayload>(&self, payload: P, relation: Relation) -> Result<QueryResult> {
        let geometry = payload
            .into_geometry()
            .map_err(ShapeIndexError::QueryGeometry)?;

        let state = self.read()?;
        Ok(query::scan(&state, &geometry, relation))
    }

    // ===== Lifecycle =====

    pub fn stats(&self) -> Result<IndexStats> {
        let state = self.read()?;
        Ok(state.stats(self.queries.load(Ordering::Relaxed)))
    }

    /// Close the index and release its contents. Every later call on any
    /// handle fails with [`ShapeIndexError::IndexClosed`].
    pub fn close(&self) -> Result<()> {
        let mut state = self.inner.write();
        if state.closed {
            return Err(ShapeIndexError::IndexClosed);
        }

        state.closed = true;
        state.store.clear();
        state.grid.clear();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    // ===== Internal =====

    fn read(&self) -> Result<parking_lot::RwLockReadGuard<'_, IndexState>> {
        let state = self.inner.read();
        if state.closed {
            return Err(ShapeIndexError::IndexClosed);
        }
        Ok(state)
    }

    fn ensure_open(&self) -> Result<()> {
        self.read().map(|_| ())
    }

    /// Plan `ops` against the current state and publish the result.
    pub(crate) fn commit_ops(&self, ops: Vec<BatchOp>) -> Result<CommitOutcome> {
        let state = self.inner.upgradable_read();
        if state.closed {
            return Err(ShapeIndexError::IndexClosed);
        }

        let plan = state
            .plan_commit(ops, self.config.duplicate_policy, self.config.max_documents)
            .map_err(|rejection| match rejection {
                PlanRejection::NotFound(id) => ShapeIndexError::NotFound(id),
                PlanRejection::CapacityExceeded { .. } => ShapeIndexError::CommitFailure {
                    committed: 0,
                    skipped: 0,
                    reason: rejection.to_string(),
                },
            })?;

        if plan.is_empty() {
            // Everything was rejected; nothing to publish
            return Ok(CommitOutcome {
                epoch: state.epoch,
                ..*plan.outcome()
            });
        }

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        Ok(state.apply(plan))
    }
}

impl Default for ShapeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShapeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeIndex")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}
