//! Batched ingestion.
//!
//! Records are validated one by one and collected into a [`Batch`]. A full
//! batch is committed atomically; a record that fails validation is skipped
//! and counted, it never aborts the run. A failed commit does.

use super::ShapeIndex;
use super::internal::{BatchOp, CommitOutcome};
use crate::compute::geojson::GeometryPayload;
use crate::config::{BatchWeight, DuplicatePolicy};
use crate::error::{Result, ShapeIndexError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use spatio_shapes_types::{DocId, Geometry};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// One input record: a document id and its GeoJSON geometry.
///
/// The geometry may be an embedded GeoJSON object or a string holding one.
///
/// ```
/// use spatio_shapes::Record;
///
/// let record: Record = serde_json::from_str(
///     r#"{"inventory_id": 7, "geog": "{\"type\":\"Point\",\"coordinates\":[-149.9,61.2]}"}"#,
/// )
/// .unwrap();
/// assert_eq!(record.id, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(alias = "inventory_id")]
    pub id: DocId,
    #[serde(alias = "geog")]
    pub geometry: serde_json::Value,
}

impl Record {
    pub fn new(id: DocId, geometry: serde_json::Value) -> Self {
        Self { id, geometry }
    }
}

/// Pending documents of the current batch. A repeated id replaces the
/// pending geometry.
#[derive(Debug, Default)]
pub(crate) struct Batch {
    entries: BTreeMap<DocId, Geometry>,
    weight: usize,
}

impl Batch {
    /// Returns the geometry this one replaced, if any.
    fn insert(&mut self, id: DocId, geometry: Geometry) -> Option<Geometry> {
        self.weight += geometry.weight();
        let previous = self.entries.insert(id, geometry);
        if let Some(old) = &previous {
            self.weight = self.weight.saturating_sub(old.weight());
        }
        previous
    }

    fn contains(&self, id: DocId) -> bool {
        self.entries.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn weight(&self) -> usize {
        self.weight
    }

    fn take(&mut self) -> Vec<BatchOp> {
        self.weight = 0;
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(id, geometry)| BatchOp::Put { id, geometry })
            .collect()
    }
}

/// Where an ingestion run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    /// Collecting records into the current batch
    Accumulating,
    /// A batch is being planned and published
    Committing,
    /// The stream ended and the last batch was committed
    Finished,
    /// A commit failed; no further records are accepted
    Failed,
}

/// Summary of a finished ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// Records that were committed. A record later replaced by another one
    /// with the same id still counts.
    pub committed_count: u64,
    /// Records dropped for invalid geometry or, under
    /// [`DuplicatePolicy::Reject`], for a repeated id
    pub skipped_count: u64,
    /// Committed records that replaced an earlier geometry
    pub replaced_count: u64,
    /// Batches committed
    pub commits: u64,
    pub elapsed: Duration,
}

/// Push-style ingestion into a [`ShapeIndex`].
///
/// ```
/// use spatio_shapes::ShapeIndex;
///
/// let index = ShapeIndex::new();
/// let mut ingestor = index.ingestor_with_threshold(2)?;
/// ingestor.push(1, r#"{"type":"Point","coordinates":[-149.9,61.2]}"#)?;
/// ingestor.push(2, r#"{"type":"Point","coordinates":[-147.7,64.8]}"#)?;
/// ingestor.push(3, "not geojson")?;
///
/// let report = ingestor.finish()?;
/// assert_eq!(report.committed_count, 2);
/// assert_eq!(report.skipped_count, 1);
/// assert_eq!(report.commits, 1);
/// # Ok::<(), spatio_shapes::ShapeIndexError>(())
/// ```
pub struct BatchIngestor {
    index: ShapeIndex,
    threshold: usize,
    weight: BatchWeight,
    policy: DuplicatePolicy,
    batch: Batch,
    /// Records accepted into the current batch, replaced ones included
    pending_records: u64,
    state: IngestState,
    committed: u64,
    skipped: u64,
    replaced: u64,
    commits: u64,
    started: Instant,
}

impl BatchIngestor {
    pub(crate) fn new(index: ShapeIndex, threshold: usize) -> Result<Self> {
        if threshold == 0 {
            return Err(ShapeIndexError::InvalidConfig(
                "Batch size threshold must be greater than zero".to_string(),
            ));
        }

        let config = index.config();
        let weight = config.batch_weight;
        let policy = config.duplicate_policy;

        Ok(Self {
            index,
            threshold,
            weight,
            policy,
            batch: Batch::default(),
            pending_records: 0,
            state: IngestState::Accumulating,
            committed: 0,
            skipped: 0,
            replaced: 0,
            commits: 0,
            started: Instant::now(),
        })
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Records waiting in the current batch.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    pub fn committed_count(&self) -> u64 {
        self.committed
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }

    /// Validate a record and add it to the current batch, committing the
    /// batch once it reaches the threshold.
    ///
    /// An invalid payload is skipped and `Ok(())` is returned. Errors are
    /// reserved for failed commits and for pushing after one.
    pub fn push<P: GeometryPayload>(&mut self, id: DocId, payload: P) -> Result<()> {
        if self.state == IngestState::Failed {
            return Err(ShapeIndexError::IngestionFailed);
        }

        let geometry = match payload.into_geometry() {
            Ok(geometry) => geometry,
            Err(e) => {
                self.skipped += 1;
                warn!("Skipping record {}: {} [{}]", id, e, e.rule());
                return Ok(());
            }
        };

        if self.policy == DuplicatePolicy::Reject && self.batch.contains(id) {
            self.skipped += 1;
            warn!("Skipping record {}: id already pending in this batch", id);
            return Ok(());
        }

        if self.batch.insert(id, geometry).is_some() {
            self.replaced += 1;
        }
        self.pending_records += 1;

        if self.is_full() {
            self.commit()?;
        }
        Ok(())
    }

    /// Commit the current batch now, whatever its size.
    pub fn flush(&mut self) -> Result<()> {
        if self.state == IngestState::Failed {
            return Err(ShapeIndexError::IngestionFailed);
        }
        self.commit()
    }

    /// Commit what is left and report on the run.
    pub fn finish(mut self) -> Result<IngestReport> {
        self.flush()?;
        self.state = IngestState::Finished;

        let report = IngestReport {
            committed_count: self.committed,
            skipped_count: self.skipped,
            replaced_count: self.replaced,
            commits: self.commits,
            elapsed: self.started.elapsed(),
        };

        info!(
            "Ingestion finished: {} committed, {} skipped, {} replaced in {} commits ({:?})",
            report.committed_count,
            report.skipped_count,
            report.replaced_count,
            report.commits,
            report.elapsed
        );

        Ok(report)
    }

    fn is_full(&self) -> bool {
        match self.weight {
            BatchWeight::Entries => self.batch.len() >= self.threshold,
            BatchWeight::Bytes => self.batch.weight() >= self.threshold,
        }
    }

    fn commit(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }

        self.state = IngestState::Committing;
        let ops = self.batch.take();
        let records = std::mem::take(&mut self.pending_records);
        let entries = ops.len();

        match self.index.commit_ops(ops) {
            Ok(outcome) => {
                self.record_outcome(records, &outcome);
                self.state = IngestState::Accumulating;
                debug!(
                    "Committed batch {} ({} entries, {} inserted, {} replaced, {} rejected)",
                    outcome.epoch, entries, outcome.inserted, outcome.replaced, outcome.rejected
                );
                Ok(())
            }
            Err(ShapeIndexError::CommitFailure { reason, .. }) => {
                self.state = IngestState::Failed;
                warn!(
                    "Batch commit failed after {} committed records: {}",
                    self.committed, reason
                );
                Err(ShapeIndexError::CommitFailure {
                    committed: self.committed,
                    skipped: self.skipped,
                    reason,
                })
            }
            Err(e) => {
                self.state = IngestState::Failed;
                Err(e)
            }
        }
    }

    fn record_outcome(&mut self, records: u64, outcome: &CommitOutcome) {
        self.committed += records.saturating_sub(outcome.rejected);
        self.skipped += outcome.rejected;
        self.replaced += outcome.replaced;
        if outcome.inserted + outcome.replaced + outcome.deleted > 0 {
            self.commits += 1;
        }
    }
}
