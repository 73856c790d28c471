//! Index state and the commit path.
//!
//! A commit is split in two. [`IndexState::plan_commit`] reads the current
//! state and the pending operations and produces a [`CommitPlan`] without
//! touching anything; every way a commit can fail is detected here. Then
//! [`IndexState::apply`] performs the planned mutations, which cannot fail.
//! The caller plans under an upgradable read lock and applies under the
//! write lock, so readers see either none or all of a batch.

use crate::config::DuplicatePolicy;
use crate::index::{GridIndex, GridStats};
use crate::storage::{Document, DocumentStore};
use spatio_shapes_types::{DocId, Geometry};
use std::sync::Arc;
use thiserror::Error;

/// A pending mutation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BatchOp {
    Put { id: DocId, geometry: Geometry },
    Delete { id: DocId },
}

/// Why a plan could not be built. Nothing has been mutated when this is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum PlanRejection {
    #[error("capacity of {limit} documents exceeded: commit would hold {required}")]
    CapacityExceeded { limit: usize, required: usize },

    #[error("document {0} not found")]
    NotFound(DocId),
}

/// What a commit did, once applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CommitOutcome {
    pub epoch: u64,
    pub inserted: u64,
    pub replaced: u64,
    pub deleted: u64,
    /// Puts dropped because the id was already committed under
    /// [`DuplicatePolicy::Reject`]
    pub rejected: u64,
}

/// The complete mutation list for one commit.
#[derive(Debug)]
pub(crate) struct CommitPlan {
    /// Documents whose cells are cleared before anything is written
    evict: Vec<Arc<Document>>,
    deletes: Vec<DocId>,
    puts: Vec<Arc<Document>>,
    outcome: CommitOutcome,
}

impl CommitPlan {
    pub fn outcome(&self) -> &CommitOutcome {
        &self.outcome
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }
}

/// Statistics about an index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    /// Committed documents
    pub documents: usize,
    /// Approximate bytes held by committed geometries
    pub total_weight: usize,
    /// Commits applied so far, single-document writes included
    pub commits: u64,
    /// Queries executed so far
    pub queries: u64,
    pub grid: GridStats,
}

/// Document store and partition index, always mutated together.
#[derive(Debug)]
pub(crate) struct IndexState {
    pub store: DocumentStore,
    pub grid: GridIndex,
    /// Number of the last applied commit
    pub epoch: u64,
    pub closed: bool,
}

impl IndexState {
    pub fn new(cell_size: f64, max_cells_per_document: usize) -> Self {
        Self {
            store: DocumentStore::new(),
            grid: GridIndex::new(cell_size, max_cells_per_document),
            epoch: 0,
            closed: false,
        }
    }

    /// Build the mutation list for `ops` against the current state.
    ///
    /// Ids in `ops` are expected to be unique; the ingestion batch already
    /// resolves repeats.
    pub fn plan_commit(
        &self,
        ops: Vec<BatchOp>,
        policy: DuplicatePolicy,
        max_documents: Option<usize>,
    ) -> Result<CommitPlan, PlanRejection> {
        let epoch = self.epoch + 1;
        let mut plan = CommitPlan {
            evict: Vec::new(),
            deletes: Vec::new(),
            puts: Vec::with_capacity(ops.len()),
            outcome: CommitOutcome {
                epoch,
                ..CommitOutcome::default()
            },
        };
        let mut len = self.store.len();

        for op in ops {
            match op {
                BatchOp::Put { id, geometry } => {
                    let existing = self.store.get(id);
                    if existing.is_some() && policy == DuplicatePolicy::Reject {
                        plan.outcome.rejected += 1;
                        continue;
                    }

                    let Ok(doc) = Document::new(id, geometry, epoch) else {
                        // Unreachable for validated geometries
                        plan.outcome.rejected += 1;
                        continue;
                    };

                    match existing {
                        Some(old) => {
                            plan.evict.push(Arc::clone(old));
                            plan.outcome.replaced += 1;
                        }
                        None => {
                            len += 1;
                            plan.outcome.inserted += 1;
                        }
                    }
                    plan.puts.push(Arc::new(doc));
                }
                BatchOp::Delete { id } => {
                    let old = self.store.get(id).ok_or(PlanRejection::NotFound(id))?;
                    plan.evict.push(Arc::clone(old));
                    plan.deletes.push(id);
                    plan.outcome.deleted += 1;
                    len -= 1;
                }
            }
        }

        if let Some(limit) = max_documents
            && len > limit
        {
            return Err(PlanRejection::CapacityExceeded {
                limit,
                required: len,
            });
        }

        Ok(plan)
    }

    /// Perform a plan built against this exact state.
    pub fn apply(&mut self, plan: CommitPlan) -> CommitOutcome {
        for old in &plan.evict {
            self.grid.remove(old.id, &old.bbox);
        }
        for id in plan.deletes {
            self.store.delete(id);
        }
        for doc in plan.puts {
            self.grid.insert(doc.id, &doc.bbox);
            self.store.put(doc);
        }

        self.epoch = plan.outcome.epoch;
        plan.outcome
    }

    pub fn get(&self, id: DocId) -> Option<&Arc<Document>> {
        self.store.get(id)
    }

    pub fn stats(&self, queries: u64) -> IndexStats {
        IndexStats {
            documents: self.store.len(),
            total_weight: self.store.total_weight(),
            commits: self.epoch,
            queries,
            grid: self.grid.stats(),
        }
    }
}
