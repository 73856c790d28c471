//! In-memory document store keyed by document id.

use crate::error::ValidationError;
use spatio_shapes_types::{BoundingBox, DocId, Geometry};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A committed document with its precomputed bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub geometry: Geometry,
    pub bbox: BoundingBox,
    /// Approximate footprint in bytes
    pub weight: usize,
    /// Commit that last wrote this document
    pub epoch: u64,
}

impl Document {
    /// Build a document from an already validated geometry.
    pub fn new(id: DocId, geometry: Geometry, epoch: u64) -> Result<Self, ValidationError> {
        let bbox = geometry
            .bounding_box()
            .ok_or(ValidationError::EmptyPolygon)?;
        let weight = geometry.weight();

        Ok(Self {
            id,
            geometry,
            bbox,
            weight,
            epoch,
        })
    }
}

/// Documents ordered by ascending id. Values are shared so that query
/// results can outlive the read lock they were produced under.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    docs: BTreeMap<DocId, Arc<Document>>,
    total_weight: usize,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document, returning the previous one.
    pub fn put(&mut self, doc: Arc<Document>) -> Option<Arc<Document>> {
        self.total_weight += doc.weight;
        let previous = self.docs.insert(doc.id, doc);
        if let Some(old) = &previous {
            self.total_weight = self.total_weight.saturating_sub(old.weight);
        }
        previous
    }

    pub fn get(&self, id: DocId) -> Option<&Arc<Document>> {
        self.docs.get(&id)
    }

    pub fn delete(&mut self, id: DocId) -> Option<Arc<Document>> {
        let removed = self.docs.remove(&id);
        if let Some(doc) = &removed {
            self.total_weight = self.total_weight.saturating_sub(doc.weight);
        }
        removed
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.docs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Summed byte weight of all stored geometries.
    pub fn total_weight(&self) -> usize {
        self.total_weight
    }

    /// Documents in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.docs.values()
    }

    pub fn clear(&mut self) {
        self.docs.clear();
        self.total_weight = 0;
    }
}
