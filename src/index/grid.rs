//! Fixed-grid partition index with per-cell R-trees.
//!
//! The lon/lat plane is cut into square cells of `cell_size` degrees. A
//! document is registered in every cell its bounding box touches, and each
//! cell keeps its members in an `rstar::RTree` keyed by their envelope so a
//! lookup only returns members whose box actually meets the query box.
//!
//! ```text
//! GridIndex
//! ├─ cells: FxHashMap<CellId, RTree<CellEntry>>
//! │  ├─ (29, 151) -> RTree [doc 7, doc 12]
//! │  └─ (30, 151) -> RTree [doc 12]      // doc 12 spans two cells
//! └─ coarse: RTree<CellEntry>            // documents touching too many cells
//! ```
//!
//! Entries are never stored twice for one cell, and the reverse mapping is
//! not kept: the cells of a document are recomputed from its bounding box on
//! removal, which the caller always has at hand.

use rstar::{AABB, RTree, RTreeObject};
use rustc_hash::FxHashMap;
use spatio_shapes_types::{BoundingBox, DocId};

/// Column and row of a grid cell. Column 0 starts at longitude -180, row 0
/// at latitude -90.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId {
    pub col: u32,
    pub row: u32,
}

/// A document's presence in one cell (or in the coarse level), with the
/// envelope of the part of its bounding box that was registered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellEntry {
    pub id: DocId,
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl CellEntry {
    fn new(id: DocId, part: &BoundingBox) -> Self {
        Self {
            id,
            min: [part.min_lon, part.min_lat],
            max: [part.max_lon, part.max_lat],
        }
    }
}

impl RTreeObject for CellEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Inclusive range of cells covered by a non-wrapping box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    min_col: u32,
    max_col: u32,
    min_row: u32,
    max_row: u32,
}

impl CellRange {
    fn count(&self) -> u64 {
        u64::from(self.max_col - self.min_col + 1) * u64::from(self.max_row - self.min_row + 1)
    }

    fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        (self.min_col..=self.max_col)
            .flat_map(move |col| (self.min_row..=self.max_row).map(move |row| CellId { col, row }))
    }
}

/// Candidate ids for a query box, ascending and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub ids: Vec<DocId>,
    /// Occupied cells whose R-tree was probed.
    pub cells_visited: usize,
}

/// Statistics about the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridStats {
    /// Cells holding at least one entry
    pub occupied_cells: usize,
    /// Entries across all cells; a document spanning cells counts once per cell
    pub cell_entries: usize,
    /// Entries in the coarse level
    pub coarse_entries: usize,
    /// Documents currently registered
    pub documents: usize,
    pub avg_entries_per_cell: f64,
    pub max_entries_per_cell: usize,
    pub cell_size_degrees: f64,
}

/// The partition index. Holds document ids and envelopes only; geometries
/// live in the document store.
#[derive(Debug, Clone)]
pub struct GridIndex {
    cells: FxHashMap<CellId, RTree<CellEntry>>,
    coarse: RTree<CellEntry>,
    cell_size: f64,
    cols: u32,
    rows: u32,
    max_cells_per_document: usize,
    documents: usize,
}

impl GridIndex {
    /// Create a grid with square cells of `cell_size` degrees.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive finite number.
    pub fn new(cell_size: f64, max_cells_per_document: usize) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "Cell size must be a positive number of degrees"
        );

        Self {
            cells: FxHashMap::default(),
            coarse: RTree::new(),
            cell_size,
            cols: ((360.0 / cell_size).ceil() as u32).max(1),
            rows: ((180.0 / cell_size).ceil() as u32).max(1),
            max_cells_per_document: max_cells_per_document.max(1),
            documents: 0,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    /// Register a document under every cell its bounding box touches.
    pub fn insert(&mut self, id: DocId, bbox: &BoundingBox) {
        let parts = bbox.split_antimeridian();

        if self.is_oversized(&parts) {
            for part in &parts {
                self.coarse.insert(CellEntry::new(id, part));
            }
        } else {
            for part in &parts {
                let entry = CellEntry::new(id, part);
                for cell in self.cell_range(part).cells() {
                    self.cells.entry(cell).or_default().insert(entry);
                }
            }
        }

        self.documents += 1;
    }

    /// Undo an [`insert`](Self::insert) made with the same id and box.
    /// Returns whether any entry was found.
    pub fn remove(&mut self, id: DocId, bbox: &BoundingBox) -> bool {
        let parts = bbox.split_antimeridian();
        let mut found = false;

        if self.is_oversized(&parts) {
            for part in &parts {
                found |= self.coarse.remove(&CellEntry::new(id, part)).is_some();
            }
        } else {
            for part in &parts {
                let entry = CellEntry::new(id, part);
                for cell in self.cell_range(part).cells() {
                    let Some(tree) = self.cells.get_mut(&cell) else {
                        continue;
                    };
                    found |= tree.remove(&entry).is_some();
                    if tree.size() == 0 {
                        self.cells.remove(&cell);
                    }
                }
            }
        }

        if found {
            self.documents = self.documents.saturating_sub(1);
        }
        found
    }

    /// Ids of every document whose bounding box intersects `query`, edges
    /// included. May contain documents the exact test later rejects, never
    /// misses one.
    pub fn candidates(&self, query: &BoundingBox) -> Candidates {
        let mut result = Candidates::default();

        for part in query.split_antimeridian() {
            let envelope = AABB::from_corners(
                [part.min_lon, part.min_lat],
                [part.max_lon, part.max_lat],
            );
            let range = self.cell_range(&part);

            if range.count() > self.cells.len() as u64 {
                // Fewer occupied cells than cells in range: walk the map
                for (cell, tree) in &self.cells {
                    if !range_contains(&range, cell) {
                        continue;
                    }
                    result.cells_visited += 1;
                    result.ids.extend(
                        tree.locate_in_envelope_intersecting(&envelope)
                            .map(|entry| entry.id),
                    );
                }
            } else {
                for cell in range.cells() {
                    if let Some(tree) = self.cells.get(&cell) {
                        result.cells_visited += 1;
                        result.ids.extend(
                            tree.locate_in_envelope_intersecting(&envelope)
                                .map(|entry| entry.id),
                        );
                    }
                }
            }

            result.ids.extend(
                self.coarse
                    .locate_in_envelope_intersecting(&envelope)
                    .map(|entry| entry.id),
            );
        }

        result.ids.sort_unstable();
        result.ids.dedup();
        result
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.coarse = RTree::new();
        self.documents = 0;
    }

    pub fn stats(&self) -> GridStats {
        let occupied_cells = self.cells.len();
        let cell_entries: usize = self.cells.values().map(|tree| tree.size()).sum();
        let max_entries_per_cell = self.cells.values().map(|tree| tree.size()).max().unwrap_or(0);

        let avg_entries_per_cell = if occupied_cells > 0 {
            cell_entries as f64 / occupied_cells as f64
        } else {
            0.0
        };

        GridStats {
            occupied_cells,
            cell_entries,
            coarse_entries: self.coarse.size(),
            documents: self.documents,
            avg_entries_per_cell,
            max_entries_per_cell,
            cell_size_degrees: self.cell_size,
        }
    }

    fn is_oversized(&self, parts: &[BoundingBox]) -> bool {
        let touched: u64 = parts.iter().map(|part| self.cell_range(part).count()).sum();
        touched > self.max_cells_per_document as u64
    }

    fn cell_range(&self, part: &BoundingBox) -> CellRange {
        CellRange {
            min_col: self.col_of(part.min_lon),
            max_col: self.col_of(part.max_lon),
            min_row: self.row_of(part.min_lat),
            max_row: self.row_of(part.max_lat),
        }
    }

    fn col_of(&self, lon: f64) -> u32 {
        grid_step(lon + 180.0, self.cell_size, self.cols)
    }

    fn row_of(&self, lat: f64) -> u32 {
        grid_step(lat + 90.0, self.cell_size, self.rows)
    }
}

fn grid_step(offset: f64, cell_size: f64, steps: u32) -> u32 {
    let step = (offset / cell_size).floor();
    if step <= 0.0 {
        0
    } else {
        (step as u32).min(steps - 1)
    }
}

fn range_contains(range: &CellRange, cell: &CellId) -> bool {
    (range.min_col..=range.max_col).contains(&cell.col)
        && (range.min_row..=range.max_row).contains(&cell.row)
}
