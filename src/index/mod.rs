//! Spatial partition index.
//!
//! A coarse filter over document bounding boxes: every document whose box
//! meets the query box is returned, some that the exact relation test will
//! reject may be too.

pub mod grid;

pub use grid::{Candidates, CellEntry, CellId, GridIndex, GridStats};
