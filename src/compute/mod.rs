//! Compute layer: geometry parsing, validation, and spatial predicates.
//!
//! Independent of storage; everything here works on plain geometries.

pub mod geojson;
pub mod relation;
pub mod validation;
