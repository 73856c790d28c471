//! # spatio-shapes-types
//!
//! Core geometry types shared by the `spatio-shapes` index:
//!
//! - **Geometry**: `Geometry` (point or polygon with holes)
//! - **Bounding boxes**: `BoundingBox`, with antimeridian-aware splitting
//! - **Relations**: `Relation` (`within`, `contains`, `intersects`, `disjoint`)
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use spatio_shapes_types::{BoundingBox, Geometry};
//!
//! let shape = Geometry::rectangle(-152.0, 59.0, -147.0, 62.0);
//! let bbox = shape.bounding_box().unwrap();
//! assert_eq!(bbox, BoundingBox::new(-152.0, 59.0, -147.0, 62.0));
//! ```

pub mod bbox;
pub mod geometry;
pub mod relation;

pub use bbox::BoundingBox;
pub use geometry::Geometry;
pub use relation::{ParseRelationError, Relation};

/// Identifier of an indexed document.
pub type DocId = i64;
