//! In-memory geospatial shape index with batched ingestion and exact
//! `within` / `contains` / `intersects` / `disjoint` queries.
//!
//! ```rust
//! use spatio_shapes::{Relation, ShapeIndex};
//!
//! let index = ShapeIndex::new();
//! index.insert(1, r#"{"type":"Point","coordinates":[-149.9,61.2]}"#)?;
//! index.insert(2, r#"{"type":"Point","coordinates":[-135.3,59.5]}"#)?;
//!
//! let band = r#"{"type":"Polygon","coordinates":[[[-152,62],[-152,59],[-147,59],[-147,62],[-152,62]]]}"#;
//! let result = index.query(band, Relation::Within, 10)?;
//! assert_eq!(result.total, 1);
//! assert_eq!(result.hits, vec![1]);
//! # Ok::<(), spatio_shapes::ShapeIndexError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod storage;

pub use compute::{geojson, relation, validation};

pub use builder::IndexBuilder;
pub use config::{BatchWeight, Config, DuplicatePolicy};
pub use db::{
    BatchIngestor, IndexStats, IngestReport, IngestState, QueryResult, QueryStats, Record,
    ShapeIndex,
};
pub use error::{Result, ShapeIndexError, ValidationError};
pub use compute::geojson::{GeometryPayload, parse_geojson, to_geojson};
pub use index::{GridIndex, GridStats};
pub use storage::Document;

pub use spatio_shapes_types::{BoundingBox, DocId, Geometry, ParseRelationError, Relation};

pub use geo::{Point, Polygon};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{IndexBuilder, Result, ShapeIndex, ShapeIndexError};

    pub use geo::{Point, Polygon};

    pub use crate::{BoundingBox, DocId, Geometry, Relation};

    pub use crate::{Config, DuplicatePolicy, GeometryPayload, Record};
}
