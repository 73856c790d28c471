//! Error types for the shape index.

use spatio_shapes_types::DocId;
use thiserror::Error;

/// Reason a geometry payload was rejected. Each variant names the rule that
/// was broken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("malformed GeoJSON payload: {0}")]
    Malformed(String),

    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    #[error("{location}: position must have at least 2 values, got {len}")]
    ShortPosition { location: String, len: usize },

    #[error("{location}: coordinates must be finite")]
    NonFiniteCoordinate { location: String },

    #[error("{location}: longitude out of range [-180.0, 180.0]: {value}")]
    LongitudeOutOfRange { location: String, value: f64 },

    #[error("{location}: latitude out of range [-90.0, 90.0]: {value}")]
    LatitudeOutOfRange { location: String, value: f64 },

    #[error("polygon must have at least one ring")]
    EmptyPolygon,

    #[error("ring {ring} is not closed: first and last positions differ")]
    UnclosedRing { ring: usize },

    #[error("ring {ring} has {distinct} distinct vertices, at least 3 are required")]
    TooFewVertices { ring: usize, distinct: usize },

    #[error("ring {ring} encloses no area: all vertices are collinear")]
    ZeroArea { ring: usize },
}

impl ValidationError {
    /// Short, stable name of the violated rule, suitable for metrics labels.
    pub fn rule(&self) -> &'static str {
        match self {
            ValidationError::Malformed(_) => "malformed",
            ValidationError::UnsupportedGeometry(_) => "unsupported_geometry",
            ValidationError::ShortPosition { .. } => "short_position",
            ValidationError::NonFiniteCoordinate { .. } => "non_finite_coordinate",
            ValidationError::LongitudeOutOfRange { .. } => "longitude_out_of_range",
            ValidationError::LatitudeOutOfRange { .. } => "latitude_out_of_range",
            ValidationError::EmptyPolygon => "empty_polygon",
            ValidationError::UnclosedRing { .. } => "unclosed_ring",
            ValidationError::TooFewVertices { .. } => "too_few_vertices",
            ValidationError::ZeroArea { .. } => "zero_area",
        }
    }
}

#[derive(Debug, Error)]
pub enum ShapeIndexError {
    #[error("invalid geometry: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid query geometry: {0}")]
    QueryGeometry(ValidationError),

    #[error(
        "batch commit failed after {committed} committed and {skipped} skipped records: {reason}"
    )]
    CommitFailure {
        committed: u64,
        skipped: u64,
        reason: String,
    },

    #[error("document {0} not found")]
    NotFound(DocId),

    #[error("document {0} already exists")]
    DuplicateDocument(DocId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("ingestion run already failed; no further records are accepted")]
    IngestionFailed,

    #[error("index is closed")]
    IndexClosed,

    #[error("serialization error: {0}")]
    SerializationErrorWithContext(String),
}

pub type Result<T> = std::result::Result<T, ShapeIndexError>;
