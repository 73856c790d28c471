//! Configuration for the shape index
//!
//! Controls ingestion batching, the partition grid, and duplicate handling.
use crate::error::{Result, ShapeIndexError};
use serde::de::Error;
use std::path::Path;

/// How the size of a pending batch is measured against `batch_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchWeight {
    /// Number of pending entries.
    #[default]
    Entries,
    /// Summed approximate byte weight of the pending geometries.
    Bytes,
}

/// What happens when a document id is written again during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later record replaces the earlier one, within a batch and across
    /// batches. Replacements are reported in `IngestReport::replaced_count`.
    #[default]
    LastWriteWins,
    /// A record whose id is already pending or committed is skipped and
    /// counted in `IngestReport::skipped_count`.
    Reject,
}

/// Index configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Flush threshold for ingestion batches, measured per `batch_weight`
    #[serde(default = "Config::default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub batch_weight: BatchWeight,

    /// Edge length of a partition grid cell, in degrees
    #[serde(default = "Config::default_cell_size_degrees")]
    pub cell_size_degrees: f64,

    /// Documents spanning more grid cells than this go to the coarse level
    #[serde(default = "Config::default_max_cells_per_document")]
    pub max_cells_per_document: usize,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Upper bound on committed documents. A commit that would exceed it fails.
    #[serde(default)]
    pub max_documents: Option<usize>,

    /// Result cap used by `ShapeIndex::query_default`
    #[serde(default = "Config::default_limit")]
    pub default_limit: usize,
}

impl Config {
    const fn default_batch_size() -> usize {
        1000
    }

    const fn default_cell_size_degrees() -> f64 {
        1.0
    }

    const fn default_max_cells_per_document() -> usize {
        4096
    }

    const fn default_limit() -> usize {
        10
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "Batch size must be greater than zero");
        self.batch_size = batch_size;
        self
    }

    pub fn with_batch_weight(mut self, weight: BatchWeight) -> Self {
        self.batch_weight = weight;
        self
    }

    pub fn with_cell_size(mut self, degrees: f64) -> Self {
        assert!(
            degrees.is_finite() && degrees > 0.0,
            "Cell size must be a positive number of degrees"
        );

        if degrees < 0.01 {
            log::warn!(
                "Cell size of {} degrees produces a very fine grid; \
                large documents will touch many cells.",
                degrees
            );
        }

        self.cell_size_degrees = degrees;
        self
    }

    pub fn with_max_cells_per_document(mut self, max_cells: usize) -> Self {
        assert!(max_cells > 0, "Max cells per document must be greater than zero");
        self.max_cells_per_document = max_cells;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_max_documents(mut self, max_documents: usize) -> Self {
        self.max_documents = Some(max_documents);
        self
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.batch_size == 0 {
            return Err("Batch size must be greater than zero".to_string());
        }

        if !self.cell_size_degrees.is_finite() || self.cell_size_degrees <= 0.0 {
            return Err(format!(
                "Cell size must be a positive number of degrees, got {}",
                self.cell_size_degrees
            ));
        }

        if self.cell_size_degrees > 180.0 {
            return Err(format!(
                "Cell size must not exceed 180 degrees, got {}",
                self.cell_size_degrees
            ));
        }

        if self.max_cells_per_document == 0 {
            return Err("Max cells per document must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load a configuration file. `.toml` files need the `toml` feature;
    /// anything else is read as JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ShapeIndexError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "toml")]
            Some("toml") => Self::from_toml(&contents)
                .map_err(|e| ShapeIndexError::InvalidConfig(e.to_string())),
            #[cfg(not(feature = "toml"))]
            Some("toml") => Err(ShapeIndexError::InvalidConfig(
                "TOML configuration requires the `toml` feature".to_string(),
            )),
            _ => Self::from_json(&contents)
                .map_err(|e| ShapeIndexError::InvalidConfig(e.to_string())),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: Self::default_batch_size(),
            batch_weight: BatchWeight::default(),
            cell_size_degrees: Self::default_cell_size_degrees(),
            max_cells_per_document: Self::default_max_cells_per_document(),
            duplicate_policy: DuplicatePolicy::default(),
            max_documents: None,
            default_limit: Self::default_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::LastWriteWins);
    }

    #[test]
    fn test_json_round_trip_and_partial_input() {
        let config = Config::default()
            .with_batch_size(250)
            .with_batch_weight(BatchWeight::Bytes)
            .with_duplicate_policy(DuplicatePolicy::Reject)
            .with_max_documents(1_000_000);
        let json = config.to_json().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);

        let partial = Config::from_json(r#"{"batch_size": 50, "cell_size_degrees": 0.5}"#).unwrap();
        assert_eq!(partial.batch_size, 50);
        assert_eq!(partial.cell_size_degrees, 0.5);
        assert_eq!(partial.max_cells_per_document, 4096);
    }

    #[test]
    fn test_json_rejects_invalid_values() {
        assert!(Config::from_json(r#"{"batch_size": 0}"#).is_err());
        assert!(Config::from_json(r#"{"cell_size_degrees": -1.0}"#).is_err());
        assert!(Config::from_json(r#"{"unknown_field": 1}"#).is_err());
    }

    #[test]
    #[should_panic(expected = "Batch size must be greater than zero")]
    fn test_zero_batch_size_panics_in_builder_method() {
        let _ = Config::default().with_batch_size(0);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"batch_size": 42, "duplicate_policy": "reject"}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.batch_size, 42);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/spatio-shapes.json").unwrap_err();
        assert!(matches!(err, ShapeIndexError::InvalidConfig(_)));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_round_trip() {
        let config = Config::default().with_cell_size(0.25).with_default_limit(25);
        let toml_str = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&toml_str).unwrap(), config);
    }
}
