//! Index builder for flexible configuration
//!
//! Mirrors the `Config` setters, plus loading a configuration file.

use crate::config::{BatchWeight, Config, DuplicatePolicy};
use crate::db::ShapeIndex;
use crate::error::Result;
use std::path::PathBuf;

/// Builder for a [`ShapeIndex`].
///
/// ```
/// use spatio_shapes::ShapeIndex;
///
/// let index = ShapeIndex::builder()
///     .batch_size(500)
///     .cell_size(0.5)
///     .build()?;
/// assert_eq!(index.config().batch_size, 500);
/// # Ok::<(), spatio_shapes::ShapeIndexError>(())
/// ```
#[derive(Debug)]
pub struct IndexBuilder {
    config: Config,
    config_file: Option<PathBuf>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            config_file: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a JSON (or, with the `toml` feature, TOML)
    /// file at build time. Setters called afterwards do not apply.
    pub fn config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config = self.config.with_batch_size(batch_size);
        self
    }

    pub fn batch_weight(mut self, weight: BatchWeight) -> Self {
        self.config = self.config.with_batch_weight(weight);
        self
    }

    pub fn cell_size(mut self, degrees: f64) -> Self {
        self.config = self.config.with_cell_size(degrees);
        self
    }

    pub fn max_cells_per_document(mut self, max_cells: usize) -> Self {
        self.config = self.config.with_max_cells_per_document(max_cells);
        self
    }

    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config = self.config.with_duplicate_policy(policy);
        self
    }

    pub fn max_documents(mut self, max_documents: usize) -> Self {
        self.config = self.config.with_max_documents(max_documents);
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config = self.config.with_default_limit(limit);
        self
    }

    /// Build the index, validating the configuration.
    pub fn build(self) -> Result<ShapeIndex> {
        let config = match self.config_file {
            Some(path) => Config::from_file(path)?,
            None => self.config,
        };
        ShapeIndex::with_config(config)
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShapeIndexError;
    use std::io::Write;

    #[test]
    fn test_builder_default() {
        let index = IndexBuilder::new().build().unwrap();
        assert_eq!(index.config(), &Config::default());
    }

    #[test]
    fn test_builder_setters() {
        let index = IndexBuilder::new()
            .batch_size(10)
            .batch_weight(BatchWeight::Bytes)
            .cell_size(2.0)
            .max_cells_per_document(64)
            .duplicate_policy(DuplicatePolicy::Reject)
            .max_documents(100)
            .default_limit(3)
            .build()
            .unwrap();

        let config = index.config();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.batch_weight, BatchWeight::Bytes);
        assert_eq!(config.cell_size_degrees, 2.0);
        assert_eq!(config.max_cells_per_document, 64);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.max_documents, Some(100));
        assert_eq!(config.default_limit, 3);
    }

    #[test]
    fn test_builder_with_config_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"batch_size": 7, "cell_size_degrees": 5.0}}"#).unwrap();

        let index = IndexBuilder::new().config_file(file.path()).build().unwrap();
        assert_eq!(index.config().batch_size, 7);
        assert_eq!(index.config().cell_size_degrees, 5.0);
    }

    #[test]
    fn test_builder_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"cell_size_degrees": 500.0}}"#).unwrap();

        let err = IndexBuilder::new().config_file(file.path()).build().unwrap_err();
        assert!(matches!(err, ShapeIndexError::InvalidConfig(_)));
    }
}
