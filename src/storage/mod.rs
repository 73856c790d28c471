//! Document storage.

pub mod documents;

pub use documents::{Document, DocumentStore};
