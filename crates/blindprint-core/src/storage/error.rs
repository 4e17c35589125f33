//! Storage error types.

use thiserror::Error;

/// Errors from a [`FeatureStore`](super::FeatureStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No entry under the requested label
    #[error("no entry for label '{0}'")]
    NotFound(String),

    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file system, database, etc.)
    #[error("I/O error: {0}")]
    Io(String),
}
