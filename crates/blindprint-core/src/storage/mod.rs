//! Feature vector storage
//!
//! Keyed store mapping a label to a quantized [`PlainVector`]. The protocol
//! only reads from it; enrollment and deletion are administrative
//! operations. The trait is synchronous, like the rest of the pipeline.

mod error;
mod memory;
mod redb;

pub use error::StorageError;
pub use memory::MemoryFeatureStore;

pub use self::redb::RedbFeatureStore;
use crate::vector::{LabeledVector, PlainVector};

/// Storage abstraction for enrolled feature vectors.
///
/// Must be Clone (handed to the server and to admin tooling), Send + Sync
/// (read from worker threads). Implementations share internal state via
/// Arc, so clones see the same data.
pub trait FeatureStore: Clone + Send + Sync + 'static {
    /// Insert or replace the vector stored under `label`.
    fn insert(&self, label: &str, vector: &PlainVector) -> Result<(), StorageError>;

    /// Vector stored under `label`, or `None`.
    fn get(&self, label: &str) -> Result<Option<PlainVector>, StorageError>;

    /// Remove the entry under `label`. Returns whether it existed.
    fn delete(&self, label: &str) -> Result<bool, StorageError>;

    /// All labels in lexicographic order.
    fn labels(&self) -> Result<Vec<String>, StorageError>;

    /// Every entry, in label order.
    ///
    /// The order returned here is the database order the distance pipeline
    /// reports results in.
    fn load_all(&self) -> Result<Vec<LabeledVector>, StorageError>;

    /// Number of enrolled entries.
    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.labels()?.len())
    }

    /// True if nothing is enrolled.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}
