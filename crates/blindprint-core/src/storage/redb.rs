//! Redb-backed durable feature store.
//!
//! One table keyed by label. Redb's B-tree iterates keys in order, so
//! `load_all` returns entries in label order without sorting.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};

use super::{FeatureStore, StorageError};
use crate::vector::{LabeledVector, PlainVector};

/// Table: features
/// Key: entry label (UTF-8)
/// Value: CBOR-encoded PlainVector
const FEATURES: TableDefinition<&str, &[u8]> = TableDefinition::new("features");

/// Durable feature store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbFeatureStore {
    db: Arc<Database>,
}

impl RedbFeatureStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the FEATURES table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(FEATURES).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        tracing::debug!(path = %path.as_ref().display(), "opened feature store");

        Ok(Self { db: Arc::new(db) })
    }
}

fn encode_vector(vector: &PlainVector) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::with_capacity(vector.len() * 5);
    ciborium::into_writer(vector, &mut bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode_vector(bytes: &[u8]) -> Result<PlainVector, StorageError> {
    ciborium::from_reader(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

impl FeatureStore for RedbFeatureStore {
    fn insert(&self, label: &str, vector: &PlainVector) -> Result<(), StorageError> {
        let bytes = encode_vector(vector)?;

        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table =
                txn.open_table(FEATURES).map_err(|e| StorageError::Io(e.to_string()))?;
            table
                .insert(label, bytes.as_slice())
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    fn get(&self, label: &str) -> Result<Option<PlainVector>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(FEATURES).map_err(|e| StorageError::Io(e.to_string()))?;

        match table.get(label).map_err(|e| StorageError::Io(e.to_string()))? {
            Some(value) => Ok(Some(decode_vector(value.value())?)),
            None => Ok(None),
        }
    }

    fn delete(&self, label: &str) -> Result<bool, StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        let existed = {
            let mut table =
                txn.open_table(FEATURES).map_err(|e| StorageError::Io(e.to_string()))?;
            let removed = table.remove(label).map_err(|e| StorageError::Io(e.to_string()))?;
            removed.is_some()
        };
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(existed)
    }

    fn labels(&self) -> Result<Vec<String>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(FEATURES).map_err(|e| StorageError::Io(e.to_string()))?;

        let mut labels = Vec::new();
        for result in table.iter().map_err(|e| StorageError::Io(e.to_string()))? {
            let (key, _) = result.map_err(|e| StorageError::Io(e.to_string()))?;
            labels.push(key.value().to_string());
        }

        Ok(labels)
    }

    fn load_all(&self) -> Result<Vec<LabeledVector>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(FEATURES).map_err(|e| StorageError::Io(e.to_string()))?;

        let mut entries = Vec::new();
        for result in table.iter().map_err(|e| StorageError::Io(e.to_string()))? {
            let (key, value) = result.map_err(|e| StorageError::Io(e.to_string()))?;
            entries.push(LabeledVector {
                label: key.value().to_string(),
                vector: decode_vector(value.value())?,
            });
        }

        tracing::debug!(entries = entries.len(), "loaded feature vectors");

        Ok(entries)
    }
}
