use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use super::{FeatureStore, StorageError};
use crate::vector::{LabeledVector, PlainVector};

/// In-memory feature store for tests and one-shot runs.
///
/// `BTreeMap` keeps labels sorted, which fixes the database order. Uses
/// `lock().expect()`, which panics only if another thread panicked while
/// holding the lock.
#[derive(Clone, Default)]
pub struct MemoryFeatureStore {
    inner: Arc<Mutex<BTreeMap<String, PlainVector>>>,
}

impl MemoryFeatureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `entries`. Later duplicates win.
    pub fn with_entries(entries: impl IntoIterator<Item = LabeledVector>) -> Self {
        let map = entries.into_iter().map(|e| (e.label, e.vector)).collect();
        Self { inner: Arc::new(Mutex::new(map)) }
    }
}

#[allow(clippy::expect_used)]
impl FeatureStore for MemoryFeatureStore {
    fn insert(&self, label: &str, vector: &PlainVector) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        inner.insert(label.to_string(), vector.clone());
        Ok(())
    }

    fn get(&self, label: &str) -> Result<Option<PlainVector>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");
        Ok(inner.get(label).cloned())
    }

    fn delete(&self, label: &str) -> Result<bool, StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        Ok(inner.remove(label).is_some())
    }

    fn labels(&self) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");
        Ok(inner.keys().cloned().collect())
    }

    fn load_all(&self) -> Result<Vec<LabeledVector>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");
        Ok(inner
            .iter()
            .map(|(label, vector)| LabeledVector { label: label.clone(), vector: vector.clone() })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let store = MemoryFeatureStore::new();
        let v = PlainVector::new(vec![1, 2, 3]);

        store.insert("fp_001", &v).unwrap();

        assert_eq!(store.get("fp_001").unwrap(), Some(v));
        assert_eq!(store.get("fp_002").unwrap(), None);
    }

    #[test]
    fn insert_replaces_existing_label() {
        let store = MemoryFeatureStore::new();
        store.insert("fp", &PlainVector::new(vec![1])).unwrap();
        store.insert("fp", &PlainVector::new(vec![2])).unwrap();

        assert_eq!(store.get("fp").unwrap(), Some(PlainVector::new(vec![2])));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn delete_reports_existence() {
        let store = MemoryFeatureStore::with_entries([LabeledVector::new("fp", vec![1])]);

        assert!(store.delete("fp").unwrap());
        assert!(!store.delete("fp").unwrap());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn load_all_is_label_ordered() {
        let store = MemoryFeatureStore::with_entries([
            LabeledVector::new("c", vec![3]),
            LabeledVector::new("a", vec![1]),
            LabeledVector::new("b", vec![2]),
        ]);

        let labels: Vec<_> = store.load_all().unwrap().into_iter().map(|e| e.label).collect();
        assert_eq!(labels, ["a", "b", "c"]);
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryFeatureStore::new();
        let clone = store.clone();

        clone.insert("fp", &PlainVector::new(vec![9])).unwrap();

        assert_eq!(store.labels().unwrap(), vec!["fp".to_string()]);
    }
}
