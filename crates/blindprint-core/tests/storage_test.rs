//! Feature store tests
//!
//! - Memory and redb stores agree on any sequence of inserts and deletes
//! - Redb contents survive reopening the database
//! - The match pipeline runs unchanged over a redb store

use std::collections::BTreeMap;

use blindprint_core::{
    ClientSession, DistanceMode, FeatureStore, KeyConfig, LabeledResult, MatchServer,
    MemoryFeatureStore, PlainVector, ProtocolConfig, RedbFeatureStore, run_match,
};
use blindprint_crypto::BigInt;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tempfile::tempdir;

#[derive(Debug, Clone)]
enum Op {
    Insert(String, Vec<i64>),
    Delete(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let label = prop::sample::select(vec!["fp_001", "fp_002", "fp_003", "fp_004"])
        .prop_map(str::to_string);
    prop_oneof![
        (label.clone(), prop::collection::vec(any::<i64>(), 0..16))
            .prop_map(|(l, v)| Op::Insert(l, v)),
        label.prop_map(Op::Delete),
    ]
}

/// Apply `op` to `store` and to the reference model.
fn apply(store: &impl FeatureStore, model: &mut BTreeMap<String, PlainVector>, op: &Op) {
    match op {
        Op::Insert(label, values) => {
            let vector = PlainVector::new(values.clone());
            store.insert(label, &vector).unwrap();
            model.insert(label.clone(), vector);
        },
        Op::Delete(label) => {
            let existed = store.delete(label).unwrap();
            assert_eq!(existed, model.remove(label).is_some());
        },
    }
}

fn assert_matches_model(store: &impl FeatureStore, model: &BTreeMap<String, PlainVector>) {
    let entries = store.load_all().unwrap();
    let expected: Vec<_> = model.iter().map(|(l, v)| (l.clone(), v.clone())).collect();
    let actual: Vec<_> = entries.into_iter().map(|e| (e.label, e.vector)).collect();

    assert_eq!(actual, expected);
    assert_eq!(store.labels().unwrap(), model.keys().cloned().collect::<Vec<_>>());
}

#[test]
fn prop_stores_follow_model() {
    let config = ProptestConfig::with_cases(32);
    proptest!(config, |(ops in prop::collection::vec(op_strategy(), 1..40))| {
        let dir = tempdir().unwrap();
        let redb = RedbFeatureStore::open(dir.path().join("features.redb")).unwrap();
        let memory = MemoryFeatureStore::new();
        let mut redb_model = BTreeMap::new();
        let mut memory_model = BTreeMap::new();

        for op in &ops {
            apply(&redb, &mut redb_model, op);
            apply(&memory, &mut memory_model, op);
        }

        assert_matches_model(&redb, &redb_model);
        assert_matches_model(&memory, &memory_model);
    });
}

#[test]
fn redb_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.redb");

    {
        let store = RedbFeatureStore::open(&path).unwrap();
        store.insert("fp_001", &PlainVector::new(vec![1, -2, 3])).unwrap();
        store.insert("fp_002", &PlainVector::new(vec![4, 5, 6])).unwrap();
        assert!(store.delete("fp_002").unwrap());
    }

    let reopened = RedbFeatureStore::open(&path).unwrap();

    assert_eq!(reopened.labels().unwrap(), ["fp_001"]);
    assert_eq!(reopened.get("fp_001").unwrap(), Some(PlainVector::new(vec![1, -2, 3])));
}

#[test]
fn match_over_redb_store() {
    let dir = tempdir().unwrap();
    let store = RedbFeatureStore::open(dir.path().join("features.redb")).unwrap();
    store.insert("left", &PlainVector::new(vec![0, 0])).unwrap();
    store.insert("right", &PlainVector::new(vec![3, 4])).unwrap();

    let config = ProtocolConfig {
        key: KeyConfig { modulus_bits: 256 },
        mode: DistanceMode::Corrected,
        ..Default::default()
    };
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let session = ClientSession::start(config, &mut rng).unwrap();
    let server = MatchServer::new(store, config);

    let results = run_match(&session, &server, &PlainVector::new(vec![0, 0]), &mut rng).unwrap();

    assert_eq!(
        results,
        vec![LabeledResult::ok("left", BigInt::from(0)), LabeledResult::ok("right", BigInt::from(25))]
    );
}
