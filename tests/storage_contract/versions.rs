//! Collection timestamps and their durability

use crate::common::*;
use std::sync::Arc;
use syncstore::{ManualClock, MemoryBackend, SqliteBackend};

const C: &str = "notes";
const P: &str = "alice";

#[test]
fn timestamp_strictly_increases_on_each_mutation() {
    for store in TestStore::all() {
        let options = WriteOptions::new();
        let mut last = store.collection_timestamp(C, P).unwrap();
        let mut check = |store: &TestStore, label: &str| {
            let now = store.collection_timestamp(C, P).unwrap();
            assert!(now > last, "{} {}: {} <= {}", store.name, label, now, last);
            last = now;
        };

        let a = store.create(C, P, rec(json!({"n": 1})), &options).unwrap();
        check(&store, "create");
        store.update(C, P, &id_of(&a), rec(json!({"n": 2})), &options).unwrap();
        check(&store, "update");
        store.create(C, P, rec(json!({"id": "b"})), &options).unwrap();
        check(&store, "create b");
        store.delete(C, P, "b", &DeleteOptions::new()).unwrap();
        check(&store, "delete");
        store.delete_all(C, P, &[], &DeleteOptions::new()).unwrap();
        check(&store, "delete_all");
    }
}

#[test]
fn reads_and_failed_writes_do_not_move_timestamp() {
    for store in TestStore::all() {
        let options = WriteOptions::new().unique_fields(["k"]);
        store.create(C, P, rec(json!({"k": 1})), &options).unwrap();
        let before = store.collection_timestamp(C, P).unwrap();

        store.get_all(C, P, &GetAllQuery::new()).unwrap();
        assert!(store.create(C, P, rec(json!({"k": 1})), &options).is_err());
        assert!(store.delete(C, P, "missing", &DeleteOptions::new()).is_err());
        assert_eq!(store.purge_deleted(C, P, None).unwrap(), 0);

        assert_eq!(store.collection_timestamp(C, P).unwrap(), before, "{}", store.name);
    }
}

#[test]
fn timestamp_survives_purge() {
    for store in TestStore::all() {
        store
            .create(C, P, rec(json!({"id": "a"})), &WriteOptions::new())
            .unwrap();
        let deleted = store.delete(C, P, "a", &DeleteOptions::new()).unwrap();
        store.purge_deleted(C, P, None).unwrap();
        assert_eq!(
            store.collection_timestamp(C, P).unwrap(),
            version_of(&deleted),
            "{}",
            store.name
        );
    }
}

#[test]
fn collections_have_independent_timestamps() {
    let clock = Arc::new(ManualClock::new(5_000));
    let storage = StorageEngine::new(MemoryBackend::new()).with_clock(clock.clone());
    let options = WriteOptions::new();

    storage.create("a", P, rec(json!({})), &options).unwrap();
    storage.create("a", P, rec(json!({})), &options).unwrap();
    assert_eq!(storage.collection_timestamp("a", P).unwrap(), 5_001);

    // Same millisecond, other collection: starts from the clock
    storage.create("b", P, rec(json!({})), &options).unwrap();
    assert_eq!(storage.collection_timestamp("b", P).unwrap(), 5_000);
}

#[test]
fn clock_regression_does_not_reuse_versions() {
    let clock = Arc::new(ManualClock::new(10_000));
    let storage = StorageEngine::new(MemoryBackend::new()).with_clock(clock.clone());
    let options = WriteOptions::new();

    let first = storage.create(C, P, rec(json!({})), &options).unwrap();
    clock.set(1_000);
    let second = storage.create(C, P, rec(json!({})), &options).unwrap();
    assert_eq!(version_of(&second), version_of(&first) + 1);
}

#[test]
fn sqlite_high_water_survives_restart_with_slow_clock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    let last = {
        let clock = Arc::new(ManualClock::new(50_000));
        let storage = StorageEngine::new(SqliteBackend::open(&path).unwrap()).with_clock(clock);
        storage.initialize_schema().unwrap();
        let r = storage
            .create(C, P, rec(json!({"id": "a"})), &WriteOptions::new())
            .unwrap();
        version_of(&storage.delete(C, P, &id_of(&r), &DeleteOptions::hard()).unwrap())
    };

    // A restarted process whose clock lags behind
    let clock = Arc::new(ManualClock::new(10));
    let storage = StorageEngine::new(SqliteBackend::open(&path).unwrap()).with_clock(clock);
    storage.initialize_schema().unwrap();
    assert_eq!(storage.collection_timestamp(C, P).unwrap(), last);
    let next = storage
        .create(C, P, rec(json!({})), &WriteOptions::new())
        .unwrap();
    assert_eq!(version_of(&next), last + 1);
}
