//! Phase 1 tests: hash stores and bucket storage backends.

use std::sync::Arc;

use serde_json::json;

use rowcache::store::{connect, Dsn, HashStore, Lz4JsonCodec, MemoryHashStore};
use rowcache::types::{row_from, Buckets, IndexEntry};
use rowcache::{open_backend, ArrayStorage, BackendKind, SharedStorage, StorageBackend};

// ==================== Helpers ====================

fn entry(id: &str, position: u64) -> IndexEntry {
    IndexEntry::new(row_from([("id", json!(id)), ("pos", json!(position))]), position)
}

fn sample_buckets() -> Buckets {
    let mut buckets = Buckets::new();
    buckets.insert("a".to_string(), vec![entry("a", 0), entry("a", 3)]);
    buckets.insert("b".to_string(), vec![entry("b", 1)]);
    buckets.insert("c".to_string(), vec![entry("c", 2)]);
    buckets
}

/// Both backend kinds over fresh state; the shared one on an in-process hash store.
fn backends() -> Vec<Box<dyn StorageBackend>> {
    let store: Arc<dyn HashStore> = Arc::new(MemoryHashStore::new());
    vec![
        Box::new(ArrayStorage::new()),
        Box::new(SharedStorage::new(store, "rowcache:test:products")),
    ]
}

// ==================== Backend contract ====================

#[test]
fn test_hydrate_and_fetch() {
    for mut backend in backends() {
        backend.hydrate(sample_buckets()).unwrap();
        assert_eq!(backend.count().unwrap(), 3, "{}", backend.label());

        let a = backend.fetch("a").unwrap().unwrap();
        assert_eq!(a, vec![entry("a", 0), entry("a", 3)]);
        assert!(backend.fetch("zzz").unwrap().is_none());
    }
}

#[test]
fn test_hydrate_replaces_snapshot() {
    for mut backend in backends() {
        backend.hydrate(sample_buckets()).unwrap();

        let mut next = Buckets::new();
        next.insert("x".to_string(), vec![entry("x", 9)]);
        backend.hydrate(next).unwrap();

        assert_eq!(backend.count().unwrap(), 1, "{}", backend.label());
        assert!(backend.fetch("a").unwrap().is_none());
        assert_eq!(backend.fetch("x").unwrap().unwrap(), vec![entry("x", 9)]);
    }
}

#[test]
fn test_fetch_many_omits_missing() {
    for mut backend in backends() {
        backend.hydrate(sample_buckets()).unwrap();
        let ids = vec!["c".to_string(), "missing".to_string(), "a".to_string()];
        let found = backend.fetch_many(&ids).unwrap();

        let keys: Vec<&str> = found.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["c", "a"], "{}", backend.label());
        assert!(!found.contains_key("missing"));
    }
}

#[test]
fn test_all_and_clear() {
    for mut backend in backends() {
        backend.hydrate(sample_buckets()).unwrap();
        let all = backend.all().unwrap();
        assert_eq!(all, sample_buckets(), "{}", backend.label());

        backend.clear().unwrap();
        assert_eq!(backend.count().unwrap(), 0);
        assert!(backend.all().unwrap().is_empty());
    }
}

#[test]
fn test_backend_labels() {
    let labels: Vec<&str> = backends().iter().map(|b| b.label()).collect();
    assert_eq!(labels, vec!["in-process", "shared"]);

    let store: Arc<dyn HashStore> = Arc::new(MemoryHashStore::new());
    assert_eq!(open_backend(BackendKind::InProcess).label(), "in-process");
    assert_eq!(open_backend(BackendKind::shared(store, "k")).label(), "shared");
}

// ==================== Shared storage specifics ====================

#[test]
fn test_shared_storage_one_field_per_bucket() {
    let store = Arc::new(MemoryHashStore::new());
    let mut backend = SharedStorage::new(store.clone(), "rowcache:run:idx");
    backend.hydrate(sample_buckets()).unwrap();

    assert_eq!(store.field_count("rowcache:run:idx").unwrap(), 3);
    let raw = store.get_field("rowcache:run:idx", "b").unwrap().unwrap();
    let decoded: Vec<IndexEntry> = serde_json::from_slice(&raw).unwrap();
    assert_eq!(decoded, vec![entry("b", 1)]);
}

#[test]
fn test_shared_storage_keys_are_isolated() {
    let store: Arc<dyn HashStore> = Arc::new(MemoryHashStore::new());
    let mut first = SharedStorage::new(store.clone(), "rowcache:run-a:idx");
    let second = SharedStorage::new(store, "rowcache:run-b:idx");

    first.hydrate(sample_buckets()).unwrap();
    assert_eq!(second.count().unwrap(), 0);
    assert!(second.fetch("a").unwrap().is_none());
}

#[test]
fn test_shared_storage_custom_codec() {
    let store = Arc::new(MemoryHashStore::new());
    let mut backend = SharedStorage::with_codec(store.clone(), "k", Arc::new(Lz4JsonCodec));
    backend.hydrate(sample_buckets()).unwrap();

    assert_eq!(backend.fetch("a").unwrap().unwrap().len(), 2);
    let raw = store.get_field("k", "a").unwrap().unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&raw).is_err());
}

// ==================== Connection bootstrap ====================

#[test]
fn test_unreachable_backend_fails() {
    // Port 1 on localhost refuses connections.
    let result = connect(Some("redis://127.0.0.1:1?timeout=0.2"));
    assert!(matches!(result, Err(rowcache::CacheError::Backend(_))));
}

#[test]
fn test_dsn_round_trip_to_client_url() {
    let dsn = Dsn::parse("redis://:pw@127.0.0.1:6390?db=5").unwrap();
    assert_eq!(dsn.connection_url().unwrap(), "redis://:pw@127.0.0.1:6390/5");
}

/// Runs only when ROWCACHE_TEST_REDIS_DSN points at a live server.
#[test]
fn test_live_redis_backend() {
    let Ok(raw) = std::env::var("ROWCACHE_TEST_REDIS_DSN") else {
        return;
    };
    let store: Arc<dyn HashStore> = Arc::new(connect(Some(&raw)).unwrap().unwrap());
    let key = format!("rowcache:test:{}:phase1", rowcache::generate_run_key());

    let mut backend = SharedStorage::new(store.clone(), key.clone());
    backend.hydrate(sample_buckets()).unwrap();
    assert_eq!(backend.count().unwrap(), 3);
    assert_eq!(backend.fetch("b").unwrap().unwrap(), vec![entry("b", 1)]);

    let ids = vec!["a".to_string(), "nope".to_string()];
    assert_eq!(backend.fetch_many(&ids).unwrap().len(), 1);

    backend.clear().unwrap();
    assert_eq!(store.field_count(&key).unwrap(), 0);
}
