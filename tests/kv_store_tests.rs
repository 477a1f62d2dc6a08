// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use budgetvault::error::KvError;
use budgetvault::store::{FileStorage, FlatStorage, KeyValueStore, MemoryStorage};

#[test]
fn values_round_trip_as_json() {
    let kv = KeyValueStore::in_memory(1024);
    assert!(kv.set("k", &vec![1, 2, 3]));
    assert_eq!(kv.get::<Vec<i32>>("k"), Some(vec![1, 2, 3]));
    assert!(kv.contains("k"));
    assert!(kv.remove("k"));
    assert!(!kv.contains("k"));
    assert_eq!(kv.get::<Vec<i32>>("k"), None);
}

#[test]
fn quota_rejection_keeps_previous_value() {
    let kv = KeyValueStore::in_memory(32);
    assert!(kv.set("a", "small"));
    assert!(!kv.set("a", &"x".repeat(64)));
    assert_eq!(kv.get::<String>("a").as_deref(), Some("small"));
}

#[test]
fn quota_error_reports_sizes() {
    let storage = MemoryStorage::new(10);
    let err = storage.write("key", "0123456789").unwrap_err();
    assert!(matches!(err, KvError::QuotaExceeded { needed: 13, quota: 10 }));
}

#[test]
fn replacing_a_value_counts_only_the_new_size() {
    let storage = MemoryStorage::new(10);
    storage.write("k", "123456789").unwrap();
    storage.write("k", "987654321").unwrap();
    assert_eq!(storage.read("k").unwrap().as_deref(), Some("987654321"));
}

#[test]
fn undecodable_value_reads_as_none() {
    let storage = Arc::new(MemoryStorage::new(1024));
    storage.write("k", "not json").unwrap();
    let kv = KeyValueStore::new(storage);
    assert_eq!(kv.get::<i32>("k"), None);
    assert!(kv.contains("k"));
}

#[test]
fn file_storage_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.json");
    {
        let kv = KeyValueStore::new(Arc::new(FileStorage::open(&path, 4096).unwrap()));
        assert!(kv.set("a", &42));
        assert!(kv.set("b", "gone soon"));
        assert!(kv.remove("b"));
    }
    let reopened = FileStorage::open(&path, 4096).unwrap();
    assert_eq!(reopened.keys().unwrap(), vec!["a".to_string()]);
    assert!(!path.with_extension("json.partial").exists());

    let kv = KeyValueStore::new(Arc::new(reopened));
    assert_eq!(kv.get::<i32>("a"), Some(42));
}

#[test]
fn file_storage_rejects_over_quota_without_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.json");
    let storage = FileStorage::open(&path, 16).unwrap();
    assert!(storage.write("big", &"y".repeat(32)).is_err());
    assert!(!path.exists());
}

#[test]
fn corrupt_file_storage_is_set_aside_and_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.json");
    std::fs::write(&path, r#"{"budgetvault.settings": "[{\"id\":1"#).unwrap();

    let storage = FileStorage::open(&path, 4096).unwrap();
    assert!(storage.keys().unwrap().is_empty());
    let moved: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("kv.json.corrupt-"))
        .collect();
    assert_eq!(moved.len(), 1);

    let kv = KeyValueStore::new(Arc::new(storage));
    assert!(kv.set("a", &1));
    let reopened = FileStorage::open(&path, 4096).unwrap();
    assert_eq!(reopened.keys().unwrap(), vec!["a".to_string()]);
}
