use tempfile::tempdir;

use super::*;
use crate::KvStore;

#[test]
fn test_open_creates_empty_store() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path().join("nested/store.bin")).unwrap();

    assert!(store.keys().unwrap().is_empty());
}

#[test]
fn test_values_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.bin");

    {
        let store = FileStore::open(&path).unwrap();
        store.set("user:1", "alice").unwrap();
        store.set("user:2", "bob").unwrap();
        store.remove("user:2").unwrap();
    }

    let reopened = FileStore::open(&path).unwrap();
    assert_eq!(reopened.get("user:1").unwrap(), Some("alice".to_string()));
    assert_eq!(reopened.get("user:2").unwrap(), None);
}

#[test]
fn test_clear_is_persisted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.bin");

    let store = FileStore::open(&path).unwrap();
    store.set("a", "1").unwrap();
    store.clear().unwrap();
    drop(store);

    let reopened = FileStore::open(&path).unwrap();
    assert!(reopened.entries().unwrap().is_empty());
}

#[test]
fn test_corrupted_image_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.bin");
    std::fs::write(&path, [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]).unwrap();

    let result = FileStore::open(&path);

    assert!(matches!(
        result,
        Err(crate::Error::Storage(crate::StorageError::BincodeError(_)))
    ));
}

#[test]
fn test_failed_persist_keeps_previous_state() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    let store = FileStore::open(sub.join("store.bin")).unwrap();
    store.set("k", "old").unwrap();
    store.set("gone", "x").unwrap();

    std::fs::remove_dir_all(&sub).unwrap();

    assert!(matches!(
        store.set("k", "new"),
        Err(crate::Error::Storage(crate::StorageError::IoError(_)))
    ));
    assert!(store.remove("gone").is_err());
    assert!(store.clear().is_err());

    assert_eq!(store.get("k").unwrap().as_deref(), Some("old"));
    assert_eq!(store.get("gone").unwrap().as_deref(), Some("x"));
    assert_eq!(store.keys().unwrap().len(), 2);
}
