use std::sync::Arc;

use super::*;
use crate::Error;
use crate::StorageError;

/// Implements only the required methods so the provided ones are exercised.
struct MinimalStore {
    data: parking_lot::Mutex<StoreSnapshot>,
}

impl KvStore for MinimalStore {
    fn get(
        &self,
        key: &str,
    ) -> crate::Result<Option<String>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> crate::Result<()> {
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(
        &self,
        key: &str,
    ) -> crate::Result<()> {
        self.data.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> crate::Result<()> {
        self.data.lock().clear();
        Ok(())
    }

    fn keys(&self) -> crate::Result<Vec<String>> {
        Ok(self.data.lock().keys().cloned().collect())
    }
}

#[test]
fn test_provided_methods_build_on_required_ones() {
    let store = MinimalStore {
        data: parking_lot::Mutex::new(StoreSnapshot::new()),
    };
    store.set("a", "1").unwrap();
    store.set("b", "2").unwrap();

    let entries = store.entries().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries.get("a").map(String::as_str), Some("1"));
    assert!(store.has("b").unwrap());
    assert!(!store.has("c").unwrap());
    assert!(store.interceptable());
}

#[test]
fn test_arc_store_delegates() {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

    store.set("k", "v").unwrap();

    assert!(store.has("k").unwrap());
    assert_eq!(store.entries().unwrap().len(), 1);
    assert!(store.interceptable());
}

#[test]
fn test_unavailable_store_denies_everything() {
    let store = UnavailableStore::new("private browsing");

    assert!(matches!(
        store.get("k"),
        Err(Error::Storage(StorageError::Unavailable(_)))
    ));
    assert!(store.set("k", "v").is_err());
    assert!(store.entries().is_err());
    assert!(store.interceptable());
}
