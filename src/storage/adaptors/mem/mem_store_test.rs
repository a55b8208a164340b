use super::*;
use crate::KvStore;
use crate::RemoteSignal;

#[test]
fn test_set_and_get_roundtrip() {
    let store = MemoryStore::new();

    store.set("a", "1").unwrap();

    assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
    assert!(store.has("a").unwrap());
    assert!(!store.has("b").unwrap());
}

#[test]
fn test_mutation_is_announced_to_other_contexts_only() {
    let backing = MemoryBacking::new();
    let (tab1, mut rx1) = backing.context();
    let (_tab2, mut rx2) = backing.context();

    tab1.set("k", "v").unwrap();

    assert!(rx1.try_recv().is_err(), "origin must not hear its own mutation");
    assert_eq!(
        rx2.try_recv().unwrap(),
        RemoteSignal::Changed {
            key: "k".to_string(),
            new_value: Some("v".to_string()),
            old_value: None,
        }
    );
}

#[test]
fn test_contexts_share_the_same_data() {
    let backing = MemoryBacking::new();
    let (tab1, _rx1) = backing.context();
    let (tab2, _rx2) = backing.context();

    tab1.set("shared", "yes").unwrap();

    assert_eq!(tab2.get("shared").unwrap(), Some("yes".to_string()));
}

#[test]
fn test_unchanged_value_is_not_announced() {
    let backing = MemoryBacking::new();
    let (tab1, _rx1) = backing.context();
    let (_tab2, mut rx2) = backing.context();

    tab1.set("k", "v").unwrap();
    rx2.try_recv().unwrap();

    tab1.set("k", "v").unwrap();
    tab1.remove("missing").unwrap();

    assert!(rx2.try_recv().is_err());
}

#[test]
fn test_remove_announces_old_value() {
    let backing = MemoryBacking::new();
    let (tab1, _rx1) = backing.context();
    let (_tab2, mut rx2) = backing.context();
    tab1.set("k", "old").unwrap();
    rx2.try_recv().unwrap();

    tab1.remove("k").unwrap();

    assert_eq!(
        rx2.try_recv().unwrap(),
        RemoteSignal::Changed {
            key: "k".to_string(),
            new_value: None,
            old_value: Some("old".to_string()),
        }
    );
}

#[test]
fn test_clear_announces_without_manifest() {
    let backing = MemoryBacking::new();
    let (tab1, _rx1) = backing.context();
    let (_tab2, mut rx2) = backing.context();
    tab1.set("a", "1").unwrap();
    tab1.set("b", "2").unwrap();
    while rx2.try_recv().is_ok() {}

    tab1.clear().unwrap();

    assert_eq!(rx2.try_recv().unwrap(), RemoteSignal::Cleared);
    assert!(tab1.keys().unwrap().is_empty());

    // Clearing an empty store says nothing
    tab1.clear().unwrap();
    assert!(rx2.try_recv().is_err());
}

#[test]
fn test_dropped_receivers_are_pruned() {
    let backing = MemoryBacking::new();
    let (tab1, _rx1) = backing.context();
    let (_tab2, rx2) = backing.context();
    assert_eq!(backing.context_count(), 2);

    drop(rx2);
    tab1.set("k", "v").unwrap();

    assert_eq!(backing.context_count(), 1);
}

#[test]
fn test_entries_returns_full_copy() {
    let store = MemoryStore::new();
    store.set("b", "2").unwrap();
    store.set("a", "1").unwrap();

    let entries = store.entries().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn test_store_opens_sibling_context_through_its_backing() {
    let store = MemoryStore::new();
    let (sibling, mut sibling_rx) = store.backing().context();

    assert_ne!(store.context_id(), sibling.context_id());
    assert!(std::sync::Arc::ptr_eq(store.backing(), sibling.backing()));

    store.set("k", "v").unwrap();

    assert_eq!(sibling.get("k").unwrap().as_deref(), Some("v"));
    assert!(matches!(
        sibling_rx.try_recv().unwrap(),
        RemoteSignal::Changed { ref key, .. } if key == "k"
    ));
}
