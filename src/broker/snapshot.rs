//! Shadow snapshot of the whole store.
//!
//! The host's clear primitives never say what they removed, so the broker
//! keeps its own copy of the last observed contents and diffs against it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use super::ChangeEvent;
use super::EventOrigin;
use crate::KvStore;
use crate::StoreSnapshot;

#[derive(Debug)]
pub struct ShadowSnapshot {
    entries: ArcSwap<StoreSnapshot>,
}

impl ShadowSnapshot {
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(StoreSnapshot::new()),
        }
    }

    /// Re-reads the entire store, replacing the previous contents.
    ///
    /// An unreadable store leaves the snapshot untouched.
    pub fn refresh(
        &self,
        store: &dyn KvStore,
    ) {
        match store.entries() {
            Ok(entries) => self.entries.store(Arc::new(entries)),
            Err(e) => debug!("shadow snapshot refresh skipped: {:?}", e),
        }
    }

    /// Applies one change to the snapshot without reading the store.
    ///
    /// Remote signals are applied in delivery order; re-reading the shared
    /// store would expose mutations whose signals are still queued.
    pub fn apply(
        &self,
        event: &ChangeEvent,
    ) {
        self.entries.rcu(|current| {
            let mut next = StoreSnapshot::clone(current);
            match &event.new_value {
                Some(value) => next.insert(event.key.clone(), value.clone()),
                None => next.remove(&event.key),
            };
            next
        });
    }

    /// Last observed contents.
    pub fn load(&self) -> Arc<StoreSnapshot> {
        self.entries.load_full()
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<String> {
        self.entries.load().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ShadowSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// One event per key whose value differs between `prior` and `current`,
/// in ascending key order.
pub fn diff_snapshots(
    prior: &StoreSnapshot,
    current: &StoreSnapshot,
    origin: EventOrigin,
) -> Vec<ChangeEvent> {
    let mut events = Vec::new();

    for (key, old) in prior {
        let new = current.get(key);
        if new != Some(old) {
            events.push(ChangeEvent::new(key.clone(), new.cloned(), Some(old.clone()), origin));
        }
    }
    for (key, new) in current {
        if !prior.contains_key(key) {
            events.push(ChangeEvent::new(key.clone(), Some(new.clone()), None, origin));
        }
    }

    events.sort_by(|a, b| a.key.cmp(&b.key));
    events
}
