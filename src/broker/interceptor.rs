//! Mutation interception
//!
//! The host never reports a context's own mutations back to it. Wrapping the
//! store's `set`/`remove`/`clear` once, at broker construction, lets the
//! broker observe every same-context mutator that goes through the wrapper:
//!
//! ```text
//! set/remove:  old = get(key) -> real op -> current = get(key)
//!              current != old  => dispatch (key, current, old)
//! clear:       before = entries() -> real clear -> after = entries()
//!              dispatch one removal per key of `before`
//! both:        refresh shadow snapshot, request a render refresh
//! ```
//!
//! Errors raised by the real operation propagate unchanged.

use std::sync::Arc;

use super::diff_snapshots;
use super::local_change;
use super::BrokerInner;
use super::EventOrigin;
use crate::constants::ORIGIN_LOCAL;
use crate::metrics::RECONSTRUCTED_CLEAR_KEYS;
use crate::KvStore;
use crate::Result;
use crate::StoreSnapshot;

/// The broker's decorated view of the injected store.
///
/// Cheap to clone; every clone reports into the same broker.
#[derive(Clone)]
pub struct InterceptedStore {
    pub(super) inner: Arc<BrokerInner>,
}

impl std::fmt::Debug for InterceptedStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("InterceptedStore")
            .field("intercepting", &self.inner.intercepting)
            .finish_non_exhaustive()
    }
}

impl InterceptedStore {
    pub fn is_intercepting(&self) -> bool {
        self.inner.intercepting
    }

    fn intercept(
        &self,
        key: &str,
        op: impl FnOnce(&dyn KvStore) -> Result<()>,
    ) -> Result<()> {
        let store = self.inner.store.as_ref();

        let old = store.get(key)?;
        op(store)?;
        let current = store.get(key)?;

        let event = local_change(key, current, old);
        let changed = event.is_some();
        if let Some(event) = event {
            self.inner.publish(vec![event]);
        }

        self.inner.refresh_snapshot();
        if changed {
            self.inner.scheduler.ensure_refresh();
        }
        Ok(())
    }
}

impl KvStore for InterceptedStore {
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        self.inner.store.get(key)
    }

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        if !self.inner.intercepting {
            return self.inner.store.set(key, value);
        }
        self.intercept(key, |store| store.set(key, value))
    }

    fn remove(
        &self,
        key: &str,
    ) -> Result<()> {
        if !self.inner.intercepting {
            return self.inner.store.remove(key);
        }
        self.intercept(key, |store| store.remove(key))
    }

    fn clear(&self) -> Result<()> {
        if !self.inner.intercepting {
            return self.inner.store.clear();
        }

        let store = self.inner.store.as_ref();
        let before = store.entries()?;
        store.clear()?;
        let after = store.entries().unwrap_or_else(|_| StoreSnapshot::new());

        let events = diff_snapshots(&before, &after, EventOrigin::Local);
        RECONSTRUCTED_CLEAR_KEYS
            .with_label_values(&[ORIGIN_LOCAL])
            .inc_by(events.len() as u64);

        let changed = !events.is_empty();
        self.inner.publish(events);

        self.inner.refresh_snapshot();
        if changed {
            self.inner.scheduler.ensure_refresh();
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.inner.store.keys()
    }

    fn has(
        &self,
        key: &str,
    ) -> Result<bool> {
        self.inner.store.has(key)
    }

    fn entries(&self) -> Result<StoreSnapshot> {
        self.inner.store.entries()
    }

    fn interceptable(&self) -> bool {
        self.inner.store.interceptable()
    }
}
