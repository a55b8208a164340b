//! Watch Registry
//!
//! Owns every active subscription and dispatches [`ChangeEvent`]s to the
//! ones whose namespace and pattern match the changed key.
//!
//! # Dispatch policy
//!
//! A pass snapshots the subscriber list first (so callbacks may freely
//! register, unregister or mutate the store), then checks each
//! subscription's `active` flag right before invoking it. A subscription
//! removed while a pass is in flight is therefore never invoked again.
//!
//! # Failure isolation
//!
//! Callbacks run under `catch_unwind`. A panicking callback is reported as a
//! [`SubscriberError`] on the error log and the pass continues.

use std::collections::BTreeMap;
use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use parking_lot::RwLock;
use tracing::error;
use tracing::trace;

use super::KeyPattern;
use crate::metrics::ACTIVE_SUBSCRIPTIONS;
use crate::metrics::CALLBACKS_INVOKED;
use crate::metrics::SUBSCRIBER_FAILURES;
use crate::ChangeEvent;
use crate::StoreSnapshot;
use crate::SubscriberError;

/// Watch callback: `(unprefixed_key, new_value, old_value)`.
pub type WatchCallback = dyn Fn(&str, Option<&str>, Option<&str>) + Send + Sync;

/// One active `watch` call.
pub(crate) struct Subscription {
    id: u64,
    prefix: String,
    pattern: KeyPattern,
    callback: Arc<WatchCallback>,
    active: AtomicBool,
}

impl Subscription {
    /// Namespace-relative key if `key` lies inside this subscription's
    /// namespace and matches its pattern.
    fn relative_key<'a>(
        &self,
        key: &'a str,
    ) -> Option<&'a str> {
        let relative = key.strip_prefix(self.prefix.as_str())?;
        self.pattern.matches(relative).then_some(relative)
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Returns false if the callback panicked.
    fn invoke(
        &self,
        key: &str,
        new_value: Option<&str>,
        old_value: Option<&str>,
    ) -> bool {
        CALLBACKS_INVOKED.inc();
        match catch_unwind(AssertUnwindSafe(|| (self.callback)(key, new_value, old_value))) {
            Ok(()) => true,
            Err(payload) => {
                let err = SubscriberError::from_panic(self.id, key, payload);
                error!("{}", err);
                SUBSCRIBER_FAILURES.inc();
                false
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("prefix", &self.prefix)
            .field("pattern", &self.pattern)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Outcome of one dispatch or replay pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Callbacks invoked (including failed ones)
    pub delivered: usize,
    /// Callbacks that panicked
    pub failed: usize,
}

impl DispatchStats {
    fn record(
        &mut self,
        ok: bool,
    ) {
        self.delivered += 1;
        if !ok {
            self.failed += 1;
        }
    }
}

#[derive(Debug)]
pub struct WatchRegistry {
    /// Keyed by id, so iteration follows registration order
    subscriptions: RwLock<BTreeMap<u64, Arc<Subscription>>>,

    /// Next subscription id (monotonically increasing)
    next_id: AtomicU64,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a subscription for keys under `prefix` matching `pattern`.
    pub fn register(
        self: &Arc<Self>,
        prefix: &str,
        pattern: &str,
        callback: Arc<WatchCallback>,
    ) -> WatchHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let subscription = Arc::new(Subscription {
            id,
            prefix: prefix.to_string(),
            pattern: KeyPattern::compile(pattern),
            callback,
            active: AtomicBool::new(true),
        });

        self.subscriptions.write().insert(id, subscription);
        ACTIVE_SUBSCRIPTIONS.inc();

        trace!(
            subscription_id = id,
            prefix = %prefix,
            pattern = %pattern,
            "subscription registered"
        );

        WatchHandle {
            id,
            registry: Arc::downgrade(self),
            released: AtomicBool::new(false),
        }
    }

    /// Removes the subscription with `id`. Returns false if it was not
    /// registered.
    pub fn unregister(
        &self,
        id: u64,
    ) -> bool {
        match self.subscriptions.write().remove(&id) {
            Some(subscription) => {
                subscription.active.store(false, Ordering::Release);
                ACTIVE_SUBSCRIPTIONS.dec();
                trace!(subscription_id = id, "subscription unregistered");
                true
            }
            None => false,
        }
    }

    /// Delivers `event` to every matching active subscription.
    pub fn dispatch(
        &self,
        event: &ChangeEvent,
    ) -> DispatchStats {
        let mut stats = DispatchStats::default();

        for subscription in self.active_subscriptions() {
            let Some(key) = subscription.relative_key(&event.key) else {
                continue;
            };
            if !subscription.is_active() {
                continue;
            }
            let ok = subscription.invoke(key, event.new_value.as_deref(), event.old_value.as_deref());
            stats.record(ok);
        }

        trace!(
            key = %event.key,
            origin = event.origin.as_str(),
            delivered = stats.delivered,
            "event dispatched"
        );
        stats
    }

    /// Replays the current state of matching keys to subscription `id`:
    /// each callback gets `(key, value, value)`.
    pub fn replay(
        &self,
        id: u64,
        entries: &StoreSnapshot,
    ) -> DispatchStats {
        let mut stats = DispatchStats::default();
        let Some(subscription) = self.subscriptions.read().get(&id).cloned() else {
            return stats;
        };

        for (key, value) in entries {
            let Some(relative) = subscription.relative_key(key) else {
                continue;
            };
            if !subscription.is_active() {
                break;
            }
            let ok = subscription.invoke(relative, Some(value), Some(value));
            stats.record(ok);
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.subscriptions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn active_subscriptions(&self) -> Vec<Arc<Subscription>> {
        self.subscriptions.read().values().cloned().collect()
    }
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WatchRegistry {
    fn drop(&mut self) {
        let remaining = self.subscriptions.get_mut().len();
        if remaining > 0 {
            ACTIVE_SUBSCRIPTIONS.sub(remaining as i64);
        }
    }
}

/// Unsubscribe handle returned by `watch`.
///
/// [`WatchHandle::unsubscribe`] may be called any number of times; only the
/// first call has an effect. Dropping the handle unsubscribes too, unless it
/// was [`detach`](WatchHandle::detach)ed.
#[must_use = "dropping a WatchHandle unsubscribes immediately"]
#[derive(Debug)]
pub struct WatchHandle {
    id: u64,
    registry: Weak<WatchRegistry>,
    released: AtomicBool,
}

impl WatchHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the subscription is still registered.
    pub fn is_active(&self) -> bool {
        if self.released.load(Ordering::Acquire) {
            return false;
        }
        self.registry
            .upgrade()
            .map(|r| r.subscriptions.read().contains_key(&self.id))
            .unwrap_or(false)
    }

    pub fn unsubscribe(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }

    /// Keeps the subscription for the lifetime of the registry.
    pub fn detach(self) {
        self.released.store(true, Ordering::Release);
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
