use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::normalize_remote;
use super::ChangeEvent;
use super::InterceptedStore;
use super::RenderCycle;
use super::Scheduler;
use super::ShadowSnapshot;
use crate::constants::ORIGIN_REMOTE;
use crate::metrics::EVENTS_DISPATCHED;
use crate::metrics::RECONSTRUCTED_CLEAR_KEYS;
use crate::BrokerConfig;
use crate::DispatchStats;
use crate::KvStore;
use crate::NoopCycle;
use crate::RemoteReceiver;
use crate::RemoteSignal;
use crate::Result;
use crate::ScopedStore;
use crate::Settings;
use crate::StorageError;
use crate::StoreSnapshot;
use crate::WatchHandle;
use crate::WatchRegistry;

/// State shared by the broker, its intercepted store and every scope.
pub(crate) struct BrokerInner {
    pub(super) store: Arc<dyn KvStore>,
    pub(super) snapshot: ShadowSnapshot,
    pub(super) registry: Arc<WatchRegistry>,
    pub(super) scheduler: Scheduler,
    pub(super) intercepting: bool,
    pub(super) config: BrokerConfig,
}

impl BrokerInner {
    /// Dispatches a batch of events, fully, in order.
    pub(super) fn publish(
        &self,
        events: Vec<ChangeEvent>,
    ) -> DispatchStats {
        let mut total = DispatchStats::default();
        for event in events {
            EVENTS_DISPATCHED.with_label_values(&[event.origin.as_str()]).inc();
            let stats = self.registry.dispatch(&event);
            total.delivered += stats.delivered;
            total.failed += stats.failed;
        }
        total
    }

    pub(super) fn refresh_snapshot(&self) {
        self.snapshot.refresh(self.store.as_ref());
    }

    /// Normalizes a host signal against the pre-mutation snapshot and
    /// dispatches the result.
    ///
    /// A single-key change is applied to the snapshot in signal order; only
    /// a clear re-reads the store.
    pub(super) fn dispatch_remote(
        &self,
        signal: RemoteSignal,
    ) -> DispatchStats {
        let before = self.snapshot.load();
        let cleared = matches!(signal, RemoteSignal::Cleared);

        let events = normalize_remote(signal, &before, self.config.reconstruct_remote_clears);
        if cleared {
            debug!("remote clear reconstructed into {} removals", events.len());
            RECONSTRUCTED_CLEAR_KEYS
                .with_label_values(&[ORIGIN_REMOTE])
                .inc_by(events.len() as u64);
        } else {
            for event in &events {
                self.snapshot.apply(event);
            }
        }

        let stats = self.publish(events);
        if cleared {
            self.refresh_snapshot();
        }
        stats
    }
}

/// Change-notification broker.
///
/// Owns the shadow snapshot and the watch registry, and decorates the
/// injected store exactly once so that every mutation made through
/// [`ChangeBroker::store`] or any [`ScopedStore`] is observed. Remote
/// mutations arrive as [`RemoteSignal`]s through [`ChangeBroker::handle_remote`],
/// [`ChangeBroker::pump`] or a listener task.
///
/// Cloning is cheap and yields a handle to the same broker.
#[derive(Clone)]
pub struct ChangeBroker {
    inner: Arc<BrokerInner>,
}

impl std::fmt::Debug for ChangeBroker {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ChangeBroker")
            .field("intercepting", &self.inner.intercepting)
            .field("subscriptions", &self.inner.registry.len())
            .field("snapshot_len", &self.inner.snapshot.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl ChangeBroker {
    /// Broker with default configuration and no render cycle.
    pub fn new(store: impl KvStore) -> Self {
        BrokerBuilder::new(store).build()
    }

    pub fn builder(store: impl KvStore) -> BrokerBuilder {
        BrokerBuilder::new(store)
    }

    /// Opens the configured store and builds a broker over it.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = settings.storage.open()?;
        Ok(BrokerBuilder::new(store).config(settings.broker.clone()).build())
    }

    /// The intercepted store. Route every direct store access through it.
    pub fn store(&self) -> InterceptedStore {
        InterceptedStore {
            inner: self.inner.clone(),
        }
    }

    /// A scope whose keys are transparently prefixed with `prefix`.
    pub fn scope(
        &self,
        prefix: impl Into<String>,
    ) -> ScopedStore {
        ScopedStore::new(self.clone(), prefix.into())
    }

    /// The unprefixed scope covering the whole store.
    pub fn root(&self) -> ScopedStore {
        self.scope(String::new())
    }

    /// Registers `callback` for keys under `prefix` whose remainder matches
    /// `pattern`. With `replay_initial`, every matching key already stored
    /// is delivered as `(key, value, value)` before this returns.
    pub fn watch<F>(
        &self,
        prefix: &str,
        pattern: &str,
        callback: F,
        replay_initial: bool,
    ) -> WatchHandle
    where
        F: Fn(&str, Option<&str>, Option<&str>) + Send + Sync + 'static,
    {
        let handle = self.inner.registry.register(prefix, pattern, Arc::new(callback));

        if replay_initial {
            // Without interception local writes never refresh the snapshot.
            if !self.inner.intercepting {
                self.inner.refresh_snapshot();
            }
            let entries = self.inner.snapshot.load();
            let stats = self.inner.registry.replay(handle.id(), &entries);
            trace!(
                subscription_id = handle.id(),
                replayed = stats.delivered,
                "initial state replayed"
            );
        }
        handle
    }

    /// Delivers one host signal inside a render cycle.
    pub fn handle_remote(
        &self,
        signal: RemoteSignal,
    ) -> DispatchStats {
        self.inner.scheduler.run_in_cycle(|| self.inner.dispatch_remote(signal))
    }

    /// Delivers every signal already queued on `receiver`; returns how many
    /// were handled.
    pub fn pump(
        &self,
        receiver: &mut RemoteReceiver,
    ) -> usize {
        let mut handled = 0;
        while let Ok(signal) = receiver.try_recv() {
            self.handle_remote(signal);
            handled += 1;
        }
        handled
    }

    /// Delivery without the render-cycle wrapper, for callers that wrap
    /// themselves.
    pub(crate) fn dispatch_remote(
        &self,
        signal: RemoteSignal,
    ) -> DispatchStats {
        self.inner.dispatch_remote(signal)
    }

    /// Last observed contents of the whole store.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.inner.snapshot.load()
    }

    /// Re-reads the store into the shadow snapshot.
    pub fn refresh(&self) {
        self.inner.refresh_snapshot();
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Whether same-context mutations are being observed.
    pub fn is_intercepting(&self) -> bool {
        self.inner.intercepting
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.inner.config
    }
}

pub struct BrokerBuilder {
    store: Arc<dyn KvStore>,
    config: BrokerConfig,
    cycle: Arc<dyn RenderCycle>,
}

impl BrokerBuilder {
    pub fn new(store: impl KvStore) -> Self {
        Self {
            store: Arc::new(store),
            config: BrokerConfig::default(),
            cycle: Arc::new(NoopCycle),
        }
    }

    pub fn config(
        mut self,
        config: BrokerConfig,
    ) -> Self {
        self.config = config;
        self
    }

    /// Host change-detection cycle driven by the broker.
    pub fn render_cycle(
        mut self,
        cycle: Arc<dyn RenderCycle>,
    ) -> Self {
        self.cycle = cycle;
        self
    }

    pub fn build(self) -> ChangeBroker {
        let intercepting = if !self.config.intercept_local_mutations {
            info!("local mutation interception disabled by config");
            false
        } else if !self.store.interceptable() {
            warn!(
                "{}; only remote changes will be observed",
                StorageError::InterceptionUnavailable
            );
            false
        } else {
            true
        };

        let inner = Arc::new(BrokerInner {
            store: self.store,
            snapshot: ShadowSnapshot::new(),
            registry: Arc::new(WatchRegistry::new()),
            scheduler: Scheduler::new(self.cycle, self.config.trigger_render_cycle),
            intercepting,
            config: self.config,
        });
        inner.refresh_snapshot();

        debug!(
            intercepting = intercepting,
            entries = inner.snapshot.len(),
            "change broker constructed"
        );

        ChangeBroker { inner }
    }
}
