//! Render-cycle scheduling
//!
//! Consumers that rely on a cooperative change-detection cycle only notice
//! updates made inside that cycle. Work originating outside it (remote
//! signals, direct store calls) is wrapped so a cycle runs afterwards; work
//! already running inside an active cycle defers to it instead of nesting.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::trace;

/// The host's change-detection cycle.
pub trait RenderCycle: Send + Sync + 'static {
    /// Whether a cycle is currently running.
    fn is_active(&self) -> bool;

    /// Runs `work` inside a newly started cycle.
    fn run(
        &self,
        work: &mut dyn FnMut(),
    );
}

/// For hosts without a render cycle: work runs directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCycle;

impl RenderCycle for NoopCycle {
    fn is_active(&self) -> bool {
        false
    }

    fn run(
        &self,
        work: &mut dyn FnMut(),
    ) {
        work();
    }
}

/// A minimal cycle with a re-entrancy guard that counts started cycles.
#[derive(Debug, Default)]
pub struct TrackedCycle {
    depth: AtomicUsize,
    started: AtomicU64,
}

impl TrackedCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cycles started so far.
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }
}

impl RenderCycle for TrackedCycle {
    fn is_active(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }

    fn run(
        &self,
        work: &mut dyn FnMut(),
    ) {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.depth.fetch_add(1, Ordering::SeqCst);
        // Decrement even if `work` unwinds.
        let _guard = DepthGuard(&self.depth);
        work();
    }
}

struct DepthGuard<'a>(&'a AtomicUsize);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct Scheduler {
    cycle: Arc<dyn RenderCycle>,
    enabled: bool,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Scheduler").field("enabled", &self.enabled).finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(
        cycle: Arc<dyn RenderCycle>,
        enabled: bool,
    ) -> Self {
        Self { cycle, enabled }
    }

    /// Runs `work` in a fresh cycle unless one is already active.
    pub fn run_in_cycle<R>(
        &self,
        work: impl FnOnce() -> R,
    ) -> R {
        if !self.enabled || self.cycle.is_active() {
            return work();
        }

        let mut work = Some(work);
        let mut result = None;
        self.cycle.run(&mut || {
            if let Some(work) = work.take() {
                result = Some(work());
            }
        });

        match result {
            Some(result) => result,
            // The host skipped the work; run it outside a cycle rather than lose it.
            None => match work.take() {
                Some(work) => work(),
                None => unreachable!("work taken without producing a result"),
            },
        }
    }

    /// Wraps `f` so each invocation goes through [`Scheduler::run_in_cycle`].
    pub fn schedule<A, F>(
        &self,
        f: F,
    ) -> impl Fn(A)
    where
        F: Fn(A),
    {
        let scheduler = self.clone();
        move |arg| scheduler.run_in_cycle(|| f(arg))
    }

    /// Makes sure the host notices a change made outside any cycle.
    pub fn ensure_refresh(&self) {
        if !self.enabled || self.cycle.is_active() {
            return;
        }
        trace!("starting render cycle after out-of-cycle mutation");
        self.cycle.run(&mut || {});
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Arc::new(NoopCycle), true)
    }
}
