//! Event normalization
//!
//! Locally intercepted mutations and host-delivered remote signals are both
//! turned into [`ChangeEvent`]s, the only shape the watch registry consumes.

use tracing::trace;

use super::diff_snapshots;
use crate::constants::ORIGIN_LOCAL;
use crate::constants::ORIGIN_REMOTE;
use crate::RemoteSignal;
use crate::StoreSnapshot;

/// Where a change was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    /// Intercepted mutation made by this context
    Local,
    /// Signal delivered by the host for another context's mutation
    Remote,
}

impl EventOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOrigin::Local => ORIGIN_LOCAL,
            EventOrigin::Remote => ORIGIN_REMOTE,
        }
    }
}

/// Canonical change record.
///
/// `new_value == None` means the key was removed, `old_value == None` means
/// it did not exist before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub old_value: Option<String>,
    pub origin: EventOrigin,
}

impl ChangeEvent {
    pub fn new(
        key: impl Into<String>,
        new_value: Option<String>,
        old_value: Option<String>,
        origin: EventOrigin,
    ) -> Self {
        Self {
            key: key.into(),
            new_value,
            old_value,
            origin,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

/// Event for an intercepted `set`/`remove`, or `None` when nothing changed.
pub fn local_change(
    key: &str,
    current: Option<String>,
    old: Option<String>,
) -> Option<ChangeEvent> {
    if current == old {
        return None;
    }
    Some(ChangeEvent::new(key, current, old, EventOrigin::Local))
}

/// Normalizes a host signal against the pre-mutation snapshot.
///
/// A `Cleared` signal carries no manifest, so one removal per key of
/// `before` is synthesized; when `reconstruct_clears` is off it yields
/// nothing.
pub fn normalize_remote(
    signal: RemoteSignal,
    before: &StoreSnapshot,
    reconstruct_clears: bool,
) -> Vec<ChangeEvent> {
    match signal {
        RemoteSignal::Changed {
            key,
            new_value,
            old_value,
        } => {
            if new_value == old_value {
                trace!(key = %key, "remote signal without change ignored");
                return Vec::new();
            }
            vec![ChangeEvent::new(key, new_value, old_value, EventOrigin::Remote)]
        }
        RemoteSignal::Cleared => {
            if !reconstruct_clears {
                return Vec::new();
            }
            diff_snapshots(before, &StoreSnapshot::new(), EventOrigin::Remote)
        }
    }
}
