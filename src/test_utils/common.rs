use std::sync::Arc;

use parking_lot::Mutex;

use crate::ChangeBroker;
use crate::MemoryBacking;
use crate::RemoteReceiver;

/// One recorded watch invocation: `(key, new_value, old_value)`.
pub type Call = (String, Option<String>, Option<String>);

pub fn call(
    key: &str,
    new_value: Option<&str>,
    old_value: Option<&str>,
) -> Call {
    (
        key.to_string(),
        new_value.map(str::to_string),
        old_value.map(str::to_string),
    )
}

/// Collects watch callback invocations for later assertions.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> impl Fn(&str, Option<&str>, Option<&str>) + Send + Sync + 'static {
        let calls = self.calls.clone();
        move |key, new_value, old_value| {
            calls.lock().push(call(key, new_value, old_value));
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Recorded calls ordered by key, for assertions that ignore order.
    pub fn sorted_calls(&self) -> Vec<Call> {
        let mut calls = self.calls();
        calls.sort();
        calls
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// A host context on a shared backing: its broker and the receiver of
/// signals from the other contexts.
pub struct Tab {
    pub broker: ChangeBroker,
    pub receiver: RemoteReceiver,
}

impl Tab {
    pub fn open(backing: &Arc<MemoryBacking>) -> Self {
        let (store, receiver) = backing.context();
        Self {
            broker: ChangeBroker::new(store),
            receiver,
        }
    }

    /// Delivers every pending remote signal.
    pub fn pump(&mut self) -> usize {
        self.broker.pump(&mut self.receiver)
    }
}

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = env_logger::builder().is_test(true).try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}
