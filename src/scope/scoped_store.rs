use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::ChangeBroker;
use crate::KvStore;
use crate::Result;
use crate::SerializationError;
use crate::WatchHandle;

/// A namespaced view of the broker's store.
///
/// Every key is prefixed with [`ScopedStore::prefix`] before it reaches the
/// store and stripped again in listings. Scopes are independent values:
/// [`ScopedStore::sub`] concatenates prefixes and shares nothing mutable
/// with its parent.
///
/// Plain CRUD is tolerant: when the store is unavailable reads yield
/// `None`/empty and writes do nothing. `set_json` and `try_json` surface
/// their errors.
#[derive(Debug, Clone)]
pub struct ScopedStore {
    broker: ChangeBroker,
    prefix: String,
}

impl ScopedStore {
    pub(crate) fn new(
        broker: ChangeBroker,
        prefix: String,
    ) -> Self {
        Self { broker, prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_key(
        &self,
        key: &str,
    ) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<String> {
        tolerate("get", self.broker.store().get(&self.full_key(key))).flatten()
    }

    pub fn set(
        &self,
        key: &str,
        value: &str,
    ) {
        tolerate("set", self.broker.store().set(&self.full_key(key), value));
    }

    pub fn has(
        &self,
        key: &str,
    ) -> bool {
        tolerate("has", self.broker.store().has(&self.full_key(key))).unwrap_or(false)
    }

    pub fn remove(
        &self,
        key: &str,
    ) {
        tolerate("remove", self.broker.store().remove(&self.full_key(key)));
    }

    /// Removes every key of this scope, one by one, so each removal is
    /// reported to watchers individually.
    pub fn clear(&self) {
        for key in self.keys() {
            self.remove(&key);
        }
    }

    /// Keys inside this scope, with the prefix stripped.
    pub fn keys(&self) -> Vec<String> {
        tolerate("keys", self.broker.store().keys())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|key| key.strip_prefix(self.prefix.as_str()).map(str::to_string))
            .collect()
    }

    /// Reads and deserializes a JSON value; `None` when absent, malformed or
    /// unreadable.
    pub fn json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<T> {
        match self.try_json(key) {
            Ok(value) => value,
            Err(e) => {
                debug!("json read of {:?} ignored: {}", key, e);
                None
            }
        }
    }

    /// Strict variant of [`ScopedStore::json`].
    pub fn try_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>> {
        let Some(raw) = self.broker.store().get(&self.full_key(key))? else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw).map_err(|source| SerializationError::Decode {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(value))
    }

    /// Serializes `value` to JSON and stores it. Nothing is stored on error.
    pub fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let raw = serde_json::to_string(value).map_err(|source| SerializationError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.broker.store().set(&self.full_key(key), &raw)
    }

    /// A scope nested under this one.
    pub fn sub(
        &self,
        prefix: &str,
    ) -> ScopedStore {
        ScopedStore::new(self.broker.clone(), self.full_key(prefix))
    }

    /// Watches keys of this scope matching `pattern`. Callbacks receive
    /// scope-relative keys.
    pub fn watch<F>(
        &self,
        pattern: &str,
        callback: F,
        replay_initial: bool,
    ) -> WatchHandle
    where
        F: Fn(&str, Option<&str>, Option<&str>) + Send + Sync + 'static,
    {
        self.broker.watch(&self.prefix, pattern, callback, replay_initial)
    }

    pub fn broker(&self) -> &ChangeBroker {
        &self.broker
    }
}

/// Logs and swallows a storage failure.
fn tolerate<T>(
    op: &str,
    result: Result<T>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("store {} failed, degrading to no-op: {:?}", op, e);
            None
        }
    }
}
