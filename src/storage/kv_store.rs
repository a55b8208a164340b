//! KvStore
//!
//! The host key-value store the broker sits on top of:
//! - string keys, string values
//! - point reads/writes plus enumerable key listing and bulk clear
//! - the host tells a context about mutations made by *other* contexts
//!   through [`RemoteSignal`]s; mutations made locally are silent

use std::collections::BTreeMap;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::Result;

/// Full contents of a store, keyed by unprefixed key.
pub type StoreSnapshot = BTreeMap<String, String>;

/// Host notification that another context mutated the shared store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSignal {
    /// A single key changed elsewhere
    Changed {
        key: String,
        new_value: Option<String>,
        old_value: Option<String>,
    },
    /// The store was cleared elsewhere; no manifest of removed keys
    Cleared,
}

#[cfg_attr(test, automock)]
pub trait KvStore: Send + Sync + 'static {
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>>;

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()>;

    fn remove(
        &self,
        key: &str,
    ) -> Result<()>;

    /// Removes every entry of the store.
    fn clear(&self) -> Result<()>;

    /// Lists every key currently stored.
    fn keys(&self) -> Result<Vec<String>>;

    fn has(
        &self,
        key: &str,
    ) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// NOTE: reads the whole store. Stores are bounded by host quotas, so a
    /// full copy is acceptable.
    fn entries(&self) -> Result<StoreSnapshot> {
        let mut entries = StoreSnapshot::new();
        for key in self.keys()? {
            if let Some(value) = self.get(&key)? {
                entries.insert(key, value);
            }
        }
        Ok(entries)
    }

    /// Whether the host allows wrapping `set`/`remove`/`clear`.
    fn interceptable(&self) -> bool {
        true
    }
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(
        &self,
        key: &str,
    ) -> Result<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }

    fn has(
        &self,
        key: &str,
    ) -> Result<bool> {
        (**self).has(key)
    }

    fn entries(&self) -> Result<StoreSnapshot> {
        (**self).entries()
    }

    fn interceptable(&self) -> bool {
        (**self).interceptable()
    }
}
