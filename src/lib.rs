//! # kv-watch
//!
//! Change notifications over a shared key-value store.
//!
//! Hosts usually notify a context only about mutations made by *other*
//! contexts. [`ChangeBroker`] closes that gap: it decorates the store so
//! same-context writes are observed too, reconstructs per-key removals from
//! a bare "store cleared" signal, and fans every change out to namespaced
//! wildcard watches registered through [`ScopedStore`].
//!
//! ```ignore
//! let backing = MemoryBacking::new();
//! let (store, receiver) = backing.context();
//! let broker = ChangeBroker::new(store);
//!
//! let settings = broker.scope("settings:");
//! let _watch = settings.watch("theme*", |key, new, old| {
//!     println!("{key}: {old:?} -> {new:?}");
//! }, true);
//!
//! settings.set("theme", "dark");
//! ```

mod broker;
mod config;
mod constants;
mod errors;
pub mod metrics;
mod scope;
mod storage;
mod watch;

pub use broker::*;
pub use config::*;
pub use errors::*;
pub use scope::*;
pub use storage::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
