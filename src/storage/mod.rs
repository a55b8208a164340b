//! Storage
//!
//! The [`KvStore`] abstraction the broker decorates, plus the adaptors
//! shipped with the crate:
//! - [`MemoryBacking`]/[`MemoryStore`]: shared in-memory store with
//!   cross-context remote signals
//! - [`FileStore`]: single-context store persisted with bincode
//! - [`UnavailableStore`]: a store the host denies access to

mod adaptors;
mod kv_store;

pub use adaptors::*;
pub use kv_store::*;

#[cfg(test)]
mod storage_test;
