//! Scoped store facade
//!
//! Prefix-based namespaces over the shared store. Watches registered through
//! a scope only see keys inside it.

mod scoped_store;
pub use scoped_store::*;
