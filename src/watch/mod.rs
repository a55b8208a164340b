//! Namespaced wildcard watches
//!
//! A watch is registered for a namespace prefix and a pattern relative to
//! it. Every change event whose key lies inside the namespace and whose
//! remainder matches the pattern is delivered to the callback as
//! `(relative_key, new_value, old_value)`.
//!
//! ```ignore
//! let handle = scope.watch("user:*", |key, new, old| {
//!     println!("{key}: {old:?} -> {new:?}");
//! }, false);
//!
//! scope.set("user:42", "alice"); // fires ("user:42", Some("alice"), None)
//! handle.unsubscribe();          // idempotent; also happens on drop
//! ```

mod pattern;
mod registry;


pub use pattern::KeyPattern;
pub use registry::DispatchStats;
pub use registry::WatchCallback;
pub use registry::WatchHandle;
pub use registry::WatchRegistry;
