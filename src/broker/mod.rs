//! Change-notification broker
//!
//! Turns an asymmetric host primitive (a context only hears about *other*
//! contexts' mutations) into one uniform stream of change events:
//!
//! ```text
//!  ScopedStore / direct caller          host (other contexts)
//!            │                                   │
//!            ▼                                   ▼
//!   ┌──────────────────┐               ┌──────────────────┐
//!   │ InterceptedStore │               │   RemoteSignal   │
//!   │ set/remove/clear │               │ Changed/Cleared  │
//!   └────────┬─────────┘               └────────┬─────────┘
//!            │ local_change / diff              │ normalize_remote
//!            └──────────────┬───────────────────┘
//!                           ▼
//!                    ChangeEvent batch
//!                           │ WatchRegistry::dispatch
//!                           ▼
//!                  matching callbacks (render cycle)
//!                           │
//!                           ▼
//!                 ShadowSnapshot::refresh
//! ```
//!
//! A remote clear is diffed against the snapshot that preceded it and the
//! store is re-read only after the whole batch was dispatched. A remote
//! single-key change is applied to the snapshot directly, in signal order,
//! so changes still queued behind it never leak into the diff base.

mod broker;
mod event;
mod interceptor;
mod listener;
mod scheduler;
mod snapshot;

pub(crate) use broker::BrokerInner;
pub use broker::BrokerBuilder;
pub use broker::ChangeBroker;
pub use event::*;
pub use interceptor::InterceptedStore;
pub use listener::spawn_remote_listener;
pub use scheduler::*;
pub use snapshot::*;
