//! Prometheus metrics for change dispatch.
//!
//! Collectors are process-wide statics. Call [`register_custom_metrics`] to
//! expose them through a registry of your own, or [`gather_metrics`] for the
//! text exposition of the crate's default registry.

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tracing::warn;

lazy_static! {
    pub static ref EVENTS_DISPATCHED: IntCounterVec = IntCounterVec::new(
        Opts::new("kv_watch_events_dispatched", "Change events dispatched to the watch registry"),
        &["origin"]
    )
    .expect("metric can not be created");

    pub static ref CALLBACKS_INVOKED: IntCounter = IntCounter::new(
        "kv_watch_callbacks_invoked",
        "Watch callback invocations, including replays"
    )
    .expect("metric can not be created");

    pub static ref SUBSCRIBER_FAILURES: IntCounter = IntCounter::new(
        "kv_watch_subscriber_failures",
        "Watch callbacks that panicked"
    )
    .expect("metric can not be created");

    pub static ref ACTIVE_SUBSCRIPTIONS: IntGauge = IntGauge::new(
        "kv_watch_active_subscriptions",
        "Currently registered watches"
    )
    .expect("metric can not be created");

    pub static ref RECONSTRUCTED_CLEAR_KEYS: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "kv_watch_reconstructed_clear_keys",
            "Removals synthesized from the shadow snapshot after a clear"
        ),
        &["origin"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_custom_metrics(&registry);
        registry
    };
}

/// Registers every collector of this crate with `registry`.
pub fn register_custom_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(EVENTS_DISPATCHED.clone()),
        Box::new(CALLBACKS_INVOKED.clone()),
        Box::new(SUBSCRIBER_FAILURES.clone()),
        Box::new(ACTIVE_SUBSCRIPTIONS.clone()),
        Box::new(RECONSTRUCTED_CLEAR_KEYS.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            warn!("collector can not be registered: {:?}", e);
        }
    }
}

/// Text exposition of the default registry.
pub fn gather_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        warn!("could not encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}
