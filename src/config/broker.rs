use serde::Deserialize;
use serde::Serialize;

/// Change broker behaviour
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Wrap the store's `set`/`remove`/`clear` so same-context mutations are
    /// observed. When false, or when the store refuses interception, only
    /// remote changes fire watches.
    ///
    /// **Default**: true
    #[serde(default = "default_intercept_local_mutations")]
    pub intercept_local_mutations: bool,

    /// Synthesize one removal per previously known key when another context
    /// clears the store. The host's signal carries no manifest, so this relies
    /// on the shadow snapshot.
    ///
    /// **Default**: true
    #[serde(default = "default_reconstruct_remote_clears")]
    pub reconstruct_remote_clears: bool,

    /// Drive the host render cycle around out-of-cycle deliveries.
    ///
    /// **Default**: true
    #[serde(default = "default_trigger_render_cycle")]
    pub trigger_render_cycle: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            intercept_local_mutations: default_intercept_local_mutations(),
            reconstruct_remote_clears: default_reconstruct_remote_clears(),
            trigger_render_cycle: default_trigger_render_cycle(),
        }
    }
}

fn default_intercept_local_mutations() -> bool {
    true
}
fn default_reconstruct_remote_clears() -> bool {
    true
}
fn default_trigger_render_cycle() -> bool {
    true
}
