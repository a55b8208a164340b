// -
// Configuration

/// Environment variable naming an extra TOML config file
pub(crate) const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Prefix of environment overrides, e.g. `KV_WATCH__BROKER__INTERCEPT_LOCAL_MUTATIONS`
pub(crate) const ENV_PREFIX: &str = "KV_WATCH";

/// Default location of the file adaptor's persisted image
pub(crate) const DEFAULT_FILE_STORE_PATH: &str = "./data/kv-watch.bin";

// -
// Patterns

/// Wildcard token inside watch patterns
pub(crate) const WILDCARD: char = '*';

// -
// Metrics labels

pub(crate) const ORIGIN_LOCAL: &str = "local";
pub(crate) const ORIGIN_REMOTE: &str = "remote";
