//! Configuration management for the change broker.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod broker;
mod storage;
pub use broker::*;
pub use storage::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::ENV_PREFIX;
use crate::Result;

/// Main configuration container
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Interception, clear reconstruction and render-cycle switches
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Which store backs the broker
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Settings {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `KV_WATCH__` prefix (highest priority)
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("KV_WATCH__STORAGE__BACKEND", "file");
    /// let settings = Settings::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Applies additional overrides from a file, then the environment again.
    ///
    /// Does NOT validate; call `validate()` after all overrides.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Validates the storage section and returns the validated instance.
    /// Every combination of broker switches is a supported mode.
    pub fn validate(self) -> Result<Self> {
        self.storage.validate()?;
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
