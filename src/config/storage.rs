//! Storage backend configuration

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::constants::DEFAULT_FILE_STORE_PATH;
use crate::Error;
use crate::FileStore;
use crate::KvStore;
use crate::MemoryStore;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local in-memory store
    #[default]
    Memory,
    /// Bincode image on disk, reloaded on open
    File,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Image location for the `file` backend
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_path(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backend == StorageBackend::File && self.path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "storage.path must not be empty for the file backend".into(),
            ));
        }
        if self.backend == StorageBackend::File && self.path.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "storage.path {:?} is a directory",
                self.path
            )));
        }
        Ok(())
    }

    /// Opens the configured store.
    pub fn open(&self) -> Result<Arc<dyn KvStore>> {
        info!("opening {:?} store", self.backend);
        match self.backend {
            StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
            StorageBackend::File => Ok(Arc::new(FileStore::open(&self.path)?)),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_FILE_STORE_PATH)
}
