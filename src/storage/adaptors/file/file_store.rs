//! File-backed store
//!
//! Keeps the whole map in memory and rewrites a bincode image of it after
//! every mutation. The image is written to a sibling temp file and renamed
//! into place so a crash never leaves a half-written store behind.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::debug;
use tracing::info;

use crate::KvStore;
use crate::Result;
use crate::StorageError;
use crate::StoreSnapshot;

const TEMP_SUFFIX: &str = "tmp";

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: Mutex<StoreSnapshot>,
}

impl FileStore {
    /// Opens the store at `path`, loading any existing image.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StorageError::IoError)?;
            }
        }

        let data = if path.exists() {
            let bytes = fs::read(&path).map_err(StorageError::IoError)?;
            if bytes.is_empty() {
                StoreSnapshot::new()
            } else {
                bincode::deserialize(&bytes).map_err(StorageError::BincodeError)?
            }
        } else {
            StoreSnapshot::new()
        };

        info!("opened file store at {:?} with {} entries", path, data.len());

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(
        &self,
        data: &StoreSnapshot,
    ) -> Result<()> {
        let bytes = bincode::serialize(data).map_err(StorageError::BincodeError)?;
        let temp = self.path.with_extension(TEMP_SUFFIX);

        fs::write(&temp, bytes).map_err(StorageError::IoError)?;
        fs::rename(&temp, &self.path).map_err(StorageError::IoError)?;

        debug!("persisted {} entries to {:?}", data.len(), self.path);
        Ok(())
    }

    /// Applies `change` to a copy, persists it, and only then makes it
    /// visible. A failed write leaves the in-memory map untouched.
    fn commit(
        &self,
        change: impl FnOnce(&mut StoreSnapshot),
    ) -> Result<()> {
        let mut data = self.data.lock();
        let mut next = data.clone();
        change(&mut next);
        self.persist(&next)?;
        *data = next;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.commit(|data| {
            data.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(
        &self,
        key: &str,
    ) -> Result<()> {
        let mut data = self.data.lock();
        if !data.contains_key(key) {
            return Ok(());
        }
        let mut next = data.clone();
        next.remove(key);
        self.persist(&next)?;
        *data = next;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.commit(StoreSnapshot::clear)
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.lock().keys().cloned().collect())
    }

    fn entries(&self) -> Result<StoreSnapshot> {
        Ok(self.data.lock().clone())
    }
}
