use crate::KvStore;
use crate::Result;
use crate::StorageError;

/// Stands in for a store the host refuses to hand out.
///
/// Every access fails with [`StorageError::Unavailable`]; the broker turns
/// that into "watch calls succeed but never fire".
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn denied<T>(&self) -> Result<T> {
        Err(StorageError::Unavailable(self.reason.clone()).into())
    }
}

impl KvStore for UnavailableStore {
    fn get(
        &self,
        _key: &str,
    ) -> Result<Option<String>> {
        self.denied()
    }

    fn set(
        &self,
        _key: &str,
        _value: &str,
    ) -> Result<()> {
        self.denied()
    }

    fn remove(
        &self,
        _key: &str,
    ) -> Result<()> {
        self.denied()
    }

    fn clear(&self) -> Result<()> {
        self.denied()
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.denied()
    }
}
