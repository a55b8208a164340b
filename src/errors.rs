//! Change-Notification Error Hierarchy
//!
//! Defines the error types surfaced by the key-value watch layer, grouped by
//! the boundary at which they occur (storage access, value serialization,
//! configuration). Subscriber failures are never returned; they are captured as
//! [`SubscriberError`] and reported through the log.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying store failures (access denied, persistence I/O)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// JSON encode/decode failures of scoped values
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration loaded but failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The host denies access to the store (sandboxing, privacy settings)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The host forbids wrapping the store's mutation entry points
    #[error("Store mutation entry points cannot be intercepted")]
    InterceptionUnavailable,

    /// Disk I/O failures of persistent adaptors
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Encoding failures of the persisted store image
    #[error(transparent)]
    BincodeError(#[from] bincode::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// Value could not be serialized before storing
    #[error("Failed to encode value for key {key}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored content is not valid JSON for the requested type
    #[error("Failed to decode value of key {key}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A watch callback panicked while handling a change.
#[derive(Debug, thiserror::Error)]
#[error("Watch callback {subscription_id} failed on key {key:?}: {message}")]
pub struct SubscriberError {
    pub subscription_id: u64,
    pub key: String,
    pub message: String,
}

impl SubscriberError {
    /// Builds the error from a `catch_unwind` payload.
    pub(crate) fn from_panic(
        subscription_id: u64,
        key: &str,
        payload: Box<dyn std::any::Any + Send>,
    ) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };

        Self {
            subscription_id,
            key: key.to_string(),
            message,
        }
    }
}
