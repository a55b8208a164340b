use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::trace;

use crate::KvStore;
use crate::RemoteSignal;
use crate::Result;
use crate::StoreSnapshot;

/// Receiving end of the host's remote-change notifications for one context.
pub type RemoteReceiver = mpsc::UnboundedReceiver<RemoteSignal>;

#[derive(Debug)]
struct ContextPeer {
    id: u64,
    sender: mpsc::UnboundedSender<RemoteSignal>,
}

/// One physical in-memory store shared by any number of contexts.
///
/// Behaves like a browser's origin storage: a mutation made through one
/// context handle is announced to every other live context and never to the
/// context that made it.
#[derive(Debug, Default)]
pub struct MemoryBacking {
    data: RwLock<StoreSnapshot>,
    peers: Mutex<Vec<ContextPeer>>,
    next_context_id: AtomicU64,
}

impl MemoryBacking {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Opens a new context on this backing.
    pub fn context(self: &Arc<Self>) -> (MemoryStore, RemoteReceiver) {
        let id = self.next_context_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (sender, receiver) = mpsc::unbounded_channel();
        self.peers.lock().push(ContextPeer { id, sender });

        trace!(context_id = id, "memory store context opened");

        (
            MemoryStore {
                backing: self.clone(),
                context_id: id,
            },
            receiver,
        )
    }

    /// Number of contexts whose receivers are still alive.
    pub fn context_count(&self) -> usize {
        let mut peers = self.peers.lock();
        peers.retain(|p| !p.sender.is_closed());
        peers.len()
    }

    fn announce(
        &self,
        origin: u64,
        signal: RemoteSignal,
    ) {
        let mut peers = self.peers.lock();
        peers.retain(|p| !p.sender.is_closed());
        for peer in peers.iter().filter(|p| p.id != origin) {
            let _ = peer.sender.send(signal.clone());
        }
    }
}

/// A context handle onto a [`MemoryBacking`].
#[derive(Debug)]
pub struct MemoryStore {
    backing: Arc<MemoryBacking>,
    context_id: u64,
}

impl MemoryStore {
    /// Creates a store on a private backing with no other contexts.
    pub fn new() -> Self {
        let (store, _receiver) = MemoryBacking::new().context();
        store
    }

    pub fn context_id(&self) -> u64 {
        self.context_id
    }

    pub fn backing(&self) -> &Arc<MemoryBacking> {
        &self.backing
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        Ok(self.backing.data.read().get(key).cloned())
    }

    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let old = self.backing.data.write().insert(key.to_string(), value.to_string());

        if old.as_deref() != Some(value) {
            self.backing.announce(
                self.context_id,
                RemoteSignal::Changed {
                    key: key.to_string(),
                    new_value: Some(value.to_string()),
                    old_value: old,
                },
            );
        }
        Ok(())
    }

    fn remove(
        &self,
        key: &str,
    ) -> Result<()> {
        let old = self.backing.data.write().remove(key);

        if old.is_some() {
            self.backing.announce(
                self.context_id,
                RemoteSignal::Changed {
                    key: key.to_string(),
                    new_value: None,
                    old_value: old,
                },
            );
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let had_entries = {
            let mut data = self.backing.data.write();
            let had_entries = !data.is_empty();
            data.clear();
            had_entries
        };

        if had_entries {
            self.backing.announce(self.context_id, RemoteSignal::Cleared);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.backing.data.read().keys().cloned().collect())
    }

    fn entries(&self) -> Result<StoreSnapshot> {
        Ok(self.backing.data.read().clone())
    }
}
