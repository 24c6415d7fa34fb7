//! Client persistence strategies.
//!
//! The transport client stores in-flight messages through a
//! [`ClientPersistence`] so they survive reconnects. The configuration only
//! carries the handle; the transport opens and uses it.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use thiserror::Error;

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Store used before `open` or after `close`
    #[error("Persistence store is not open")]
    NotOpen,
}

/// Message store used by the transport client.
pub trait ClientPersistence: Send + Sync + fmt::Debug {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Prepare the store for one client session.
    fn open(&self, client_id: &str, server_uri: &str) -> PersistenceResult<()>;

    fn close(&self) -> PersistenceResult<()>;

    fn put(&self, key: &str, data: Vec<u8>) -> PersistenceResult<()>;

    fn get(&self, key: &str) -> PersistenceResult<Option<Vec<u8>>>;

    fn remove(&self, key: &str) -> PersistenceResult<()>;

    fn contains_key(&self, key: &str) -> PersistenceResult<bool>;

    fn keys(&self) -> PersistenceResult<Vec<String>>;

    fn clear(&self) -> PersistenceResult<()>;
}

/// In-memory persistence. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryPersistence {
    store: Mutex<Option<HashMap<String, Vec<u8>>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_store<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Vec<u8>>) -> T,
    ) -> PersistenceResult<T> {
        let mut guard = self.store.lock();
        guard.as_mut().map(f).ok_or(PersistenceError::NotOpen)
    }
}

impl fmt::Debug for MemoryPersistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.store.lock();
        f.debug_struct("MemoryPersistence")
            .field("open", &guard.is_some())
            .field("entries", &guard.as_ref().map_or(0, HashMap::len))
            .finish()
    }
}

impl ClientPersistence for MemoryPersistence {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&self, client_id: &str, server_uri: &str) -> PersistenceResult<()> {
        let mut guard = self.store.lock();
        if guard.is_none() {
            *guard = Some(HashMap::new());
        }
        tracing::debug!(client_id, server_uri, "Opened memory persistence");
        Ok(())
    }

    fn close(&self) -> PersistenceResult<()> {
        *self.store.lock() = None;
        Ok(())
    }

    fn put(&self, key: &str, data: Vec<u8>) -> PersistenceResult<()> {
        self.with_store(|store| {
            store.insert(key.to_string(), data);
        })
    }

    fn get(&self, key: &str) -> PersistenceResult<Option<Vec<u8>>> {
        self.with_store(|store| store.get(key).cloned())
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        self.with_store(|store| {
            store.remove(key);
        })
    }

    fn contains_key(&self, key: &str) -> PersistenceResult<bool> {
        self.with_store(|store| store.contains_key(key))
    }

    fn keys(&self) -> PersistenceResult<Vec<String>> {
        self.with_store(|store| store.keys().cloned().collect())
    }

    fn clear(&self) -> PersistenceResult<()> {
        self.with_store(HashMap::clear)
    }
}
