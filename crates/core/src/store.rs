//! Key/value blob persistence contract.
//!
//! Repositories serialize whole documents to JSON strings and hand them to a
//! [`BlobStore`] under a fixed key (`pizzaShopOrders`, `pizzaShopInventory`,
//! ...). The store knows nothing about the documents it holds.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{StorageError, StorageResult};

/// Durable string storage keyed by name.
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, `Ok(None)` if absent.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replace the blob stored under `key`.
    fn save(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Remove the blob stored under `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<S> BlobStore for Arc<S>
where
    S: BlobStore + ?Sized,
{
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

/// In-memory blob store for tests/dev.
///
/// Writes can be made to fail on demand to exercise rollback paths.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    inner: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob directly, bypassing failure injection.
    pub fn with_blob(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Make every subsequent `save`/`remove` fail until switched off.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw view of a stored blob.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.read().ok()?.get(key).cloned()
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::backend("writes disabled"));
        }
        Ok(())
    }
}

impl BlobStore for InMemoryBlobStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let map = self
            .inner
            .read()
            .map_err(|_| StorageError::backend("blob store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut map = self
            .inner
            .write()
            .map_err(|_| StorageError::backend("blob store lock poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut map = self
            .inner
            .write()
            .map_err(|_| StorageError::backend("blob store lock poisoned"))?;
        map.remove(key);
        Ok(())
    }
}
