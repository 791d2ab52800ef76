use std::sync::Arc;

use tracing::{error, warn};

use pizzapos_core::{BlobStore, StorageError, StorageResult};

use crate::Inventory;

/// Default blob key of the inventory document.
pub const INVENTORY_KEY: &str = "pizzaShopInventory";

/// Inventory persistence.
///
/// `load` never fails: a missing or unreadable document yields the default
/// record (tracking off, count 0).
pub trait InventoryRepository: Send + Sync {
    fn load(&self) -> Inventory;
    fn save(&self, inventory: &Inventory) -> StorageResult<()>;
    fn clear(&self) -> StorageResult<()>;
}

impl<R> InventoryRepository for Arc<R>
where
    R: InventoryRepository + ?Sized,
{
    fn load(&self) -> Inventory {
        (**self).load()
    }

    fn save(&self, inventory: &Inventory) -> StorageResult<()> {
        (**self).save(inventory)
    }

    fn clear(&self) -> StorageResult<()> {
        (**self).clear()
    }
}

/// Inventory stored as one JSON document in a [`BlobStore`].
#[derive(Debug)]
pub struct StoreInventoryRepository<S> {
    store: S,
    key: String,
}

impl<S: BlobStore> StoreInventoryRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, INVENTORY_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl<S: BlobStore> InventoryRepository for StoreInventoryRepository<S> {
    fn load(&self) -> Inventory {
        match self.store.load(&self.key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(key = %self.key, error = %err, "stored inventory unreadable; using defaults");
                Inventory::default()
            }),
            Ok(None) => Inventory::default(),
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read inventory; using defaults");
                Inventory::default()
            }
        }
    }

    fn save(&self, inventory: &Inventory) -> StorageResult<()> {
        serde_json::to_string(inventory)
            .map_err(StorageError::from)
            .and_then(|json| self.store.save(&self.key, &json))
            .inspect_err(|err| error!(key = %self.key, error = %err, "failed to save inventory"))
    }

    fn clear(&self) -> StorageResult<()> {
        self.store
            .remove(&self.key)
            .inspect_err(|err| error!(key = %self.key, error = %err, "failed to clear inventory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pizzapos_core::InMemoryBlobStore;

    #[test]
    fn round_trips_through_store() {
        let store = Arc::new(InMemoryBlobStore::new());
        let repo = StoreInventoryRepository::new(Arc::clone(&store));
        assert_eq!(repo.load(), Inventory::default());

        let mut inv = Inventory::default();
        inv.set_tracking(true);
        inv.set_count(12, 99);
        repo.save(&inv).unwrap();
        assert_eq!(repo.load(), inv);

        repo.clear().unwrap();
        assert!(store.raw(INVENTORY_KEY).is_none());
    }

    #[test]
    fn corrupt_document_yields_defaults() {
        let repo = StoreInventoryRepository::new(InMemoryBlobStore::new().with_blob(INVENTORY_KEY, "[1,2"));
        assert_eq!(repo.load(), Inventory::default());
    }

    #[test]
    fn write_failures_surface() {
        let store = InMemoryBlobStore::new();
        store.fail_writes(true);
        let repo = StoreInventoryRepository::new(store);
        assert!(repo.save(&Inventory::default()).is_err());
        assert!(repo.clear().is_err());
    }
}
