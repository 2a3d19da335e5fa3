use std::collections::BTreeMap;
use std::sync::RwLock;

use praja_core::ProductKey;
use praja_stock::ProductRecord;

use super::{CatalogStore, StoreError};

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<BTreeMap<ProductKey, ProductRecord>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with catalog records.
    pub fn with_records(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.key().clone(), r))
            .collect();
        Self {
            inner: RwLock::new(map),
        }
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn load_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }

    fn get(&self, key: &ProductKey) -> Result<Option<ProductRecord>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, record: ProductRecord) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(record.key().clone(), record);
        Ok(())
    }

    fn delete(&self, key: &ProductKey) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(key).is_some())
    }
}
