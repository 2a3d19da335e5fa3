use std::sync::{Arc, Mutex, PoisonError};

use tracing::error;

use praja_core::ProductKey;
use praja_infra::CatalogStore;
use praja_stock::StockLedger;

/// Everything the handlers share.
///
/// The ledger is authoritative. When a catalog is attached, every successful
/// mutation is written back to it afterwards.
pub struct AppServices {
    ledger: StockLedger,
    catalog: Option<Arc<dyn CatalogStore>>,
    /// Held across read-then-write of a write-back, so the last write to land
    /// always carries the newest ledger state.
    writeback: Mutex<()>,
}

impl AppServices {
    pub fn new(ledger: StockLedger) -> Self {
        Self {
            ledger,
            catalog: None,
            writeback: Mutex::new(()),
        }
    }

    pub fn with_catalog(ledger: StockLedger, catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            ledger,
            catalog: Some(catalog),
            writeback: Mutex::new(()),
        }
    }

    pub fn ledger(&self) -> &StockLedger {
        &self.ledger
    }

    /// Mirror the ledger's current record for `name` into the catalog.
    ///
    /// Failures are logged, not returned: the ledger has already committed.
    pub fn persist(&self, name: &str) {
        let Some(catalog) = &self.catalog else {
            return;
        };

        let key = ProductKey::normalize(name);
        let _guard = self.writeback.lock().unwrap_or_else(PoisonError::into_inner);
        let result = match self.ledger.record(name) {
            Some(record) => catalog.put(record),
            None => catalog.delete(&key).map(|_| ()),
        };
        if let Err(err) = result {
            error!(key = %key, error = %err, "catalog write-back failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    use praja_infra::{InMemoryCatalogStore, StoreError};
    use praja_stock::ProductRecord;

    #[test]
    fn persist_mirrors_puts_and_removals() {
        let catalog = Arc::new(InMemoryCatalogStore::new());
        let services = AppServices::with_catalog(StockLedger::new(), catalog.clone());

        services.ledger().add_stock("Bolo", 2).unwrap();
        services.persist("Bolo");
        let stored = catalog.get(&ProductKey::normalize("bolo")).unwrap().unwrap();
        assert_eq!(stored.quantity(), 2);

        services.ledger().remove_product("Bolo").unwrap();
        services.persist("Bolo");
        assert!(catalog.load_all().unwrap().is_empty());
    }

    /// Slow on odd quantities, so racing writers finish out of order.
    struct LaggyStore {
        inner: InMemoryCatalogStore,
    }

    impl CatalogStore for LaggyStore {
        fn load_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
            self.inner.load_all()
        }
        fn get(&self, key: &ProductKey) -> Result<Option<ProductRecord>, StoreError> {
            self.inner.get(key)
        }
        fn put(&self, record: ProductRecord) -> Result<(), StoreError> {
            if record.quantity() % 2 == 1 {
                thread::sleep(Duration::from_millis(3));
            }
            self.inner.put(record)
        }
        fn delete(&self, key: &ProductKey) -> Result<bool, StoreError> {
            self.inner.delete(key)
        }
    }

    #[test]
    fn concurrent_write_backs_leave_the_newest_quantity() {
        let catalog = Arc::new(LaggyStore {
            inner: InMemoryCatalogStore::new(),
        });
        let services = Arc::new(AppServices::with_catalog(StockLedger::new(), catalog.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let services = Arc::clone(&services);
                thread::spawn(move || {
                    for _ in 0..50 {
                        services.ledger().add_stock("Bolo", 1).unwrap();
                        services.persist("Bolo");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let key = ProductKey::normalize("Bolo");
        let stored = catalog.get(&key).unwrap().unwrap();
        assert_eq!(services.ledger().query_status("Bolo").unwrap().quantity, 400);
        assert_eq!(stored.quantity(), 400);
    }

    #[test]
    fn persist_without_catalog_is_a_no_op() {
        let services = AppServices::new(StockLedger::new());
        services.ledger().add_stock("Bolo", 1).unwrap();
        services.persist("Bolo");
        assert_eq!(services.ledger().len(), 1);
    }
}
