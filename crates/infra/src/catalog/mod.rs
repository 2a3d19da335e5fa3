//! Catalog store boundary.
//!
//! The catalog persists the quantity/availability slice of product records.
//! The ledger reads it on startup and the store-backed stock service writes it
//! on every committed mutation.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use praja_core::ProductKey;
use praja_stock::ProductRecord;

pub use in_memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;

/// Failure talking to the catalog backend.
///
/// Carries raw backend text; callers must keep it out of customer-facing
/// messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("catalog store lock poisoned")]
    Poisoned,

    #[error("catalog store unavailable: {0}")]
    Unavailable(String),

    #[error("catalog store backend error: {0}")]
    Backend(String),
}

/// Key/value access to catalog records.
pub trait CatalogStore: Send + Sync {
    /// Every record, for loading a ledger.
    fn load_all(&self) -> Result<Vec<ProductRecord>, StoreError>;

    fn get(&self, key: &ProductKey) -> Result<Option<ProductRecord>, StoreError>;

    /// Insert or replace the record under its key.
    fn put(&self, record: ProductRecord) -> Result<(), StoreError>;

    /// Returns whether a record was deleted.
    fn delete(&self, key: &ProductKey) -> Result<bool, StoreError>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn load_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
        (**self).load_all()
    }

    fn get(&self, key: &ProductKey) -> Result<Option<ProductRecord>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, record: ProductRecord) -> Result<(), StoreError> {
        (**self).put(record)
    }

    fn delete(&self, key: &ProductKey) -> Result<bool, StoreError> {
        (**self).delete(key)
    }
}
