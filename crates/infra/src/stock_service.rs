//! Store-backed stock service.
//!
//! The persistence-backed counterpart of the in-memory ledger: each operation
//! is a serialized read-modify-write against a [`CatalogStore`], driven by the
//! same availability state machine, and answered with a sanitized
//! [`StockResponse`] envelope instead of a typed error.
//!
//! ```text
//! raw input ─▶ coerce ─▶ lock ─▶ get ─▶ mutate + transition ─▶ put ─▶ unlock ─▶ envelope
//! ```
//!
//! Store failures are logged here and reported to the caller with a generic
//! message; the raw error text only travels in `diagnostic`.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info};

use praja_core::{DomainError, ProductKey};
use praja_stock::{Availability, ProductRecord, StockChange, StockEvent, StockStatus, Transition};

use crate::catalog::{CatalogStore, StoreError};
use crate::coerce::coerce_quantity;

/// Result envelope handed back to transport layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockResponse {
    pub success: bool,
    /// Safe to show to anyone.
    pub message: String,
    /// Seller/operator detail; may contain raw backend error text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StockStatus>,
    /// Seller notifications produced by the mutation.
    pub notices: Vec<String>,
}

impl StockResponse {
    fn failure(message: impl Into<String>, diagnostic: String) -> Self {
        Self {
            success: false,
            message: message.into(),
            diagnostic: Some(diagnostic),
            status: None,
            notices: Vec::new(),
        }
    }
}

#[derive(Debug)]
enum Failure {
    Domain(DomainError),
    Store(StoreError),
}

impl From<DomainError> for Failure {
    fn from(value: DomainError) -> Self {
        Failure::Domain(value)
    }
}

impl From<StoreError> for Failure {
    fn from(value: StoreError) -> Self {
        Failure::Store(value)
    }
}

impl From<crate::coerce::CoercionError> for Failure {
    fn from(value: crate::coerce::CoercionError) -> Self {
        Failure::Domain(value.into())
    }
}

type Committed = (Option<StockStatus>, Vec<String>);

fn customer_message(err: &DomainError) -> String {
    match err {
        DomainError::Validation(_) => "Invalid product name or quantity.".to_string(),
        DomainError::NotFound(_) => "Product not found.".to_string(),
        DomainError::InsufficientStock { available: 0, .. } => {
            "Product is sold out at the moment.".to_string()
        }
        DomainError::InsufficientStock { available, .. } => {
            format!("Insufficient stock. Available: {available}.")
        }
        DomainError::InvariantViolation(_) => "Unable to update stock.".to_string(),
    }
}

/// Persisted records uphold `paused <=> quantity == 0`, so the previous state
/// is recovered from the stored quantity.
fn settle(record: &mut ProductRecord, was: Availability, change: StockChange) -> Vec<String> {
    let now = Utc::now();
    record.refresh_availability();
    let key = record.key().clone();
    let mut notices = vec![StockEvent::for_product(&key, record.name(), change, now).message()];

    let quantity = record.quantity();
    let transition = match was.transition(quantity) {
        Some(Transition::AutoPaused) => Some(StockChange::AutoPaused),
        Some(Transition::AutoResumed) => Some(StockChange::AutoResumed { quantity }),
        None => None,
    };
    if let Some(change) = transition {
        info!(key = %key, quantity, "catalog availability transition");
        notices.push(StockEvent::for_product(&key, record.name(), change, now).message());
    }
    notices
}

fn status_of(record: &ProductRecord) -> StockStatus {
    StockStatus::of(record, record.quantity() == 0)
}

/// Stock operations applied directly to a catalog store.
#[derive(Debug)]
pub struct StockService<S> {
    store: S,
    gate: Mutex<()>,
}

impl<S> StockService<S>
where
    S: CatalogStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Manual edit: set the stored quantity outright.
    pub fn update_stock(&self, name: &str, raw_quantity: &JsonValue) -> StockResponse {
        let result = self.try_update_stock(name, raw_quantity);
        self.respond("update_stock", result, "Stock updated successfully.")
    }

    pub fn add_stock(&self, name: &str, raw_quantity: &JsonValue) -> StockResponse {
        let result = self.try_add_stock(name, raw_quantity);
        self.respond("add_stock", result, "Stock added successfully.")
    }

    pub fn place_order(&self, name: &str, raw_quantity: &JsonValue) -> StockResponse {
        let result = self.try_place_order(name, raw_quantity);
        self.respond("place_order", result, "Order processed successfully.")
    }

    pub fn remove_product(&self, name: &str) -> StockResponse {
        let result = self.try_remove_product(name);
        self.respond("remove_product", result, "Product removed successfully.")
    }

    pub fn query_status(&self, name: &str) -> Result<Option<StockStatus>, StoreError> {
        let key = ProductKey::normalize(name);
        Ok(self.store.get(&key)?.as_ref().map(status_of))
    }

    fn try_update_stock(&self, name: &str, raw: &JsonValue) -> Result<Committed, Failure> {
        let key = ProductKey::parse(name)?;
        let quantity = coerce_quantity(raw)?;

        self.transact(|store| {
            let mut record = store
                .get(&key)?
                .ok_or_else(|| DomainError::not_found(format!("product '{key}'")))?;
            let was = Availability::for_quantity(record.quantity());
            record.set_quantity(quantity);
            let notices = settle(&mut record, was, StockChange::StockSet { quantity });
            let status = status_of(&record);
            store.put(record)?;
            Ok((Some(status), notices))
        })
    }

    fn try_add_stock(&self, name: &str, raw: &JsonValue) -> Result<Committed, Failure> {
        let key = ProductKey::parse(name)?;
        let added = coerce_quantity(raw)?;
        if added == 0 {
            return Err(DomainError::validation("quantity to add must be positive").into());
        }

        self.transact(|store| {
            let (mut record, was, change) = match store.get(&key)? {
                Some(mut record) => {
                    let was = Availability::for_quantity(record.quantity());
                    let total = record.restock(added)?;
                    (record, was, StockChange::StockIncreased { added, total })
                }
                None => (
                    ProductRecord::new(name, added)?,
                    Availability::Active,
                    StockChange::ProductCreated { initial: added },
                ),
            };
            let notices = settle(&mut record, was, change);
            let status = status_of(&record);
            store.put(record)?;
            Ok((Some(status), notices))
        })
    }

    fn try_place_order(&self, name: &str, raw: &JsonValue) -> Result<Committed, Failure> {
        let key = ProductKey::parse(name)?;
        let requested = coerce_quantity(raw)?;
        if requested == 0 {
            return Err(DomainError::validation("order quantity must be positive").into());
        }

        self.transact(|store| {
            let mut record = store
                .get(&key)?
                .ok_or_else(|| DomainError::not_found(format!("product '{key}'")))?;
            let was = Availability::for_quantity(record.quantity());
            let remaining = record.sell(requested)?;
            let notices = settle(
                &mut record,
                was,
                StockChange::OrderProcessed { requested, remaining },
            );
            let status = status_of(&record);
            store.put(record)?;
            Ok((Some(status), notices))
        })
    }

    fn try_remove_product(&self, name: &str) -> Result<Committed, Failure> {
        let key = ProductKey::parse(name)?;

        self.transact(|store| {
            let record = store
                .get(&key)?
                .ok_or_else(|| DomainError::not_found(format!("product '{key}'")))?;
            store.delete(&key)?;
            let notice = StockEvent::for_product(&key, record.name(), StockChange::ProductRemoved, Utc::now())
                .message();
            Ok((None, vec![notice]))
        })
    }

    fn transact(&self, op: impl FnOnce(&S) -> Result<Committed, Failure>) -> Result<Committed, Failure> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        op(&self.store)
    }

    fn respond(
        &self,
        operation: &'static str,
        result: Result<Committed, Failure>,
        success: &str,
    ) -> StockResponse {
        match result {
            Ok((status, notices)) => {
                debug!(operation, "catalog stock change committed");
                StockResponse {
                    success: true,
                    message: success.to_string(),
                    diagnostic: None,
                    status,
                    notices,
                }
            }
            Err(Failure::Domain(err)) => {
                debug!(operation, error = %err, "catalog stock change rejected");
                StockResponse::failure(customer_message(&err), err.to_string())
            }
            Err(Failure::Store(err)) => {
                error!(operation, error = %err, "catalog store failure");
                StockResponse::failure("Internal error while updating stock.", err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::catalog::InMemoryCatalogStore;

    fn service() -> StockService<InMemoryCatalogStore> {
        StockService::new(InMemoryCatalogStore::new())
    }

    #[test]
    fn add_sell_out_and_manual_resume() {
        let svc = service();

        let created = svc.add_stock("Bolo", &json!(5));
        assert!(created.success);
        assert_eq!(created.notices.len(), 1);

        let sold = svc.place_order("bolo", &json!("5"));
        assert!(sold.success);
        assert_eq!(sold.notices.len(), 2);
        assert!(sold.notices[1].contains("AUTOMATICALLY PAUSED"));
        let status = sold.status.unwrap();
        assert!(!status.available);
        assert!(status.auto_paused);

        let resumed = svc.update_stock("BOLO", &json!(2.7));
        assert!(resumed.success);
        assert_eq!(resumed.status.as_ref().map(|s| s.quantity), Some(2));
        assert!(resumed.notices[1].contains("resumed"));

        let stored = svc.query_status("Bolo").unwrap().unwrap();
        assert_eq!(stored.quantity, 2);
        assert!(stored.available);
    }

    #[test]
    fn negative_update_clamps_to_zero_and_pauses() {
        let svc = service();
        svc.add_stock("Bolo", &json!(3));

        let response = svc.update_stock("Bolo", &json!(-8));

        assert!(response.success);
        let status = response.status.unwrap();
        assert_eq!(status.quantity, 0);
        assert!(!status.available);
    }

    #[test]
    fn invalid_numbers_fail_without_mutation() {
        let svc = service();
        svc.add_stock("Bolo", &json!(3));

        for raw in [json!("abc"), json!(null), json!(true)] {
            let response = svc.update_stock("Bolo", &raw);
            assert!(!response.success);
            assert_eq!(response.message, "Invalid product name or quantity.");
        }
        assert_eq!(svc.query_status("Bolo").unwrap().unwrap().quantity, 3);
    }

    #[test]
    fn unknown_product_and_short_orders() {
        let svc = service();
        assert_eq!(svc.update_stock("Bolo", &json!(1)).message, "Product not found.");
        assert_eq!(svc.remove_product("Bolo").message, "Product not found.");

        svc.add_stock("Bolo", &json!(2));
        let short = svc.place_order("Bolo", &json!(3));
        assert!(!short.success);
        assert_eq!(short.message, "Insufficient stock. Available: 2.");
        assert_eq!(svc.query_status("Bolo").unwrap().unwrap().quantity, 2);
    }

    #[test]
    fn remove_deletes_from_store() {
        let svc = service();
        svc.add_stock("Bolo", &json!(1));

        let removed = svc.remove_product(" bolo ");

        assert!(removed.success);
        assert!(removed.status.is_none());
        assert_eq!(svc.query_status("Bolo").unwrap(), None);
    }

    struct BrokenStore;

    impl CatalogStore for BrokenStore {
        fn load_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        fn get(&self, _key: &ProductKey) -> Result<Option<ProductRecord>, StoreError> {
            Ok(Some(ProductRecord::new("Bolo", 1).unwrap()))
        }
        fn put(&self, _record: ProductRecord) -> Result<(), StoreError> {
            Err(StoreError::Backend("deadlock detected on relation produto".into()))
        }
        fn delete(&self, _key: &ProductKey) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn store_errors_never_reach_the_customer_message() {
        let svc = StockService::new(BrokenStore);

        let response = svc.update_stock("Bolo", &json!(4));

        assert!(!response.success);
        assert_eq!(response.message, "Internal error while updating stock.");
        assert!(!response.message.contains("deadlock"));
        assert!(response.diagnostic.unwrap().contains("deadlock"));
        assert!(response.notices.is_empty());
    }
}
