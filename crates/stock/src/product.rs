use serde::{Deserialize, Serialize};

use praja_core::{DomainError, DomainResult, ProductKey};

/// A tracked product: the quantity/availability slice of a catalog entry.
///
/// `available` is derived state and always equals `quantity > 0` once a
/// mutation (or a load) has gone through the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    key: ProductKey,
    name: String,
    quantity: u64,
    available: bool,
}

impl ProductRecord {
    /// A freshly created record. The display name is stored trimmed.
    pub fn new(name: &str, quantity: u64) -> DomainResult<Self> {
        let key = ProductKey::parse(name)?;
        Ok(Self {
            key,
            name: name.trim().to_string(),
            quantity,
            available: quantity > 0,
        })
    }

    /// Rebuild a record from a catalog snapshot.
    ///
    /// The supplied `available` flag is kept as-is here; the ledger recomputes
    /// it when the snapshot is loaded.
    pub fn from_snapshot(key: ProductKey, name: impl Into<String>, quantity: u64, available: bool) -> Self {
        Self {
            key,
            name: name.into(),
            quantity,
            available,
        }
    }

    pub fn key(&self) -> &ProductKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn available(&self) -> bool {
        self.available
    }

    /// Redundant double check kept for callers that read possibly stale records.
    pub fn is_purchasable(&self) -> bool {
        self.available && self.quantity > 0
    }

    pub fn restock(&mut self, added: u64) -> DomainResult<u64> {
        self.quantity = self
            .quantity
            .checked_add(added)
            .ok_or_else(|| DomainError::validation("quantity would overflow"))?;
        Ok(self.quantity)
    }

    pub fn sell(&mut self, requested: u64) -> DomainResult<u64> {
        if self.quantity < requested {
            return Err(DomainError::insufficient(requested, self.quantity));
        }
        self.quantity -= requested;
        Ok(self.quantity)
    }

    pub fn set_quantity(&mut self, quantity: u64) {
        self.quantity = quantity;
    }

    pub fn refresh_availability(&mut self) -> bool {
        self.available = self.quantity > 0;
        self.available
    }
}

/// Read-only projection of one product, as shown on the seller dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockStatus {
    pub name: String,
    pub quantity: u64,
    pub available: bool,
    pub auto_paused: bool,
}

impl StockStatus {
    pub fn of(record: &ProductRecord, auto_paused: bool) -> Self {
        Self {
            name: record.name.clone(),
            quantity: record.quantity,
            available: record.available,
            auto_paused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_trims_name_and_derives_availability() {
        let record = ProductRecord::new("  Bolo de Fubá ", 4).unwrap();
        assert_eq!(record.name(), "Bolo de Fubá");
        assert_eq!(record.key().as_str(), "bolo de fubá");
        assert!(record.available());
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(matches!(ProductRecord::new("  ", 1), Err(DomainError::Validation(_))));
    }

    #[test]
    fn selling_more_than_on_hand_leaves_quantity_untouched() {
        let mut record = ProductRecord::new("Pão", 2).unwrap();
        let err = record.sell(3).unwrap_err();
        assert_eq!(err, DomainError::insufficient(3, 2));
        assert_eq!(record.quantity(), 2);
    }

    #[test]
    fn restock_overflow_is_rejected() {
        let mut record = ProductRecord::new("Pão", u64::MAX).unwrap();
        assert!(record.restock(1).is_err());
        assert_eq!(record.quantity(), u64::MAX);
    }

    #[test]
    fn stale_snapshot_is_not_purchasable() {
        let record = ProductRecord::from_snapshot(ProductKey::normalize("Pão"), "Pão", 0, true);
        assert!(!record.is_purchasable());
    }
}
