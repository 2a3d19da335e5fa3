use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use praja_core::ProductKey;
use praja_events::Event;

/// What happened to a product's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StockChange {
    ProductCreated { initial: u64 },
    StockIncreased { added: u64, total: u64 },
    StockSet { quantity: u64 },
    OrderProcessed { requested: u64, remaining: u64 },
    ProductRemoved,
    AutoPaused,
    AutoResumed { quantity: u64 },
    NotificationsCleared,
}

/// Event: one ledger mutation, as reported to the seller.
///
/// `product` is `None` only for log-level events (clearing notifications).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEvent {
    pub product: Option<(ProductKey, String)>,
    pub change: StockChange,
    pub occurred_at: DateTime<Utc>,
}

impl StockEvent {
    pub fn for_product(
        key: &ProductKey,
        name: &str,
        change: StockChange,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product: Some((key.clone(), name.to_string())),
            change,
            occurred_at,
        }
    }

    pub fn notifications_cleared(occurred_at: DateTime<Utc>) -> Self {
        Self {
            product: None,
            change: StockChange::NotificationsCleared,
            occurred_at,
        }
    }

    pub fn key(&self) -> Option<&ProductKey> {
        self.product.as_ref().map(|(k, _)| k)
    }

    /// Human-readable seller message.
    pub fn message(&self) -> String {
        let name = self.product.as_ref().map(|(_, n)| n.as_str()).unwrap_or_default();
        match &self.change {
            StockChange::ProductCreated { initial } => {
                format!("NEW PRODUCT: '{name}' added with initial stock of {initial}.")
            }
            StockChange::StockIncreased { added, total } => {
                format!("Stock of '{name}' increased by {added}. New total: {total}.")
            }
            StockChange::StockSet { quantity } => {
                format!("Stock of '{name}' manually set to {quantity}.")
            }
            StockChange::OrderProcessed { requested, remaining } => {
                format!("Order of {requested}x '{name}' processed. Remaining: {remaining}.")
            }
            StockChange::ProductRemoved => format!("Product '{name}' removed from the system."),
            StockChange::AutoPaused => {
                format!("STOCK ALERT: product '{name}' sold out and AUTOMATICALLY PAUSED.")
            }
            StockChange::AutoResumed { quantity } => {
                format!("Product '{name}' resumed. Stock replenished to {quantity}.")
            }
            StockChange::NotificationsCleared => "Notifications cleared by the seller.".to_string(),
        }
    }
}

impl Event for StockEvent {
    fn event_type(&self) -> &'static str {
        match self.change {
            StockChange::ProductCreated { .. } => "stock.product.created",
            StockChange::StockIncreased { .. } => "stock.product.increased",
            StockChange::StockSet { .. } => "stock.product.set",
            StockChange::OrderProcessed { .. } => "stock.order.processed",
            StockChange::ProductRemoved => "stock.product.removed",
            StockChange::AutoPaused => "stock.product.auto_paused",
            StockChange::AutoResumed { .. } => "stock.product.auto_resumed",
            StockChange::NotificationsCleared => "stock.notifications.cleared",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
