use chrono::{DateTime, Utc};

/// A recorded fact, as carried on the bus and into notification logs.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted type name (e.g. "stock.product.created").
    fn event_type(&self) -> &'static str;

    fn occurred_at(&self) -> DateTime<Utc>;
}
