//! Infrastructure layer: catalog persistence, config, notification delivery.

pub mod catalog;
pub mod coerce;
pub mod config;
pub mod sink;
pub mod stock_service;
pub mod workers;

pub use catalog::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore, StoreError};
pub use config::{ConfigError, PrajaConfig};
pub use sink::{MemorySink, NotificationSink, SinkError, TracingSink};
pub use stock_service::{StockResponse, StockService};
pub use workers::{NotificationWorker, WorkerHandle};
