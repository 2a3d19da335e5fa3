//! Stock availability engine.
//!
//! This crate owns the rules for how a product's purchasable quantity,
//! availability flag and automatic pause/resume state evolve, and the seller
//! notifications every change produces. Pure domain logic plus one lock; no IO.

pub mod availability;
pub mod event;
pub mod ledger;
pub mod notification;
pub mod order;
pub mod product;

pub use availability::{Availability, Transition};
pub use event::{StockChange, StockEvent};
pub use ledger::StockLedger;
pub use notification::{Notification, NotificationLog, Tone};
pub use order::{OrderRejection, OrderResult};
pub use product::{ProductRecord, StockStatus};
