//! The stock ledger: single owner of quantity, availability and pause state.
//!
//! All state (records, pause set, notification log) sits behind one lock.
//! Every mutation runs start-to-finish under the write lock and appends its
//! notifications before the lock is released; publication to the event bus
//! happens afterwards so a slow subscriber can never stall a sale.
//!
//! The publish gate is taken before the state lock is released, so outboxes
//! reach the bus in commit order and subscribers see strictly increasing
//! sequence numbers.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use praja_core::{DomainError, DomainResult, ProductKey};
use praja_events::{EventBus, InMemoryEventBus, Subscription};

use crate::availability::{Availability, Transition};
use crate::event::{StockChange, StockEvent};
use crate::notification::{Notification, NotificationLog};
use crate::order::OrderResult;
use crate::product::{ProductRecord, StockStatus};

#[derive(Debug, Default)]
struct LedgerState {
    products: BTreeMap<ProductKey, ProductRecord>,
    paused: HashSet<ProductKey>,
    log: NotificationLog,
    /// Notifications appended by the current critical section, not yet published.
    outbox: Vec<Notification>,
}

impl LedgerState {
    fn record(&mut self, event: StockEvent) {
        let notification = self.log.append(&event).clone();
        self.outbox.push(notification);
    }

    fn availability_of(&self, key: &ProductKey) -> Availability {
        if self.paused.contains(key) {
            Availability::Paused
        } else {
            Availability::Active
        }
    }

    /// Reconcile `available` and pause membership after a quantity change.
    ///
    /// The only code path that adds keys to the pause set. Unknown keys are a no-op.
    fn recompute(&mut self, key: &ProductKey, now: DateTime<Utc>) {
        let was = self.availability_of(key);
        let Some(record) = self.products.get_mut(key) else {
            return;
        };
        record.refresh_availability();
        let quantity = record.quantity();
        let name = record.name().to_string();

        match was.transition(quantity) {
            Some(Transition::AutoResumed) => {
                self.paused.remove(key);
                info!(key = %key, quantity, "product auto-resumed");
                self.record(StockEvent::for_product(
                    key,
                    &name,
                    StockChange::AutoResumed { quantity },
                    now,
                ));
            }
            Some(Transition::AutoPaused) => {
                self.paused.insert(key.clone());
                info!(key = %key, "product sold out, auto-paused");
                self.record(StockEvent::for_product(key, &name, StockChange::AutoPaused, now));
            }
            None => {}
        }
    }

    fn status(&self, key: &ProductKey) -> Option<StockStatus> {
        self.products
            .get(key)
            .map(|r| StockStatus::of(r, self.paused.contains(key)))
    }

    fn statuses(&self) -> impl Iterator<Item = StockStatus> + '_ {
        self.products
            .iter()
            .map(|(key, r)| StockStatus::of(r, self.paused.contains(key)))
    }
}

fn positive(quantity: i64) -> DomainResult<u64> {
    match u64::try_from(quantity) {
        Ok(q) if q > 0 => Ok(q),
        _ => Err(DomainError::validation(format!(
            "quantity must be a positive integer (got {quantity})"
        ))),
    }
}

/// Stock ledger with pluggable notification transport.
///
/// `B` receives a copy of every notification after the mutation that produced
/// it has committed. The default bus is in-memory; subscribe with
/// [`StockLedger::subscribe`].
#[derive(Debug)]
pub struct StockLedger<B = InMemoryEventBus<Notification>> {
    state: RwLock<LedgerState>,
    publish_gate: Mutex<()>,
    bus: B,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::with_bus(InMemoryEventBus::new())
    }

    /// Build a ledger from catalog snapshots. See [`StockLedger::load_with_bus`].
    pub fn load(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        Self::load_with_bus(records, InMemoryEventBus::new())
    }
}

impl Default for StockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> StockLedger<B>
where
    B: EventBus<Notification>,
{
    pub fn with_bus(bus: B) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            publish_gate: Mutex::new(()),
            bus,
        }
    }

    /// Build a ledger from catalog snapshots.
    ///
    /// `available` is recomputed from quantity and zero-quantity products start
    /// paused. Loading is silent: no notifications are emitted. A later snapshot
    /// for the same key replaces an earlier one.
    pub fn load_with_bus(records: impl IntoIterator<Item = ProductRecord>, bus: B) -> Self {
        let mut state = LedgerState::default();
        for mut record in records {
            if record.key().is_empty() {
                warn!(name = record.name(), "skipping catalog record with blank key");
                continue;
            }
            let key = record.key().clone();
            if record.refresh_availability() {
                state.paused.remove(&key);
            } else {
                state.paused.insert(key.clone());
            }
            state.products.insert(key, record);
        }
        debug!(products = state.products.len(), paused = state.paused.len(), "stock ledger loaded");

        Self {
            state: RwLock::new(state),
            publish_gate: Mutex::new(()),
            bus,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Receive every notification appended from now on.
    pub fn subscribe(&self) -> Subscription<Notification> {
        self.bus.subscribe()
    }

    /// Add units of a product, creating it on first sight.
    pub fn add_stock(&self, name: &str, quantity: i64) -> DomainResult<StockStatus> {
        let key = ProductKey::parse(name)?;
        let added = positive(quantity)?;

        self.mutate(|state, now| {
            if let Some(record) = state.products.get_mut(&key) {
                let total = record.restock(added)?;
                let display = record.name().to_string();
                debug!(key = %key, added, total, "stock increased");
                state.record(StockEvent::for_product(
                    &key,
                    &display,
                    StockChange::StockIncreased { added, total },
                    now,
                ));
            } else {
                let record = ProductRecord::new(name, added)?;
                debug!(key = %key, initial = added, "product created");
                state.record(StockEvent::for_product(
                    &key,
                    record.name(),
                    StockChange::ProductCreated { initial: added },
                    now,
                ));
                state.products.insert(key.clone(), record);
            }

            state.recompute(&key, now);
            state
                .status(&key)
                .ok_or_else(|| DomainError::invariant("product vanished during add_stock"))
        })
    }

    /// Administrative removal. Also evicts pause membership.
    pub fn remove_product(&self, name: &str) -> DomainResult<()> {
        let key = ProductKey::parse(name)?;

        self.mutate(|state, now| {
            let record = state
                .products
                .remove(&key)
                .ok_or_else(|| DomainError::not_found(format!("product '{}'", name.trim())))?;
            state.paused.remove(&key);
            debug!(key = %key, "product removed");
            state.record(StockEvent::for_product(
                &key,
                record.name(),
                StockChange::ProductRemoved,
                now,
            ));
            Ok(())
        })
    }

    /// Manual edit from the seller: set the on-hand quantity outright.
    pub fn set_quantity(&self, name: &str, quantity: i64) -> DomainResult<StockStatus> {
        let key = ProductKey::parse(name)?;
        let quantity = u64::try_from(quantity).map_err(|_| {
            DomainError::validation(format!("quantity cannot be negative (got {quantity})"))
        })?;

        self.mutate(|state, now| {
            let record = state
                .products
                .get_mut(&key)
                .ok_or_else(|| DomainError::not_found(format!("product '{}'", name.trim())))?;
            record.set_quantity(quantity);
            let display = record.name().to_string();
            debug!(key = %key, quantity, "stock set manually");
            state.record(StockEvent::for_product(
                &key,
                &display,
                StockChange::StockSet { quantity },
                now,
            ));

            state.recompute(&key, now);
            state
                .status(&key)
                .ok_or_else(|| DomainError::invariant("product vanished during set_quantity"))
        })
    }

    /// Sell `requested` units.
    ///
    /// An attempt against an unknown product is reported to the caller only;
    /// there is no record to attach a seller notification to.
    pub fn place_order(&self, name: &str, requested: i64) -> OrderResult {
        let key = ProductKey::normalize(name);

        self.mutate(|state, now| {
            let Some(record) = state.products.get_mut(&key) else {
                debug!(key = %key, "order for unknown product");
                return OrderResult::unknown_product(name.trim());
            };
            let display = record.name().to_string();

            let requested = match u64::try_from(requested) {
                Ok(q) if q > 0 => q,
                _ => return OrderResult::invalid_quantity(&display, requested),
            };

            let remaining = match record.sell(requested) {
                Ok(remaining) => remaining,
                Err(_) => {
                    debug!(key = %key, requested, available = record.quantity(), "order refused");
                    return OrderResult::short(&display, requested, record.quantity());
                }
            };

            debug!(key = %key, requested, remaining, "order processed");
            state.record(StockEvent::for_product(
                &key,
                &display,
                StockChange::OrderProcessed { requested, remaining },
                now,
            ));
            state.recompute(&key, now);

            OrderResult::accepted(&display, requested, remaining)
        })
    }

    pub fn check_availability(&self, name: &str) -> bool {
        self.read()
            .products
            .get(&ProductKey::normalize(name))
            .is_some_and(ProductRecord::is_purchasable)
    }

    pub fn query_status(&self, name: &str) -> Option<StockStatus> {
        self.read().status(&ProductKey::normalize(name))
    }

    /// Full record for catalog write-back.
    pub fn record(&self, name: &str) -> Option<ProductRecord> {
        self.read().products.get(&ProductKey::normalize(name)).cloned()
    }

    /// All records, ordered by key.
    pub fn snapshot(&self) -> Vec<ProductRecord> {
        self.read().products.values().cloned().collect()
    }

    pub fn list_all(&self) -> Vec<StockStatus> {
        self.read().statuses().collect()
    }

    pub fn list_available(&self) -> Vec<StockStatus> {
        self.read().statuses().filter(|s| s.available).collect()
    }

    pub fn list_paused(&self) -> Vec<StockStatus> {
        self.read().statuses().filter(|s| s.auto_paused).collect()
    }

    pub fn len(&self) -> usize {
        self.read().products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().products.is_empty()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.read().log.entries().to_vec()
    }

    /// Truncate the log; the returned entry (the clear record) is all that remains.
    pub fn clear_notifications(&self) -> Notification {
        self.mutate(|state, now| {
            let cleared = state.log.clear(now).clone();
            state.outbox.push(cleared.clone());
            cleared
        })
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut LedgerState, DateTime<Utc>) -> T) -> T {
        let (result, outbox, _gate) = {
            let mut state = self.write();
            let result = op(&mut *state, Utc::now());
            let outbox = std::mem::take(&mut state.outbox);
            // Lock order: state, then gate. Never the other way round.
            let gate = self.publish_gate.lock().unwrap_or_else(PoisonError::into_inner);
            (result, outbox, gate)
        };

        for notification in outbox {
            if let Err(err) = self.bus.publish(notification) {
                warn!(error = ?err, "failed to publish stock notification");
            }
        }

        result
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
