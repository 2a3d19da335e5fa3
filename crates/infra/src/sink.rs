//! Notification sinks: where the seller feed ends up outside the ledger.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::info;

use praja_stock::Notification;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

/// Consumer of the ledger's notification feed (e.g. the seller dashboard).
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification) -> Result<(), SinkError>;
}

impl<S> NotificationSink for Arc<S>
where
    S: NotificationSink + ?Sized,
{
    fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        (**self).deliver(notification)
    }
}

/// Writes every notification to the structured log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        info!(
            sequence = notification.sequence,
            event_type = %notification.event_type,
            key = notification.key.as_ref().map(|k| k.as_str()),
            tone = ?notification.tone,
            "{}",
            notification.message
        );
        Ok(())
    }
}

/// Keeps delivered notifications in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.delivered.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for MemorySink {
    fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        self.delivered
            .lock()
            .map_err(|_| SinkError::Unavailable("memory sink poisoned".to_string()))?
            .push(notification.clone());
        Ok(())
    }
}
