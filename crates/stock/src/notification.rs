//! Seller notification feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use praja_core::ProductKey;
use praja_events::Event;

use crate::event::{StockChange, StockEvent};

/// How the seller dashboard should highlight an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Alert,
    Success,
    Warning,
    Info,
}

impl Tone {
    fn of(change: &StockChange) -> Self {
        match change {
            StockChange::AutoPaused => Tone::Alert,
            StockChange::ProductCreated { .. } | StockChange::AutoResumed { .. } => Tone::Success,
            StockChange::ProductRemoved | StockChange::NotificationsCleared => Tone::Warning,
            _ => Tone::Info,
        }
    }
}

/// One timestamped entry of the notification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Monotonic across the lifetime of a log, including clears.
    pub sequence: u64,
    pub occurred_at: DateTime<Utc>,
    pub event_type: String,
    pub key: Option<ProductKey>,
    pub tone: Tone,
    pub message: String,
}

impl Notification {
    pub fn from_event(sequence: u64, event: &StockEvent) -> Self {
        Self {
            sequence,
            occurred_at: event.occurred_at(),
            event_type: event.event_type().to_string(),
            key: event.key().cloned(),
            tone: Tone::of(&event.change),
            message: event.message(),
        }
    }
}

impl core::fmt::Display for Notification {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}] {}", self.occurred_at.format("%H:%M:%S"), self.message)
    }
}

/// Append-only log; only [`NotificationLog::clear`] removes entries.
#[derive(Debug, Clone)]
pub struct NotificationLog {
    entries: Vec<Notification>,
    next_sequence: u64,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 1,
        }
    }

    pub fn append(&mut self, event: &StockEvent) -> &Notification {
        let notification = Notification::from_event(self.next_sequence, event);
        self.next_sequence += 1;
        self.entries.push(notification);
        &self.entries[self.entries.len() - 1]
    }

    /// Truncate, then record the clear itself.
    pub fn clear(&mut self, occurred_at: DateTime<Utc>) -> &Notification {
        self.entries.clear();
        self.append(&StockEvent::notifications_cleared(occurred_at))
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new()
    }
}
