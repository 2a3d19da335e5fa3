//! Automatic pause/resume state machine.
//!
//! Every tracked product is in exactly one of two states. The only input is the
//! sign of its quantity after a mutation; the only outputs are the two
//! transitions, each of which produces exactly one seller notification.
//!
//! ```text
//!            quantity == 0
//!   Active ───────────────▶ Paused
//!     ▲                       │
//!     └───────────────────────┘
//!            quantity > 0
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// Purchasable.
    Active,
    /// Sold out and automatically withdrawn from sale.
    Paused,
}

/// A genuine state change observed by [`Availability::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    AutoPaused,
    AutoResumed,
}

impl Availability {
    /// The state a product with `quantity` units on hand should be in.
    pub fn for_quantity(quantity: u64) -> Self {
        if quantity > 0 {
            Availability::Active
        } else {
            Availability::Paused
        }
    }

    pub fn is_active(self) -> bool {
        self == Availability::Active
    }

    /// Reconcile the previously observed state with the current quantity.
    ///
    /// Returns `None` for zero-to-zero and positive-to-positive mutations, so
    /// repeated sales or restocks never repeat a notification.
    pub fn transition(self, quantity: u64) -> Option<Transition> {
        match (self, Self::for_quantity(quantity)) {
            (Availability::Paused, Availability::Active) => Some(Transition::AutoResumed),
            (Availability::Active, Availability::Paused) => Some(Transition::AutoPaused),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_sign_changes_transition() {
        assert_eq!(Availability::Active.transition(0), Some(Transition::AutoPaused));
        assert_eq!(Availability::Paused.transition(3), Some(Transition::AutoResumed));
        assert_eq!(Availability::Active.transition(3), None);
        assert_eq!(Availability::Paused.transition(0), None);
    }

    #[test]
    fn state_follows_quantity_sign() {
        assert_eq!(Availability::for_quantity(0), Availability::Paused);
        assert_eq!(Availability::for_quantity(1), Availability::Active);
        assert!(Availability::for_quantity(u64::MAX).is_active());
    }
}
