//! Outcome of an order placed against the ledger.
//!
//! Every outcome carries two audiences: a customer-safe message and, on
//! failure, a seller/diagnostic message with the exact numbers.

use serde::{Deserialize, Serialize};

/// Why an order was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum OrderRejection {
    UnknownProduct,
    InvalidQuantity,
    SoldOut,
    InsufficientStock { available: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub success: bool,
    pub customer_message: String,
    /// `None` on success: a completed sale reaches the seller through the
    /// notification log instead.
    pub seller_message: Option<String>,
    pub rejection: Option<OrderRejection>,
    /// Units left after a successful sale.
    pub remaining: Option<u64>,
}

impl OrderResult {
    pub(crate) fn accepted(name: &str, requested: u64, remaining: u64) -> Self {
        Self {
            success: true,
            customer_message: format!("Your order of {requested}x '{name}' was processed successfully!"),
            seller_message: None,
            rejection: None,
            remaining: Some(remaining),
        }
    }

    pub(crate) fn unknown_product(name: &str) -> Self {
        Self::rejected(
            OrderRejection::UnknownProduct,
            format!("Product '{name}' is not available for sale."),
            format!("ERROR: order attempted for unknown product '{name}'."),
        )
    }

    pub(crate) fn invalid_quantity(name: &str, requested: i64) -> Self {
        Self::rejected(
            OrderRejection::InvalidQuantity,
            format!("Invalid quantity for the order of '{name}'."),
            format!("ERROR: invalid order quantity for '{name}' (requested: {requested})."),
        )
    }

    pub(crate) fn short(name: &str, requested: u64, available: u64) -> Self {
        let (rejection, customer_message) = if available == 0 {
            (
                OrderRejection::SoldOut,
                format!("Product '{name}' is sold out at the moment. We apologize for the inconvenience."),
            )
        } else {
            (
                OrderRejection::InsufficientStock { available },
                format!("We do not have {requested} units of '{name}' in stock. Available: {available}."),
            )
        };
        Self::rejected(
            rejection,
            customer_message,
            format!(
                "ORDER FAILED: insufficient stock for '{name}'. Requested: {requested}, in stock: {available}."
            ),
        )
    }

    fn rejected(rejection: OrderRejection, customer_message: String, seller_message: String) -> Self {
        Self {
            success: false,
            customer_message,
            seller_message: Some(seller_message),
            rejection: Some(rejection),
            remaining: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sold_out_and_insufficient_read_differently_to_customers() {
        let sold_out = OrderResult::short("Bolo", 2, 0);
        let short = OrderResult::short("Bolo", 2, 1);

        assert_eq!(sold_out.rejection, Some(OrderRejection::SoldOut));
        assert!(sold_out.customer_message.contains("sold out"));
        assert_eq!(short.rejection, Some(OrderRejection::InsufficientStock { available: 1 }));
        assert!(short.customer_message.contains("Available: 1"));

        // The seller always sees the numbers.
        for r in [&sold_out, &short] {
            let seller = r.seller_message.as_deref().unwrap();
            assert!(seller.contains("Requested: 2"));
        }
    }

    #[test]
    fn accepted_has_no_seller_message() {
        let ok = OrderResult::accepted("Bolo", 1, 4);
        assert!(ok.success);
        assert_eq!(ok.seller_message, None);
        assert_eq!(ok.remaining, Some(4));
    }
}
