use serde::Deserialize;
use serde_json::Value as JsonValue;

use praja_core::DomainError;
use praja_infra::coerce::coerce_quantity;

// -------------------------
// Request DTOs
// -------------------------
//
// Quantities are loosely typed: `"7"`, `7.9` and `-2` arrive as 7, 7 and 0.

#[derive(Debug, Deserialize)]
pub struct AddStockRequest {
    pub name: String,
    pub quantity: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub name: String,
    pub quantity: JsonValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub view: Option<String>,
}

/// Coerce a raw quantity into the ledger's integer input.
pub fn quantity_from(raw: &JsonValue) -> Result<i64, DomainError> {
    let quantity = coerce_quantity(raw)?;
    i64::try_from(quantity)
        .map_err(|_| DomainError::validation(format!("quantity {quantity} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quantities_are_coerced() {
        assert_eq!(quantity_from(&json!("2")), Ok(2));
        assert_eq!(quantity_from(&json!(2.5)), Ok(2));
        assert_eq!(quantity_from(&json!(-4)), Ok(0));
        assert!(matches!(quantity_from(&json!("lots")), Err(DomainError::Validation(_))));
        assert!(matches!(
            quantity_from(&json!(u64::MAX)),
            Err(DomainError::Validation(_))
        ));
    }
}
