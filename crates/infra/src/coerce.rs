//! Defensive parsing of quantities that arrive as loosely typed JSON.
//!
//! Integers pass through, fractional values are floored, numeric strings are
//! parsed, and anything below zero is clamped to zero. Values that are not
//! numbers at all are rejected so the caller can fail without mutating.

use serde_json::{Number, Value};
use thiserror::Error;

use praja_core::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("quantity is not a number: {0}")]
    NotANumber(String),

    #[error("quantity is out of range: {0}")]
    OutOfRange(String),
}

impl From<CoercionError> for DomainError {
    fn from(value: CoercionError) -> Self {
        DomainError::validation(value.to_string())
    }
}

pub fn coerce_quantity(raw: &Value) -> Result<u64, CoercionError> {
    match raw {
        Value::Number(n) => from_number(n),
        Value::String(s) => from_str(s.trim()),
        other => Err(CoercionError::NotANumber(other.to_string())),
    }
}

fn from_number(n: &Number) -> Result<u64, CoercionError> {
    if let Some(u) = n.as_u64() {
        return Ok(u);
    }
    if n.as_i64().is_some() {
        // Any integer that is not a u64 is negative.
        return Ok(0);
    }
    match n.as_f64() {
        Some(f) => from_float(f, || n.to_string()),
        None => Err(CoercionError::NotANumber(n.to_string())),
    }
}

fn from_str(s: &str) -> Result<u64, CoercionError> {
    if let Ok(i) = s.parse::<i128>() {
        return if i <= 0 {
            Ok(0)
        } else {
            u64::try_from(i).map_err(|_| CoercionError::OutOfRange(s.to_string()))
        };
    }
    match s.parse::<f64>() {
        Ok(f) => from_float(f, || s.to_string()),
        Err(_) => Err(CoercionError::NotANumber(s.to_string())),
    }
}

fn from_float(f: f64, shown: impl Fn() -> String) -> Result<u64, CoercionError> {
    if !f.is_finite() {
        return Err(CoercionError::NotANumber(shown()));
    }
    let floored = f.floor();
    if floored <= 0.0 {
        Ok(0)
    } else if floored >= u64::MAX as f64 {
        Err(CoercionError::OutOfRange(shown()))
    } else {
        Ok(floored as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_and_numeric_strings() {
        assert_eq!(coerce_quantity(&json!(7)), Ok(7));
        assert_eq!(coerce_quantity(&json!("12")), Ok(12));
        assert_eq!(coerce_quantity(&json!(" 3 ")), Ok(3));
    }

    #[test]
    fn fractions_are_floored() {
        assert_eq!(coerce_quantity(&json!(3.9)), Ok(3));
        assert_eq!(coerce_quantity(&json!("2.5")), Ok(2));
        assert_eq!(coerce_quantity(&json!(0.4)), Ok(0));
    }

    #[test]
    fn negatives_clamp_to_zero() {
        assert_eq!(coerce_quantity(&json!(-4)), Ok(0));
        assert_eq!(coerce_quantity(&json!(-0.5)), Ok(0));
        assert_eq!(coerce_quantity(&json!("-10")), Ok(0));
    }

    #[test]
    fn non_numbers_are_rejected() {
        for raw in [json!(null), json!(true), json!("abc"), json!("NaN"), json!("inf"), json!([1]), json!({"q": 1})] {
            assert!(
                matches!(coerce_quantity(&raw), Err(CoercionError::NotANumber(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn huge_values_are_out_of_range() {
        assert!(matches!(
            coerce_quantity(&json!("99999999999999999999999")),
            Err(CoercionError::OutOfRange(_))
        ));
        assert!(matches!(coerce_quantity(&json!(1e30)), Err(CoercionError::OutOfRange(_))));
    }

    #[test]
    fn converts_into_validation_error() {
        let err: DomainError = CoercionError::NotANumber("x".into()).into();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
