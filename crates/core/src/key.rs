//! Product keys: the normalized identity of a stock record.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Normalized product identifier derived from a display name.
///
/// Normalization trims surrounding whitespace and case-folds, so `" Café "`,
/// `"café"` and `"CAFÉ"` all map to the same key. Normalizing an already
/// normalized key returns it unchanged.
///
/// Deserializing always normalizes, so keys read back from storage or the wire
/// cannot bypass the rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ProductKey(String);

impl ProductKey {
    /// Normalize a display name. Blank input yields an empty key, which every
    /// caller treats as invalid.
    pub fn normalize(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Normalize and reject blank names.
    pub fn parse(name: &str) -> DomainResult<Self> {
        let key = Self::normalize(name);
        if key.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProductKey {
    fn from(value: String) -> Self {
        Self::normalize(&value)
    }
}

impl From<&str> for ProductKey {
    fn from(value: &str) -> Self {
        Self::normalize(value)
    }
}

impl From<ProductKey> for String {
    fn from(value: ProductKey) -> Self {
        value.0
    }
}

impl AsRef<str> for ProductKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn equivalent_names_share_a_key() {
        let a = ProductKey::normalize(" Café ");
        let b = ProductKey::normalize("café");
        let c = ProductKey::normalize("CAFÉ");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "café");
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(ProductKey::normalize("   ").is_empty());
        assert!(ProductKey::normalize("").is_empty());
        assert!(matches!(
            ProductKey::parse(" \t "),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn deserializing_normalizes() {
        let key: ProductKey = serde_json::from_str("\"  Bolo de Milho \"").unwrap();
        assert_eq!(key.as_str(), "bolo de milho");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"bolo de milho\"");
    }

    proptest! {
        /// Property: normalizing twice is the same as normalizing once.
        #[test]
        fn normalize_is_idempotent(name in "\\PC{0,40}") {
            let once = ProductKey::normalize(&name);
            let twice = ProductKey::normalize(once.as_str());
            prop_assert_eq!(once, twice);
        }

        /// Property: surrounding whitespace and ASCII case never change the key.
        #[test]
        fn padding_and_case_are_ignored(
            name in "[A-Za-z][A-Za-z0-9 ]{0,30}",
            left in " {0,4}",
            right in " {0,4}",
        ) {
            let padded = format!("{left}{}{right}", name.to_uppercase());
            prop_assert_eq!(ProductKey::normalize(&padded), ProductKey::normalize(&name));
        }
    }
}
