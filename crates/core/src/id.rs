//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a catalog item.
///
/// Item ids come from the external store (document ids), so this is an
/// opaque non-empty string rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an item id from a raw string.
    ///
    /// Rejects empty or whitespace-only ids.
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::invalid_id("ItemId must not be empty"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_empty_ids() {
        let id = ItemId::new("sku-0001").unwrap();
        assert_eq!(id.as_str(), "sku-0001");
        assert_eq!(id.to_string(), "sku-0001");
    }

    #[test]
    fn rejects_empty_and_blank_ids() {
        assert!(ItemId::new("").is_err());
        assert!(ItemId::new("   ").is_err());
    }

    #[test]
    fn parses_from_str() {
        let id: ItemId = "sku-42".parse().unwrap();
        assert_eq!(id.as_str(), "sku-42");
    }
}
