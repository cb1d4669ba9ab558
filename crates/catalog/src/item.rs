use serde::{Deserialize, Serialize};

use stocksense_core::{DomainError, DomainResult, ItemId};

/// A catalog item snapshot.
///
/// `units_sold` is the cumulative lifetime counter maintained by the store;
/// it is monotonic and distinct from the per-window aggregates the sales
/// crate computes from raw sale events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Current on-hand quantity.
    pub on_hand: u64,
    /// Supplier lead time in days.
    pub lead_time_days: f64,
    /// Unit price, if known.
    pub price: Option<f64>,
    /// Cumulative units sold over the item's lifetime.
    pub units_sold: u64,
}

impl Item {
    /// Create a validated item snapshot.
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        on_hand: u64,
        lead_time_days: f64,
        price: Option<f64>,
        units_sold: u64,
    ) -> DomainResult<Self> {
        if !(lead_time_days.is_finite() && lead_time_days >= 0.0) {
            return Err(DomainError::validation(
                "lead_time_days must be a finite non-negative number",
            ));
        }
        if let Some(p) = price {
            if !(p.is_finite() && p >= 0.0) {
                return Err(DomainError::validation(
                    "price must be a finite non-negative number",
                ));
            }
        }
        Ok(Self {
            id,
            name: name.into(),
            on_hand,
            lead_time_days,
            price,
            units_sold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    #[test]
    fn builds_valid_item() {
        let item = Item::new(test_id("sku-1"), "Widget", 12, 3.5, Some(9.99), 40).unwrap();
        assert_eq!(item.on_hand, 12);
        assert_eq!(item.units_sold, 40);
    }

    #[test]
    fn rejects_negative_lead_time() {
        let err = Item::new(test_id("sku-1"), "Widget", 12, -1.0, None, 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_non_finite_price() {
        let err = Item::new(test_id("sku-1"), "Widget", 12, 1.0, Some(f64::NAN), 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
