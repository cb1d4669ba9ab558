use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use stocksense_core::ItemId;

/// One line of a recorded sale.
///
/// Historical sale documents are not fully clean: the quantity field can be
/// missing, a string, or junk. Anything that does not decode as a
/// non-negative number counts as zero rather than failing the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub item_id: ItemId,
    #[serde(default, deserialize_with = "quantity_or_zero")]
    pub quantity: u64,
}

/// A recorded sale: one checkout with one or more line items.
///
/// `occurred_at` is optional on the wire. Timestamps with an offset are
/// normalized to UTC by the `DateTime<Utc>` decoding; events without a
/// usable timestamp are kept here and dropped at aggregation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleEvent {
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    pub lines: Vec<SaleLine>,
}

impl SaleEvent {
    pub fn new(occurred_at: DateTime<Utc>, lines: Vec<SaleLine>) -> Self {
        Self {
            occurred_at: Some(occurred_at),
            lines,
        }
    }
}

fn quantity_or_zero<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Uint(u64),
        Float(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(de)? {
        Some(Raw::Uint(v)) => v,
        Some(Raw::Float(v)) if v.is_finite() && v >= 0.0 => v as u64,
        Some(Raw::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
