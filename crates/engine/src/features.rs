//! Feature construction: join catalog stock with aggregated sales.

use stocksense_catalog::Item;
use stocksense_core::ItemId;
use stocksense_sales::SalesAggregates;

/// A point in the two-dimensional movement feature space.
///
/// Coordinates are the raw on-hand quantity and the raw aggregated sales
/// quantity, deliberately unscaled. The on-hand axis can dominate the
/// clustering distance; that is a documented property of the historical
/// model and must be preserved for reproducibility against stored labels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FeatureVector {
    pub on_hand: f64,
    pub sold: f64,
}

impl FeatureVector {
    /// Squared euclidean distance to another point.
    pub fn distance_sq(&self, other: &FeatureVector) -> f64 {
        let dh = self.on_hand - other.on_hand;
        let ds = self.sold - other.sold;
        dh * dh + ds * ds
    }
}

/// Per-item clustering input.
///
/// `on_hand` keeps the integer snapshot value alongside the float vector
/// so the override step can reconstruct pre-sale inventory exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFeatures {
    pub item_id: ItemId,
    pub on_hand: u64,
    pub vector: FeatureVector,
}

/// Build one feature vector per item with recorded sales history.
///
/// Items absent from the all-time aggregates are excluded: they carry no
/// discriminative signal and the clusters are refit every run. The output
/// is sorted by item id so downstream clustering sees a stable point
/// order regardless of catalog iteration order.
pub fn build_features(items: &[Item], aggregates: &SalesAggregates) -> Vec<ItemFeatures> {
    let mut features: Vec<ItemFeatures> = items
        .iter()
        .filter(|item| aggregates.all_time.contains_key(&item.id))
        .map(|item| ItemFeatures {
            item_id: item.id.clone(),
            on_hand: item.on_hand,
            vector: FeatureVector {
                on_hand: item.on_hand as f64,
                sold: aggregates.all_time_for(&item.id) as f64,
            },
        })
        .collect();
    features.sort_by(|a, b| a.item_id.cmp(&b.item_id));
    features
}
