//! In-memory store backend.

use std::collections::BTreeMap;
use std::sync::RwLock;

use stocksense_catalog::Item;
use stocksense_core::ItemId;
use stocksense_engine::store::{
    CatalogStore, ClassificationWrite, ReconciliationWriter, RunOutcome, RunOutcomeSink,
    SalesStore, StoreError, StoredClassification, ThresholdWrite,
};
use stocksense_sales::SaleEvent;

/// In-memory implementation of all four store ports.
///
/// Intended for tests/dev. Not optimized for performance. Classification
/// writes update the stored classification state, so the engine's
/// conditional-write behavior is observable across runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: RwLock<BTreeMap<ItemId, Item>>,
    sales: RwLock<Vec<SaleEvent>>,
    classifications: RwLock<BTreeMap<ItemId, StoredClassification>>,
    thresholds: RwLock<BTreeMap<ItemId, ThresholdWrite>>,
    outcomes: RwLock<Vec<RunOutcome>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a catalog item.
    pub fn upsert_item(&self, item: Item) {
        self.items
            .write()
            .expect("items lock poisoned")
            .insert(item.id.clone(), item);
    }

    /// Append a sale event to the history.
    pub fn record_sale(&self, event: SaleEvent) {
        self.sales.write().expect("sales lock poisoned").push(event);
    }

    /// Snapshot of all persisted classifications.
    pub fn classifications(&self) -> BTreeMap<ItemId, StoredClassification> {
        self.classifications
            .read()
            .expect("classifications lock poisoned")
            .clone()
    }

    /// Snapshot of all persisted thresholds.
    pub fn thresholds(&self) -> BTreeMap<ItemId, ThresholdWrite> {
        self.thresholds
            .read()
            .expect("thresholds lock poisoned")
            .clone()
    }

    /// All recorded run outcomes, in arrival order.
    pub fn outcomes(&self) -> Vec<RunOutcome> {
        self.outcomes.read().expect("outcomes lock poisoned").clone()
    }
}

impl CatalogStore for InMemoryStore {
    fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Storage("items lock poisoned".into()))?;
        Ok(items.values().cloned().collect())
    }

    fn get_item(&self, id: &ItemId) -> Result<Option<Item>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Storage("items lock poisoned".into()))?;
        Ok(items.get(id).cloned())
    }

    fn stored_classification(
        &self,
        id: &ItemId,
    ) -> Result<Option<StoredClassification>, StoreError> {
        let classifications = self
            .classifications
            .read()
            .map_err(|_| StoreError::Storage("classifications lock poisoned".into()))?;
        Ok(classifications.get(id).copied())
    }
}

impl SalesStore for InMemoryStore {
    fn list_sale_events(&self) -> Result<Vec<SaleEvent>, StoreError> {
        let sales = self
            .sales
            .read()
            .map_err(|_| StoreError::Storage("sales lock poisoned".into()))?;
        Ok(sales.clone())
    }
}

impl ReconciliationWriter for InMemoryStore {
    fn write_classifications(&self, batch: &[ClassificationWrite]) -> Result<(), StoreError> {
        let mut classifications = self
            .classifications
            .write()
            .map_err(|_| StoreError::Storage("classifications lock poisoned".into()))?;
        for write in batch {
            classifications.insert(
                write.item_id.clone(),
                StoredClassification {
                    deadstock: write.deadstock,
                    cluster: write.cluster,
                },
            );
        }
        Ok(())
    }

    fn write_thresholds(&self, batch: &[ThresholdWrite]) -> Result<(), StoreError> {
        let mut thresholds = self
            .thresholds
            .write()
            .map_err(|_| StoreError::Storage("thresholds lock poisoned".into()))?;
        for write in batch {
            thresholds.insert(write.item_id.clone(), write.clone());
        }
        Ok(())
    }
}

impl RunOutcomeSink for InMemoryStore {
    fn record_run_outcome(&self, outcome: &RunOutcome) -> Result<(), StoreError> {
        let mut outcomes = self
            .outcomes
            .write()
            .map_err(|_| StoreError::Storage("outcomes lock poisoned".into()))?;
        outcomes.push(outcome.clone());
        Ok(())
    }
}
