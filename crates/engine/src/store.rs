//! Store ports: the narrow interfaces the engine needs from the outside
//! world.
//!
//! The engine computes its full decision set in memory first, then submits
//! bounded batches through [`ReconciliationWriter`]. No implementation
//! details leak in here; `stocksense-infra` provides an in-memory backend
//! and production backends plug in behind the same traits.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use stocksense_catalog::Item;
use stocksense_core::ItemId;
use stocksense_sales::SaleEvent;

/// Store operation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("item not found: {0}")]
    NotFound(ItemId),

    #[error("storage error: {0}")]
    Storage(String),
}

/// The classification state currently persisted for an item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredClassification {
    pub deadstock: bool,
    pub cluster: usize,
}

/// One pending classification write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationWrite {
    pub item_id: ItemId,
    pub deadstock: bool,
    pub cluster: usize,
    pub evaluated_at: DateTime<Utc>,
}

/// One pending threshold write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdWrite {
    pub item_id: ItemId,
    pub threshold: u32,
    pub updated_at: DateTime<Utc>,
}

/// Terminal status of one pipeline run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Error,
}

/// Run traceability record, written exactly once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

/// Read access to the item catalog.
pub trait CatalogStore: Send + Sync {
    fn list_items(&self) -> Result<Vec<Item>, StoreError>;

    /// Fetch the authoritative current state of one item.
    fn get_item(&self, id: &ItemId) -> Result<Option<Item>, StoreError>;

    /// The classification currently persisted for an item, if any.
    ///
    /// Feeds the conditional-write change check; the engine never writes
    /// a classification identical to the stored one.
    fn stored_classification(&self, id: &ItemId)
    -> Result<Option<StoredClassification>, StoreError>;
}

/// Read access to recorded sale events.
///
/// No filtering is pushed down; the engine windows by timestamp itself.
pub trait SalesStore: Send + Sync {
    fn list_sale_events(&self) -> Result<Vec<SaleEvent>, StoreError>;
}

/// Batched persistence of computed results.
///
/// Each call is one chunk; implementations should apply a chunk as
/// atomically as their backend allows. A chunk failure fails the run.
pub trait ReconciliationWriter: Send + Sync {
    fn write_classifications(&self, batch: &[ClassificationWrite]) -> Result<(), StoreError>;

    fn write_thresholds(&self, batch: &[ThresholdWrite]) -> Result<(), StoreError>;
}

/// Sink for run traceability records.
pub trait RunOutcomeSink: Send + Sync {
    fn record_run_outcome(&self, outcome: &RunOutcome) -> Result<(), StoreError>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list_items()
    }

    fn get_item(&self, id: &ItemId) -> Result<Option<Item>, StoreError> {
        (**self).get_item(id)
    }

    fn stored_classification(
        &self,
        id: &ItemId,
    ) -> Result<Option<StoredClassification>, StoreError> {
        (**self).stored_classification(id)
    }
}

impl<S> SalesStore for Arc<S>
where
    S: SalesStore + ?Sized,
{
    fn list_sale_events(&self) -> Result<Vec<SaleEvent>, StoreError> {
        (**self).list_sale_events()
    }
}

impl<S> ReconciliationWriter for Arc<S>
where
    S: ReconciliationWriter + ?Sized,
{
    fn write_classifications(&self, batch: &[ClassificationWrite]) -> Result<(), StoreError> {
        (**self).write_classifications(batch)
    }

    fn write_thresholds(&self, batch: &[ThresholdWrite]) -> Result<(), StoreError> {
        (**self).write_thresholds(batch)
    }
}

impl<S> RunOutcomeSink for Arc<S>
where
    S: RunOutcomeSink + ?Sized,
{
    fn record_run_outcome(&self, outcome: &RunOutcome) -> Result<(), StoreError> {
        (**self).record_run_outcome(outcome)
    }
}
