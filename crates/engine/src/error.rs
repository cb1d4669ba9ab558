//! Engine error taxonomy.

use thiserror::Error;

use stocksense_core::ItemId;

use crate::model::ModelError;
use crate::store::StoreError;

/// Pipeline-level error.
///
/// `NoData` is an expected steady state (new deployment, quiet store) and
/// ends the run early with a success outcome. `InsufficientSamples` and
/// `Persistence` fail the run. `Prediction` is per-item and recovered by
/// skipping the item; it never aborts a run on its own.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no data: {0}")]
    NoData(String),

    #[error("insufficient samples: {points} feature point(s) for {clusters} clusters")]
    InsufficientSamples { points: usize, clusters: usize },

    #[error("prediction failed for item {item_id}: {source}")]
    Prediction {
        item_id: ItemId,
        #[source]
        source: ModelError,
    },

    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}
