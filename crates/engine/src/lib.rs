//! `stocksense-engine`
//!
//! **Responsibility:** the adaptive classification & threshold engine.
//!
//! This crate holds the algorithmic core: feature construction, movement
//! clustering, the sell-through override rule, threshold regression, and
//! the per-run pipeline state machine. It is storage-agnostic: all IO goes
//! through the port traits in [`store`], implemented by `stocksense-infra`
//! (or any other backend).

pub mod classifier;
pub mod cluster;
pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod override_rule;
pub mod pipeline;
pub mod predictor;
pub mod store;

pub use classifier::{MovementAssignments, MovementClassifier};
pub use cluster::{Clusterer, SeededKMeans};
pub use config::EngineConfig;
pub use error::EngineError;
pub use features::{FeatureVector, ItemFeatures, build_features};
pub use model::{
    LinearThresholdModel, ModelError, RegressionModel, ThresholdFeatures, TrainingRecord,
};
pub use override_rule::{Decision, OverrideContext, evaluate, sell_through_ratio};
pub use pipeline::{AnalysisPipeline, InventoryAnalysis, RunReport, RunStage};
pub use predictor::{ThresholdPredictor, average_velocity};
pub use store::{
    CatalogStore, ClassificationWrite, ReconciliationWriter, RunOutcome, RunOutcomeSink,
    RunStatus, SalesStore, StoreError, StoredClassification, ThresholdWrite,
};
