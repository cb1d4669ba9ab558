//! Per-run pipeline state machine.
//!
//! `Idle -> Aggregating -> Clustering -> Evaluating -> Predicting ->
//! Reconciling -> Done`, with a terminal `Failed` reachable from any
//! stage. No-data conditions end the run early as a clean success no-op;
//! everything else that aborts a stage fails the run. The outcome sink is
//! notified exactly once per run, success or failure.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use stocksense_core::ItemId;
use stocksense_sales::aggregate;

use crate::classifier::MovementClassifier;
use crate::cluster::Clusterer;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::features::build_features;
use crate::model::{RegressionModel, ThresholdFeatures};
use crate::override_rule::{OverrideContext, evaluate};
use crate::predictor::{ThresholdPredictor, average_velocity};
use crate::store::{
    CatalogStore, ClassificationWrite, ReconciliationWriter, RunOutcome, RunOutcomeSink,
    RunStatus, SalesStore, StoredClassification, ThresholdWrite,
};

/// Pipeline stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Aggregating,
    Clustering,
    Evaluating,
    Predicting,
    Reconciling,
    Done,
    Failed,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Idle => "idle",
            RunStage::Aggregating => "aggregating",
            RunStage::Clustering => "clustering",
            RunStage::Evaluating => "evaluating",
            RunStage::Predicting => "predicting",
            RunStage::Reconciling => "reconciling",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        }
    }
}

impl core::fmt::Display for RunStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub stage: RunStage,
    pub status: RunStatus,
    pub message: String,
    /// Items that went through clustering + override evaluation.
    pub items_evaluated: usize,
    /// Classification writes actually committed (change-gated).
    pub classification_writes: usize,
    /// Threshold writes actually committed (unconditional).
    pub threshold_writes: usize,
    /// Items whose prediction failed, with the per-item reason.
    pub skipped_predictions: Vec<(ItemId, String)>,
}

/// One full analysis over the current catalog and sales history.
///
/// Exists so the infra runner can own a pipeline without naming its six
/// type parameters.
pub trait InventoryAnalysis: Send + Sync + 'static {
    fn run(&self, now: DateTime<Utc>) -> RunReport;
}

/// The wired pipeline: store handles, clustering primitive, regression
/// model, and configuration.
///
/// Single-threaded and synchronous; one call to [`InventoryAnalysis::run`]
/// is one unit of work. Concurrent invocations must be serialized by the
/// caller (the infra runner's dedicated thread does this).
pub struct AnalysisPipeline<Cat, Sal, W, O, C, M>
where
    Cat: CatalogStore,
    Sal: SalesStore,
    W: ReconciliationWriter,
    O: RunOutcomeSink,
    C: Clusterer,
    M: RegressionModel,
{
    catalog: Cat,
    sales: Sal,
    writer: W,
    outcomes: O,
    classifier: MovementClassifier<C>,
    predictor: ThresholdPredictor<M>,
    config: EngineConfig,
}

/// How a run finished executing its stages.
enum Completion {
    /// All stages ran.
    Full,
    /// Expected no-data condition; clean early exit.
    NoData(String),
}

#[derive(Default)]
struct Progress {
    items_evaluated: usize,
    classification_writes: usize,
    threshold_writes: usize,
    skipped: Vec<(ItemId, String)>,
}

impl<Cat, Sal, W, O, C, M> AnalysisPipeline<Cat, Sal, W, O, C, M>
where
    Cat: CatalogStore,
    Sal: SalesStore,
    W: ReconciliationWriter,
    O: RunOutcomeSink,
    C: Clusterer,
    M: RegressionModel,
{
    pub fn new(
        catalog: Cat,
        sales: Sal,
        writer: W,
        outcomes: O,
        clusterer: C,
        model: M,
        config: EngineConfig,
    ) -> Self {
        let classifier = MovementClassifier::new(clusterer, config.clusters, config.seed);
        let predictor = ThresholdPredictor::new(model);
        Self {
            catalog,
            sales,
            writer,
            outcomes,
            classifier,
            predictor,
            config,
        }
    }

    fn execute(
        &self,
        run_id: Uuid,
        now: DateTime<Utc>,
        progress: &mut Progress,
    ) -> Result<Completion, (RunStage, EngineError)> {
        // Aggregating.
        info!(run = %run_id, stage = %RunStage::Aggregating, "pipeline stage entered");
        let events = self
            .sales
            .list_sale_events()
            .map_err(|e| (RunStage::Aggregating, e.into()))?;
        let aggregates = match aggregate(&events, now, self.config.lookback_days) {
            Ok(a) => a,
            Err(_) => return Ok(Completion::NoData("no usable sale events".into())),
        };

        // Clustering.
        info!(run = %run_id, stage = %RunStage::Clustering, "pipeline stage entered");
        let items = self
            .catalog
            .list_items()
            .map_err(|e| (RunStage::Clustering, e.into()))?;
        if items.is_empty() {
            return Ok(Completion::NoData("catalog is empty".into()));
        }
        let features = build_features(&items, &aggregates);
        if features.is_empty() {
            return Ok(Completion::NoData(
                "no catalog items with sales history".into(),
            ));
        }
        let assignments = self
            .classifier
            .classify(&features)
            .map_err(|e| (RunStage::Clustering, e))?;
        info!(
            run = %run_id,
            low_movement_cluster = assignments.low_movement_cluster,
            items = features.len(),
            "movement clusters fitted"
        );

        // Evaluating.
        info!(run = %run_id, stage = %RunStage::Evaluating, "pipeline stage entered");
        let mut classification_writes: Vec<ClassificationWrite> = Vec::new();
        for feature in &features {
            let label = assignments.labels[&feature.item_id];

            // Re-read the authoritative on-hand quantity; the catalog may
            // have moved under us since the clustering snapshot.
            let on_hand = self
                .catalog
                .get_item(&feature.item_id)
                .map_err(|e| (RunStage::Evaluating, e.into()))?
                .map(|item| item.on_hand)
                .unwrap_or(feature.on_hand);

            let decision = evaluate(
                &OverrideContext {
                    cluster: label,
                    low_movement_cluster: assignments.low_movement_cluster,
                    on_hand,
                    recent_sold: aggregates.recent_for(&feature.item_id),
                },
                self.config.override_threshold,
            );
            progress.items_evaluated += 1;

            let stored = self
                .catalog
                .stored_classification(&feature.item_id)
                .map_err(|e| (RunStage::Evaluating, e.into()))?;
            let next = StoredClassification {
                deadstock: decision.deadstock,
                cluster: decision.cluster,
            };
            if stored != Some(next) {
                classification_writes.push(ClassificationWrite {
                    item_id: feature.item_id.clone(),
                    deadstock: decision.deadstock,
                    cluster: decision.cluster,
                    evaluated_at: now,
                });
            }
        }

        // Predicting. Thresholds cover the whole catalog, not just the
        // clustered subset.
        info!(run = %run_id, stage = %RunStage::Predicting, "pipeline stage entered");
        let mut threshold_writes: Vec<ThresholdWrite> = Vec::new();
        let mut sorted_items = items.clone();
        sorted_items.sort_by(|a, b| a.id.cmp(&b.id));
        for item in &sorted_items {
            let threshold_features = ThresholdFeatures {
                avg_monthly_sales: average_velocity(
                    item.units_sold,
                    aggregates.months_with_sales_for(&item.id),
                ),
                lead_time_days: item.lead_time_days,
            };
            match self.predictor.predict(&threshold_features) {
                Ok(threshold) => threshold_writes.push(ThresholdWrite {
                    item_id: item.id.clone(),
                    threshold,
                    updated_at: now,
                }),
                Err(e) => {
                    warn!(run = %run_id, item = %item.id, error = %e, "threshold prediction skipped");
                    progress.skipped.push((item.id.clone(), e.to_string()));
                }
            }
        }

        // Reconciling: bounded chunks, decided entirely in memory above.
        info!(
            run = %run_id,
            stage = %RunStage::Reconciling,
            classifications = classification_writes.len(),
            thresholds = threshold_writes.len(),
            "pipeline stage entered"
        );
        let chunk_size = self.config.write_chunk_size.max(1);
        for chunk in classification_writes.chunks(chunk_size) {
            self.writer
                .write_classifications(chunk)
                .map_err(|e| (RunStage::Reconciling, e.into()))?;
            progress.classification_writes += chunk.len();
        }
        for chunk in threshold_writes.chunks(chunk_size) {
            self.writer
                .write_thresholds(chunk)
                .map_err(|e| (RunStage::Reconciling, e.into()))?;
            progress.threshold_writes += chunk.len();
        }

        Ok(Completion::Full)
    }
}

impl<Cat, Sal, W, O, C, M> InventoryAnalysis for AnalysisPipeline<Cat, Sal, W, O, C, M>
where
    Cat: CatalogStore + 'static,
    Sal: SalesStore + 'static,
    W: ReconciliationWriter + 'static,
    O: RunOutcomeSink + 'static,
    C: Clusterer + 'static,
    M: RegressionModel + 'static,
{
    fn run(&self, now: DateTime<Utc>) -> RunReport {
        let run_id = Uuid::now_v7();
        let mut progress = Progress::default();

        let (stage, status, message) = match self.execute(run_id, now, &mut progress) {
            Ok(Completion::Full) => {
                let mut message = format!(
                    "evaluated {} item(s): {} classification write(s), {} threshold write(s)",
                    progress.items_evaluated,
                    progress.classification_writes,
                    progress.threshold_writes,
                );
                if !progress.skipped.is_empty() {
                    let detail: Vec<String> = progress
                        .skipped
                        .iter()
                        .map(|(id, reason)| format!("{id} ({reason})"))
                        .collect();
                    message.push_str(&format!(
                        "; {} prediction(s) skipped: {}",
                        progress.skipped.len(),
                        detail.join(", ")
                    ));
                }
                (RunStage::Done, RunStatus::Success, message)
            }
            Ok(Completion::NoData(reason)) => {
                info!(run = %run_id, reason = %reason, "run ended early with nothing to do");
                (
                    RunStage::Done,
                    RunStatus::Success,
                    format!("no-op run: {reason}"),
                )
            }
            Err((stage, err)) => {
                error!(run = %run_id, stage = %stage, error = %err, "run failed");
                let message = format!(
                    "run failed during {stage}: {err} ({} classification and {} threshold write(s) committed before failure)",
                    progress.classification_writes, progress.threshold_writes,
                );
                (RunStage::Failed, RunStatus::Error, message)
            }
        };

        let outcome = RunOutcome {
            run_id,
            status,
            message: message.clone(),
            recorded_at: now,
        };
        if let Err(e) = self.outcomes.record_run_outcome(&outcome) {
            // Nothing left to notify; the report still carries the state.
            error!(run = %run_id, error = %e, "failed to record run outcome");
        }

        info!(run = %run_id, stage = %stage, "run finished");
        RunReport {
            run_id,
            stage,
            status,
            message,
            items_evaluated: progress.items_evaluated,
            classification_writes: progress.classification_writes,
            threshold_writes: progress.threshold_writes,
            skipped_predictions: progress.skipped,
        }
    }
}
