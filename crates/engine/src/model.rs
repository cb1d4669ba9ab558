//! Threshold regression model boundary.
//!
//! The pipeline only needs `predict(features) -> real`; the trait keeps
//! the floor/rounding policy and the rest of the engine testable without
//! any model fitting. A concrete linear model is provided, fit offline by
//! ordinary least squares and shippable as a JSON artifact.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model-level error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("invalid features: {0}")]
    InvalidFeatures(String),

    #[error("degenerate fit: {0}")]
    DegenerateFit(String),

    #[error("non-finite estimate: {0}")]
    NonFiniteEstimate(f64),

    #[error("model artifact error: {0}")]
    Artifact(String),
}

/// Regression input: average per-month sales velocity and lead time.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFeatures {
    pub avg_monthly_sales: f64,
    pub lead_time_days: f64,
}

impl ThresholdFeatures {
    fn validate(&self) -> Result<(), ModelError> {
        if !(self.avg_monthly_sales.is_finite() && self.avg_monthly_sales >= 0.0) {
            return Err(ModelError::InvalidFeatures(format!(
                "avg_monthly_sales must be finite and non-negative, got {}",
                self.avg_monthly_sales
            )));
        }
        if !(self.lead_time_days.is_finite() && self.lead_time_days >= 0.0) {
            return Err(ModelError::InvalidFeatures(format!(
                "lead_time_days must be finite and non-negative, got {}",
                self.lead_time_days
            )));
        }
        Ok(())
    }
}

/// Injected regression provider.
pub trait RegressionModel: Send + Sync {
    /// Produce a continuous threshold estimate.
    ///
    /// Must not mutate state; a failure applies to this feature vector
    /// only, never to the whole run.
    fn predict(&self, features: &ThresholdFeatures) -> Result<f64, ModelError>;
}

impl<M> RegressionModel for std::sync::Arc<M>
where
    M: RegressionModel + ?Sized,
{
    fn predict(&self, features: &ThresholdFeatures) -> Result<f64, ModelError> {
        (**self).predict(features)
    }
}

/// One labeled historical observation for offline fitting.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub avg_monthly_sales: f64,
    pub lead_time_days: f64,
    pub threshold: f64,
}

/// Two-feature linear regressor: `intercept + a*velocity + b*leadTime`.
///
/// Stands in for the original gradient-boosted artifact; the engine only
/// sees the [`RegressionModel`] trait, so a heavier model can be swapped
/// in without touching the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearThresholdModel {
    pub intercept: f64,
    pub velocity_coef: f64,
    pub lead_time_coef: f64,
}

impl LinearThresholdModel {
    /// Fit by ordinary least squares over `(1, velocity, leadTime)`.
    ///
    /// Solves the 3x3 normal equations directly. A singular system
    /// (collinear or too few records) is a [`ModelError::DegenerateFit`].
    pub fn fit(records: &[TrainingRecord]) -> Result<Self, ModelError> {
        if records.len() < 3 {
            return Err(ModelError::DegenerateFit(format!(
                "need at least 3 training records, got {}",
                records.len()
            )));
        }
        for (i, r) in records.iter().enumerate() {
            if !(r.avg_monthly_sales.is_finite()
                && r.lead_time_days.is_finite()
                && r.threshold.is_finite())
            {
                return Err(ModelError::DegenerateFit(format!(
                    "training record {i} contains a non-finite value"
                )));
            }
        }

        // Accumulate X^T X and X^T y for X rows of (1, v, l).
        let mut xtx = [[0.0f64; 3]; 3];
        let mut xty = [0.0f64; 3];
        for r in records {
            let row = [1.0, r.avg_monthly_sales, r.lead_time_days];
            for i in 0..3 {
                for j in 0..3 {
                    xtx[i][j] += row[i] * row[j];
                }
                xty[i] += row[i] * r.threshold;
            }
        }

        let beta = solve_3x3(xtx, xty)
            .ok_or_else(|| ModelError::DegenerateFit("normal equations are singular".into()))?;

        Ok(Self {
            intercept: beta[0],
            velocity_coef: beta[1],
            lead_time_coef: beta[2],
        })
    }

    /// Load a pre-trained artifact from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::Artifact(e.to_string()))
    }

    /// Serialize the fitted model for shipping between processes.
    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string(self).map_err(|e| ModelError::Artifact(e.to_string()))
    }
}

impl RegressionModel for LinearThresholdModel {
    fn predict(&self, features: &ThresholdFeatures) -> Result<f64, ModelError> {
        features.validate()?;
        let estimate = self.intercept
            + self.velocity_coef * features.avg_monthly_sales
            + self.lead_time_coef * features.lead_time_days;
        if !estimate.is_finite() {
            return Err(ModelError::NonFiniteEstimate(estimate));
        }
        Ok(estimate)
    }
}

/// Gaussian elimination with partial pivoting; `None` if singular.
fn solve_3x3(a: [[f64; 3]; 3], b: [f64; 3]) -> Option<[f64; 3]> {
    let mut m = [[0.0f64; 4]; 3];
    for i in 0..3 {
        m[i][..3].copy_from_slice(&a[i]);
        m[i][3] = b[i];
    }

    for col in 0..3 {
        let pivot_row = (col..3).max_by(|&r1, &r2| {
            m[r1][col]
                .abs()
                .partial_cmp(&m[r2][col].abs())
                .unwrap_or(core::cmp::Ordering::Equal)
        })?;
        if m[pivot_row][col].abs() < 1e-9 {
            return None;
        }
        m.swap(col, pivot_row);

        for row in 0..3 {
            if row == col {
                continue;
            }
            let factor = m[row][col] / m[col][col];
            for k in col..4 {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    Some([m[0][3] / m[0][0], m[1][3] / m[1][1], m[2][3] / m[2][2]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(v: f64, l: f64, t: f64) -> TrainingRecord {
        TrainingRecord {
            avg_monthly_sales: v,
            lead_time_days: l,
            threshold: t,
        }
    }

    /// Exact generating function: t = 2 + 3v + 0.5l.
    fn synthetic_records() -> Vec<TrainingRecord> {
        [(1.0, 2.0), (4.0, 1.0), (2.0, 6.0), (8.0, 3.0), (5.0, 5.0)]
            .iter()
            .map(|&(v, l)| record(v, l, 2.0 + 3.0 * v + 0.5 * l))
            .collect()
    }

    #[test]
    fn fit_recovers_an_exact_linear_relationship() {
        let model = LinearThresholdModel::fit(&synthetic_records()).unwrap();
        assert!((model.intercept - 2.0).abs() < 1e-6);
        assert!((model.velocity_coef - 3.0).abs() < 1e-6);
        assert!((model.lead_time_coef - 0.5).abs() < 1e-6);

        let estimate = model
            .predict(&ThresholdFeatures {
                avg_monthly_sales: 6.0,
                lead_time_days: 4.0,
            })
            .unwrap();
        assert!((estimate - 22.0).abs() < 1e-6);
    }

    #[test]
    fn too_few_records_is_a_degenerate_fit() {
        let err = LinearThresholdModel::fit(&[record(1.0, 1.0, 5.0)]).unwrap_err();
        assert!(matches!(err, ModelError::DegenerateFit(_)));
    }

    #[test]
    fn collinear_records_are_a_degenerate_fit() {
        // All observations at the same point: no slope information.
        let records = vec![record(2.0, 3.0, 7.0); 5];
        let err = LinearThresholdModel::fit(&records).unwrap_err();
        assert!(matches!(err, ModelError::DegenerateFit(_)));
    }

    #[test]
    fn predict_rejects_malformed_features() {
        let model = LinearThresholdModel::fit(&synthetic_records()).unwrap();
        let err = model
            .predict(&ThresholdFeatures {
                avg_monthly_sales: f64::NAN,
                lead_time_days: 1.0,
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidFeatures(_)));

        let err = model
            .predict(&ThresholdFeatures {
                avg_monthly_sales: 1.0,
                lead_time_days: -3.0,
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidFeatures(_)));
    }

    #[test]
    fn artifact_loads_back_into_an_equivalent_model() {
        let model = LinearThresholdModel::fit(&synthetic_records()).unwrap();
        let loaded = LinearThresholdModel::from_json(&model.to_json().unwrap()).unwrap();
        assert_eq!(model, loaded);
    }
}
