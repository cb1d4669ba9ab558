//! Replenishment threshold prediction.

use crate::model::{ModelError, RegressionModel, ThresholdFeatures};

/// Average per-month sales velocity.
///
/// The denominator counts only months with recorded sales: silent months
/// carry no observation and must not dilute the average. Clamped to 1 so
/// an item whose sales predate the event log still gets a velocity.
pub fn average_velocity(total_sold: u64, months_with_sales: u32) -> f64 {
    total_sold as f64 / months_with_sales.max(1) as f64
}

/// Applies the injected regression model and the integer threshold policy.
#[derive(Debug, Clone)]
pub struct ThresholdPredictor<M: RegressionModel> {
    model: M,
}

impl<M: RegressionModel> ThresholdPredictor<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Predict the reorder threshold for one item.
    ///
    /// The continuous estimate is rounded to the nearest integer and
    /// floored at 1: an item with any residual demand still gets at least
    /// one unit of safety-stock signal. Errors apply to this item only.
    pub fn predict(&self, features: &ThresholdFeatures) -> Result<u32, ModelError> {
        let estimate = self.model.predict(features)?;
        // The trait is an extension point; a misbehaving model must not
        // be able to sneak a NaN past the floor policy.
        if !estimate.is_finite() {
            return Err(ModelError::NonFiniteEstimate(estimate));
        }
        let rounded = estimate.round().clamp(1.0, u32::MAX as f64);
        Ok(rounded as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stub model echoing a fixed estimate.
    struct Fixed(f64);

    impl RegressionModel for Fixed {
        fn predict(&self, _features: &ThresholdFeatures) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    struct AlwaysFails;

    impl RegressionModel for AlwaysFails {
        fn predict(&self, _features: &ThresholdFeatures) -> Result<f64, ModelError> {
            Err(ModelError::InvalidFeatures("boom".into()))
        }
    }

    fn features() -> ThresholdFeatures {
        ThresholdFeatures {
            avg_monthly_sales: 3.0,
            lead_time_days: 2.0,
        }
    }

    #[test]
    fn estimates_round_to_nearest_integer() {
        assert_eq!(ThresholdPredictor::new(Fixed(6.4)).predict(&features()).unwrap(), 6);
        assert_eq!(ThresholdPredictor::new(Fixed(6.5)).predict(&features()).unwrap(), 7);
    }

    #[test]
    fn threshold_is_floored_at_one() {
        assert_eq!(ThresholdPredictor::new(Fixed(0.2)).predict(&features()).unwrap(), 1);
        assert_eq!(ThresholdPredictor::new(Fixed(-14.0)).predict(&features()).unwrap(), 1);
        assert_eq!(ThresholdPredictor::new(Fixed(0.0)).predict(&features()).unwrap(), 1);
    }

    #[test]
    fn non_finite_estimates_are_rejected_not_floored() {
        // A NaN would otherwise survive round/clamp and saturate to 0 on
        // the integer cast, emitting a threshold below the floor.
        let err = ThresholdPredictor::new(Fixed(f64::NAN)).predict(&features()).unwrap_err();
        assert!(matches!(err, ModelError::NonFiniteEstimate(_)));

        let err = ThresholdPredictor::new(Fixed(f64::INFINITY)).predict(&features()).unwrap_err();
        assert!(matches!(err, ModelError::NonFiniteEstimate(_)));
    }

    #[test]
    fn model_errors_propagate_per_item() {
        let err = ThresholdPredictor::new(AlwaysFails).predict(&features()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidFeatures(_)));
    }

    #[test]
    fn velocity_ignores_silent_months() {
        // 60 units over 4 months with sales, regardless of quiet months.
        assert_eq!(average_velocity(60, 4), 15.0);
    }

    #[test]
    fn velocity_denominator_is_clamped_to_one() {
        assert_eq!(average_velocity(25, 0), 25.0);
        assert_eq!(average_velocity(0, 0), 0.0);
    }
}
