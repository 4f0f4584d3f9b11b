//! Attendance predictor: encoder + boosted trees behind a decay rate.
//!
//! The decay rate is fixed at construction. `fit` learns encoder parameters
//! and the ensemble from historical events; `predict` rebuilds the feature
//! vector for a candidate reward and clips the regression output at zero.

use tracing::debug;

use crate::config::ModelConfig;
use crate::types::{EventFeatures, EventRecord, FeatureVector};

use super::decay::effective_reward;
use super::encoder::FeatureEncoder;
use super::error::{EngineError, EngineResult};
use super::gbdt::GradientBoostedTrees;

/// Anything that can forecast attendance for an event at a given reward.
///
/// The reward search is written against this trait so it runs on a fitted
/// predictor, a published model snapshot, or a test stub alike.
pub trait AttendanceModel {
    /// Expected attendance at `reward`. Never negative.
    fn predict_participants(&self, features: &EventFeatures, reward: f64) -> EngineResult<f64>;

    /// `(reward_min, reward_max)` observed in training.
    fn reward_range(&self) -> EngineResult<(f64, f64)>;
}

#[derive(Debug, Clone)]
struct Fitted {
    encoder: FeatureEncoder,
    ensemble: GradientBoostedTrees,
    reward_min: f64,
    reward_max: f64,
}

/// Regression model of attended participants.
#[derive(Debug, Clone)]
pub struct AttendancePredictor {
    config: ModelConfig,
    decay_lambda: f64,
    fitted: Option<Fitted>,
}

impl AttendancePredictor {
    pub fn new(config: ModelConfig, decay_lambda: f64) -> Self {
        Self {
            config,
            decay_lambda,
            fitted: None,
        }
    }

    pub fn decay_lambda(&self) -> f64 {
        self.decay_lambda
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Encoded column names, once fitted.
    pub fn feature_names(&self) -> Option<Vec<String>> {
        self.fitted.as_ref()?.encoder.feature_names()
    }

    /// Fit on `records`. On error the predictor keeps its previous state.
    pub fn fit(&mut self, records: &[EventRecord]) -> EngineResult<()> {
        if records.is_empty() {
            return Err(EngineError::DataValidation(
                "cannot fit predictor on zero rows".to_string(),
            ));
        }
        validate_records(records)?;

        let rows: Vec<FeatureVector<'_>> = records.iter().map(|r| self.vector_for(r)).collect();
        let mut encoder = FeatureEncoder::new();
        encoder.fit(&rows)?;
        let x = encoder.transform_all(&rows)?;
        let y: Vec<f64> = records.iter().map(|r| r.attended_participants).collect();
        let ensemble = GradientBoostedTrees::fit(&x, &y, &self.config)?;

        let (reward_min, reward_max) = records.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), r| (lo.min(r.reward_amount), hi.max(r.reward_amount)),
        );

        debug!(
            rows = records.len(),
            width = x.first().map_or(0, Vec::len),
            trees = ensemble.n_trees(),
            lambda = self.decay_lambda,
            "Attendance predictor fitted"
        );

        self.fitted = Some(Fitted {
            encoder,
            ensemble,
            reward_min,
            reward_max,
        });
        Ok(())
    }

    /// Expected attendance for `features` at `reward`, clipped at 0.
    pub fn predict(&self, features: &EventFeatures, reward: f64) -> EngineResult<f64> {
        Ok(self.predict_raw(features, reward)?.max(0.0))
    }

    /// Unclipped ensemble output for each record at its own historical
    /// reward. Held-out scoring uses this.
    pub fn predict_records_raw(&self, records: &[EventRecord]) -> EngineResult<Vec<f64>> {
        records
            .iter()
            .map(|r| self.predict_raw(&r.features, r.reward_amount))
            .collect()
    }

    fn predict_raw(&self, features: &EventFeatures, reward: f64) -> EngineResult<f64> {
        let fitted = self.fitted.as_ref().ok_or(EngineError::ModelNotFitted)?;
        if !reward.is_finite() {
            return Err(EngineError::Prediction(format!("reward {reward} is not finite")));
        }
        let effective = effective_reward(reward, f64::from(features.date_gap), self.decay_lambda);
        let row = fitted
            .encoder
            .transform(&FeatureVector::new(features, reward, effective))?;
        fitted.ensemble.predict(&row)
    }

    fn vector_for<'r>(&self, record: &'r EventRecord) -> FeatureVector<'r> {
        let effective = effective_reward(
            record.reward_amount,
            f64::from(record.features.date_gap),
            self.decay_lambda,
        );
        FeatureVector::new(&record.features, record.reward_amount, effective)
    }
}

/// Reject training rows with non-finite numeric values.
pub(crate) fn validate_records(records: &[EventRecord]) -> EngineResult<()> {
    for (i, r) in records.iter().enumerate() {
        let values = [
            r.features.brand_score,
            r.reward_amount,
            r.attended_participants,
            r.applied_participants,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::DataValidation(format!(
                "row {i} has a non-finite value (brand_score {}, reward {}, attended {}, applied {})",
                values[0], values[1], values[2], values[3]
            )));
        }
    }
    Ok(())
}

impl AttendanceModel for AttendancePredictor {
    fn predict_participants(&self, features: &EventFeatures, reward: f64) -> EngineResult<f64> {
        self.predict(features, reward)
    }

    fn reward_range(&self) -> EngineResult<(f64, f64)> {
        self.fitted
            .as_ref()
            .map(|f| (f.reward_min, f.reward_max))
            .ok_or(EngineError::ModelNotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{SyntheticConfig, SyntheticEvents};

    fn small_config() -> ModelConfig {
        ModelConfig {
            n_estimators: 60,
            learning_rate: 0.1,
            min_child_samples: 5,
            ..ModelConfig::default()
        }
    }

    fn records(n: usize) -> Vec<EventRecord> {
        SyntheticEvents::new(SyntheticConfig {
            rows: n,
            ..SyntheticConfig::default()
        })
        .generate()
    }

    #[test]
    fn test_predict_before_fit() {
        let predictor = AttendancePredictor::new(small_config(), 0.03);
        let rows = records(1);
        let err = predictor.predict(&rows[0].features, 1000.0).unwrap_err();
        assert!(matches!(err, EngineError::ModelNotFitted));
        assert!(matches!(predictor.reward_range(), Err(EngineError::ModelNotFitted)));
    }

    #[test]
    fn test_predictions_never_negative() {
        let rows = records(120);
        let mut predictor = AttendancePredictor::new(small_config(), 0.03);
        predictor.fit(&rows).unwrap();
        for &reward in &[0.0, 1.0, 5_000.0, 1e9, -1e9] {
            let p = predictor.predict(&rows[0].features, reward).unwrap();
            assert!(p >= 0.0, "reward {reward} -> {p}");
        }
        assert!(matches!(
            predictor.predict(&rows[0].features, f64::NAN),
            Err(EngineError::Prediction(_))
        ));
    }

    #[test]
    fn test_reward_range_and_determinism() {
        let rows = records(80);
        let mut a = AttendancePredictor::new(small_config(), 0.05);
        let mut b = AttendancePredictor::new(small_config(), 0.05);
        a.fit(&rows).unwrap();
        b.fit(&rows).unwrap();

        let (lo, hi) = a.reward_range().unwrap();
        assert!(rows.iter().all(|r| r.reward_amount >= lo && r.reward_amount <= hi));

        let pa = a.predict(&rows[3].features, 2500.0).unwrap();
        let pb = b.predict(&rows[3].features, 2500.0).unwrap();
        assert_eq!(pa.to_bits(), pb.to_bits());
    }

    #[test]
    fn test_clipping_applies_only_to_predict() {
        let rows = records(80);
        let mut predictor = AttendancePredictor::new(small_config(), 0.05);
        predictor.fit(&rows).unwrap();

        let raw = predictor.predict_records_raw(&rows).unwrap();
        assert_eq!(raw.len(), rows.len());
        for (r, value) in rows.iter().zip(&raw) {
            let clipped = predictor.predict(&r.features, r.reward_amount).unwrap();
            assert_eq!(clipped.to_bits(), value.max(0.0).to_bits());
        }
    }

    #[test]
    fn test_failed_fit_keeps_previous_model() {
        let rows = records(60);
        let mut predictor = AttendancePredictor::new(small_config(), 0.0);
        predictor.fit(&rows).unwrap();
        let before = predictor.predict(&rows[0].features, 1500.0).unwrap();

        let mut bad = rows.clone();
        bad[0].attended_participants = f64::NAN;
        assert!(matches!(predictor.fit(&bad), Err(EngineError::DataValidation(_))));
        assert!(matches!(predictor.fit(&[]), Err(EngineError::DataValidation(_))));
        assert_eq!(predictor.predict(&rows[0].features, 1500.0).unwrap(), before);
    }
}
