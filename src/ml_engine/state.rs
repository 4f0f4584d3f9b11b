//! Published model state and the engine that owns it.
//!
//! `fit` builds a complete [`ModelState`] off to the side and publishes it
//! with a single pointer swap. Readers take a snapshot (`Arc`) and keep using
//! it for the whole request, so they see either the old or the new model,
//! never a mix. Concurrent `fit` calls are serialized by a mutex; a failed
//! fit publishes nothing.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::types::{EventFeatures, EventRecord, RewardRecommendation, SearchBounds};

use super::decay_selector::{DecayRateSelector, DecaySelection};
use super::error::{EngineError, EngineResult};
use super::predictor::{AttendanceModel, AttendancePredictor};
use super::reward_search::RewardSearch;

// ============================================================================
// Model State
// ============================================================================

/// Everything needed to answer predictions, learned by one `fit`.
#[derive(Debug, Clone)]
pub struct ModelState {
    predictor: AttendancePredictor,
    report: TrainingReport,
}

impl ModelState {
    pub fn decay_lambda(&self) -> f64 {
        self.predictor.decay_lambda()
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }
}

impl AttendanceModel for ModelState {
    fn predict_participants(&self, features: &EventFeatures, reward: f64) -> EngineResult<f64> {
        self.predictor.predict(features, reward)
    }

    fn reward_range(&self) -> EngineResult<(f64, f64)> {
        Ok((self.report.reward_min, self.report.reward_max))
    }
}

/// Summary of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub decay_lambda: f64,
    pub selection: DecaySelection,
    pub reward_min: f64,
    pub reward_max: f64,
    /// Mean attended / max(applied, 1) over the training rows
    pub mean_attendance_rate: f64,
    pub trained_at: DateTime<Utc>,
}

// ============================================================================
// Engine
// ============================================================================

/// Single-writer / many-reader handle around the published [`ModelState`].
#[derive(Debug)]
pub struct RewardEngine {
    config: EngineConfig,
    state: ArcSwapOption<ModelState>,
    fit_lock: Mutex<()>,
}

impl RewardEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: ArcSwapOption::empty(),
            fit_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.state.load().is_some()
    }

    /// Current published state, if any.
    pub fn snapshot(&self) -> Option<Arc<ModelState>> {
        self.state.load_full()
    }

    /// Select a decay rate, fit the predictor on all rows and publish.
    ///
    /// On error the previously published state stays in service.
    pub fn fit(&self, records: &[EventRecord]) -> EngineResult<TrainingReport> {
        // The lock guards no data, so poisoning is harmless
        let _guard = self
            .fit_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let state = match self.build_state(records) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, rows = records.len(), "Fit failed, keeping previous model");
                return Err(e);
            }
        };

        let report = state.report.clone();
        self.state.store(Some(Arc::new(state)));
        info!(
            rows = report.rows,
            lambda = report.decay_lambda,
            reward_min = report.reward_min,
            reward_max = report.reward_max,
            "Model published"
        );
        Ok(report)
    }

    /// Expected attendance for `features` at `reward`. Never negative.
    pub fn predict_participants(&self, features: &EventFeatures, reward: f64) -> EngineResult<f64> {
        let state = self.snapshot().ok_or(EngineError::ModelNotFitted)?;
        state.predict_participants(features, reward)
    }

    /// Reward recommendation for reaching `target` participants.
    pub fn find_best_reward(
        &self,
        features: &EventFeatures,
        target: f64,
        bounds: SearchBounds,
    ) -> EngineResult<RewardRecommendation> {
        let state = self.snapshot().ok_or(EngineError::ModelNotFitted)?;
        RewardSearch::search(state.as_ref(), features, target, bounds, &self.config.search)
    }

    fn build_state(&self, records: &[EventRecord]) -> EngineResult<ModelState> {
        let selection =
            DecayRateSelector::new(&self.config.model, &self.config.selection).select(records)?;

        let mut predictor = AttendancePredictor::new(self.config.model.clone(), selection.selected);
        predictor.fit(records)?;
        let (reward_min, reward_max) = predictor.reward_range()?;

        let mean_attendance_rate =
            records.iter().map(EventRecord::attendance_rate).sum::<f64>() / records.len() as f64;

        Ok(ModelState {
            predictor,
            report: TrainingReport {
                rows: records.len(),
                decay_lambda: selection.selected,
                selection,
                reward_min,
                reward_max,
                mean_attendance_rate,
                trained_at: Utc::now(),
            },
        })
    }
}

impl Default for RewardEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::synthetic::{SyntheticConfig, SyntheticEvents};

    fn engine() -> RewardEngine {
        let mut config = EngineConfig::default();
        config.model = ModelConfig {
            n_estimators: 40,
            learning_rate: 0.1,
            min_child_samples: 5,
            ..ModelConfig::default()
        };
        config.selection.decay_candidates = vec![0.0, 0.05];
        RewardEngine::new(config)
    }

    fn data(rows: usize) -> Vec<EventRecord> {
        SyntheticEvents::new(SyntheticConfig {
            rows,
            ..SyntheticConfig::default()
        })
        .generate()
    }

    #[test]
    fn test_not_fitted_errors() {
        let engine = engine();
        let rows = data(1);
        assert!(!engine.is_fitted());
        assert!(matches!(
            engine.predict_participants(&rows[0].features, 100.0),
            Err(EngineError::ModelNotFitted)
        ));
        assert!(matches!(
            engine.find_best_reward(&rows[0].features, 10.0, SearchBounds::default()),
            Err(EngineError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_fit_publishes_state() {
        let engine = engine();
        let rows = data(60);
        let report = engine.fit(&rows).unwrap();
        assert_eq!(report.rows, 60);
        assert!([0.0, 0.05].contains(&report.decay_lambda));
        assert!(report.reward_min <= report.reward_max);

        let snapshot = engine.snapshot().unwrap();
        assert_eq!(snapshot.decay_lambda(), report.decay_lambda);
        assert_eq!(snapshot.report(), &report);

        let rec = engine
            .find_best_reward(&rows[0].features, 20.0, SearchBounds::default())
            .unwrap();
        assert!(rec.reward >= rec.low && rec.reward <= rec.high);
        assert!((rec.high - report.reward_max * 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_failed_fit_keeps_old_state() {
        let engine = engine();
        let rows = data(40);
        engine.fit(&rows).unwrap();
        let before = engine.snapshot().unwrap();

        assert!(engine.fit(&[]).is_err());
        let after = engine.snapshot().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_snapshot_survives_refit() {
        let engine = engine();
        let rows = data(40);
        engine.fit(&rows).unwrap();
        let old = engine.snapshot().unwrap();
        let p_old = old.predict_participants(&rows[0].features, 1000.0).unwrap();

        engine.fit(&data(50)).unwrap();
        // The old snapshot is untouched by the swap
        assert_eq!(old.predict_participants(&rows[0].features, 1000.0).unwrap(), p_old);
        assert_eq!(old.report().rows, 40);
        assert_eq!(engine.snapshot().unwrap().report().rows, 50);
    }
}
