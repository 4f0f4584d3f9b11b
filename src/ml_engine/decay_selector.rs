//! Decay-rate selection by cross-validated R².
//!
//! Every candidate rate is scored by training a fresh predictor per fold and
//! measuring R² of the raw (unclipped) ensemble output on the held-out rows. Tiny datasets (no more rows than folds)
//! fall back to scoring on the training rows themselves. The best mean score
//! wins; ties go to the earliest candidate.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ModelConfig, SelectionConfig};
use crate::types::EventRecord;

use super::error::{EngineError, EngineResult};
use super::metrics::{kfold_splits, r2_score};
use super::predictor::{validate_records, AttendancePredictor};

/// How a candidate's score was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "folds", rename_all = "snake_case")]
pub enum FoldingPolicy {
    /// Shuffled K-fold cross-validation
    KFold(usize),
    /// Fit and score on the same rows
    Resubstitution,
}

impl FoldingPolicy {
    /// K-fold when there are more rows than folds, resubstitution otherwise.
    pub fn for_rows(n_rows: usize, folds: usize) -> Self {
        if n_rows > folds {
            FoldingPolicy::KFold(folds)
        } else {
            FoldingPolicy::Resubstitution
        }
    }
}

impl std::fmt::Display for FoldingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FoldingPolicy::KFold(k) => write!(f, "{k}-fold"),
            FoldingPolicy::Resubstitution => write!(f, "resubstitution"),
        }
    }
}

/// Score of one decay candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub lambda: f64,
    pub mean_r2: f64,
    pub policy: FoldingPolicy,
}

/// Selected rate plus the full score table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecaySelection {
    pub selected: f64,
    pub scores: Vec<CandidateScore>,
}

impl DecaySelection {
    /// Score of the selected candidate.
    pub fn selected_score(&self) -> Option<&CandidateScore> {
        self.scores.iter().find(|s| s.lambda == self.selected)
    }
}

/// Chooses the decay rate for the attendance predictor.
#[derive(Debug, Clone)]
pub struct DecayRateSelector<'a> {
    model: &'a ModelConfig,
    selection: &'a SelectionConfig,
}

impl<'a> DecayRateSelector<'a> {
    pub fn new(model: &'a ModelConfig, selection: &'a SelectionConfig) -> Self {
        Self { model, selection }
    }

    /// Score every candidate in order and pick the best.
    pub fn select(&self, records: &[EventRecord]) -> EngineResult<DecaySelection> {
        if records.is_empty() {
            return Err(EngineError::DataValidation(
                "cannot select a decay rate on zero rows".to_string(),
            ));
        }
        validate_records(records)?;
        if self.selection.decay_candidates.is_empty() {
            return Err(EngineError::Config("decay candidate list is empty".to_string()));
        }
        if let Some(&bad) = self
            .selection
            .decay_candidates
            .iter()
            .find(|l| !(**l >= 0.0 && l.is_finite()))
        {
            return Err(EngineError::Config(format!(
                "decay candidate {bad} is not a non-negative rate"
            )));
        }
        if self.selection.folds < 2 {
            return Err(EngineError::Config(format!(
                "cross-validation needs at least 2 folds, got {}",
                self.selection.folds
            )));
        }

        let policy = FoldingPolicy::for_rows(records.len(), self.selection.folds);
        let mut scores = Vec::with_capacity(self.selection.decay_candidates.len());
        let mut best: Option<(f64, f64)> = None;

        for &lambda in &self.selection.decay_candidates {
            let mean_r2 = self.score(records, lambda, policy)?;
            debug!(lambda, mean_r2, %policy, "Decay candidate scored");
            if best.map_or(true, |(_, s)| mean_r2 > s) {
                best = Some((lambda, mean_r2));
            }
            scores.push(CandidateScore {
                lambda,
                mean_r2,
                policy,
            });
        }

        let (selected, score) =
            best.ok_or_else(|| EngineError::Config("no decay candidate scored".to_string()))?;
        info!(
            lambda = selected,
            mean_r2 = score,
            candidates = scores.len(),
            rows = records.len(),
            %policy,
            "Decay rate selected"
        );
        Ok(DecaySelection { selected, scores })
    }

    fn score(&self, records: &[EventRecord], lambda: f64, policy: FoldingPolicy) -> EngineResult<f64> {
        match policy {
            FoldingPolicy::Resubstitution => {
                let mut predictor = AttendancePredictor::new(self.model.clone(), lambda);
                predictor.fit(records)?;
                let predicted = predictor.predict_records_raw(records)?;
                Ok(r2_score(&targets(records), &predicted))
            }
            FoldingPolicy::KFold(k) => {
                let folds = kfold_splits(records.len(), k, self.selection.shuffle_seed);
                let mut total = 0.0;
                for (i, fold) in folds.iter().enumerate() {
                    let train: Vec<EventRecord> =
                        fold.train.iter().map(|&j| records[j].clone()).collect();
                    let test: Vec<EventRecord> =
                        fold.test.iter().map(|&j| records[j].clone()).collect();

                    let mut predictor = AttendancePredictor::new(self.model.clone(), lambda);
                    predictor.fit(&train)?;
                    let predicted = predictor.predict_records_raw(&test)?;
                    let r2 = r2_score(&targets(&test), &predicted);
                    debug!(lambda, fold = i, train = train.len(), test = test.len(), r2, "Fold scored");
                    total += r2;
                }
                Ok(total / folds.len() as f64)
            }
        }
    }
}

fn targets(records: &[EventRecord]) -> Vec<f64> {
    records.iter().map(|r| r.attended_participants).collect()
}
