//! Feature encoder: one-hot categorical attributes, standardized numerics.
//!
//! Output layout is fixed once fitted: one indicator block per categorical
//! attribute (in [`CATEGORICAL_COLUMNS`] order, vocabulary sorted), followed
//! by the four standardized numerics in [`NUMERIC_COLUMNS`] order.
//!
//! A category not seen during `fit` encodes as an all-zero block. That is a
//! regular lookup miss, not an error.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::types::{FeatureVector, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};

use super::error::{EngineError, EngineResult};

const NUM_CATEGORICAL: usize = CATEGORICAL_COLUMNS.len();
const NUM_NUMERIC: usize = NUMERIC_COLUMNS.len();

/// Learned encoder parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderParams {
    /// Sorted, deduplicated vocabulary per categorical attribute
    vocabularies: [Vec<String>; NUM_CATEGORICAL],
    /// Start offset of each categorical block in the output vector
    offsets: [usize; NUM_CATEGORICAL],
    means: [f64; NUM_NUMERIC],
    scales: [f64; NUM_NUMERIC],
}

impl EncoderParams {
    /// Total encoded width.
    pub fn width(&self) -> usize {
        self.vocabularies.iter().map(Vec::len).sum::<usize>() + NUM_NUMERIC
    }
}

/// One-hot + standard-scaling encoder.
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    params: Option<EncoderParams>,
}

impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    pub fn params(&self) -> Option<&EncoderParams> {
        self.params.as_ref()
    }

    /// Learn vocabularies and numeric mean/scale from `rows`.
    ///
    /// Scale is the population standard deviation, replaced by 1.0 for
    /// constant columns so they encode as 0.
    pub fn fit(&mut self, rows: &[FeatureVector<'_>]) -> EngineResult<()> {
        if rows.is_empty() {
            return Err(EngineError::DataValidation(
                "cannot fit encoder on zero rows".to_string(),
            ));
        }

        let mut vocabularies: [Vec<String>; NUM_CATEGORICAL] = Default::default();
        for row in rows {
            for (vocab, value) in vocabularies.iter_mut().zip(row.features.categorical_values()) {
                if let Err(pos) = vocab.binary_search_by(|v| v.as_str().cmp(value)) {
                    vocab.insert(pos, value.to_string());
                }
            }
        }

        let mut offsets = [0usize; NUM_CATEGORICAL];
        let mut offset = 0;
        for (slot, vocab) in offsets.iter_mut().zip(&vocabularies) {
            *slot = offset;
            offset += vocab.len();
        }

        let mut means = [0.0; NUM_NUMERIC];
        let mut scales = [1.0; NUM_NUMERIC];
        for col in 0..NUM_NUMERIC {
            let values: Vec<f64> = rows.iter().map(|r| r.numeric_values()[col]).collect();
            if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                return Err(EngineError::DataValidation(format!(
                    "non-finite value {bad} in numeric column '{}'",
                    NUMERIC_COLUMNS[col]
                )));
            }
            means[col] = values.iter().mean();
            let std = values.iter().population_std_dev();
            scales[col] = if std > 0.0 { std } else { 1.0 };
        }

        self.params = Some(EncoderParams {
            vocabularies,
            offsets,
            means,
            scales,
        });
        Ok(())
    }

    /// Encode one row into a fresh vector.
    pub fn transform(&self, row: &FeatureVector<'_>) -> EngineResult<Vec<f64>> {
        let params = self.params.as_ref().ok_or_else(|| {
            EngineError::Config("feature encoder used before fit".to_string())
        })?;

        let mut out = vec![0.0; params.width()];
        for (col, value) in row.features.categorical_values().into_iter().enumerate() {
            let hit = params.vocabularies[col]
                .binary_search_by(|v| v.as_str().cmp(value))
                .ok();
            if let Some(idx) = hit {
                out[params.offsets[col] + idx] = 1.0;
            }
        }

        let numeric_start = out.len() - NUM_NUMERIC;
        for (col, value) in row.numeric_values().into_iter().enumerate() {
            out[numeric_start + col] = (value - params.means[col]) / params.scales[col];
        }
        Ok(out)
    }

    /// Encode many rows.
    pub fn transform_all(&self, rows: &[FeatureVector<'_>]) -> EngineResult<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    /// Human-readable name of every output column (`event_type=seminar`,
    /// ..., `reward_effective`).
    pub fn feature_names(&self) -> Option<Vec<String>> {
        let params = self.params.as_ref()?;
        let mut names = Vec::with_capacity(params.width());
        for (col, vocab) in params.vocabularies.iter().enumerate() {
            names.extend(vocab.iter().map(|v| format!("{}={v}", CATEGORICAL_COLUMNS[col])));
        }
        names.extend(NUMERIC_COLUMNS.iter().map(|s| (*s).to_string()));
        Some(names)
    }
}
