//! Reward search: the cheapest reward that still hits the attendance target.
//!
//! ```text
//! relative_error(r) = |predict(r) - target| / max(target, 1)
//! relative_cost(r)  = predict(r) * r / max(high * max(target, 1), 1e-6)
//! loss(r)           = alpha * relative_error(r) + beta * relative_cost(r)
//! ```
//!
//! `high` is the resolved upper bound of the search interval, including when
//! the caller supplied it.

use tracing::{debug, info};

use crate::config::{defaults, SearchConfig};
use crate::types::{EventFeatures, RewardRecommendation, SearchBounds};

use super::error::{EngineError, EngineResult};
use super::minimizer::minimize_bounded;
use super::predictor::AttendanceModel;

/// Composite search loss for a fixed event, target and interval.
#[derive(Debug, Clone, Copy)]
pub struct RewardLoss {
    alpha: f64,
    beta: f64,
    target_scale: f64,
    cost_scale: f64,
    target: f64,
}

impl RewardLoss {
    pub fn new(config: &SearchConfig, target: f64, high: f64) -> Self {
        let target_scale = target.max(1.0);
        Self {
            alpha: config.alpha,
            beta: config.beta,
            target_scale,
            cost_scale: (high * target_scale).max(defaults::COST_DENOMINATOR_FLOOR),
            target,
        }
    }

    /// Loss at `reward` given the forecast `predicted` there.
    pub fn evaluate(&self, reward: f64, predicted: f64) -> f64 {
        let relative_error = (predicted - self.target).abs() / self.target_scale;
        let relative_cost = predicted * reward / self.cost_scale;
        self.alpha * relative_error + self.beta * relative_cost
    }
}

/// Bounded one-dimensional reward search.
pub struct RewardSearch;

impl RewardSearch {
    /// Resolve the search interval from caller bounds and the trained range.
    ///
    /// Defaults: `low = max(0, reward_min)`,
    /// `high = reward_max * (1 + exploration_margin)`.
    pub fn resolve_bounds<M: AttendanceModel + ?Sized>(
        model: &M,
        bounds: SearchBounds,
        config: &SearchConfig,
    ) -> EngineResult<(f64, f64)> {
        let (low, high) = match (bounds.low, bounds.high) {
            (Some(low), Some(high)) => (low, high),
            (low, high) => {
                let (reward_min, reward_max) = model.reward_range()?;
                (
                    low.unwrap_or_else(|| reward_min.max(0.0)),
                    high.unwrap_or(reward_max * (1.0 + config.exploration_margin)),
                )
            }
        };
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(EngineError::InvalidBounds { low, high });
        }
        Ok((low, high))
    }

    /// Find the reward minimizing [`RewardLoss`] for `features` and `target`.
    pub fn search<M: AttendanceModel + ?Sized>(
        model: &M,
        features: &EventFeatures,
        target: f64,
        bounds: SearchBounds,
        config: &SearchConfig,
    ) -> EngineResult<RewardRecommendation> {
        if !target.is_finite() {
            return Err(EngineError::Prediction(format!(
                "target participants {target} is not finite"
            )));
        }
        let (low, high) = Self::resolve_bounds(model, bounds, config)?;
        let loss = RewardLoss::new(config, target, high);

        let minimum = minimize_bounded(
            |reward| {
                let predicted = model.predict_participants(features, reward)?;
                Ok(loss.evaluate(reward, predicted))
            },
            low,
            high,
            config.xatol,
            config.max_iterations,
        )?;

        let reward = minimum.x.clamp(low, high);
        let expected_attendance = model.predict_participants(features, reward)?;

        if !minimum.converged {
            debug!(
                evaluations = minimum.evaluations,
                "Reward search hit its evaluation limit"
            );
        }
        info!(
            reward,
            expected = expected_attendance,
            target,
            low,
            high,
            loss = minimum.fun,
            evaluations = minimum.evaluations,
            "Reward search complete"
        );

        Ok(RewardRecommendation {
            reward,
            expected_attendance,
            low,
            high,
            loss: minimum.fun,
            evaluations: minimum.evaluations,
        })
    }
}
