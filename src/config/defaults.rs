//! Engine-wide default constants.
//!
//! Every tunable in [`EngineConfig`](super::EngineConfig) takes its default
//! from here. Grouped by subsystem.

// ============================================================================
// Tree Ensemble
// ============================================================================

/// Boosting rounds.
pub const N_ESTIMATORS: usize = 500;

/// Shrinkage applied to every tree's leaf values.
pub const LEARNING_RATE: f64 = 0.05;

/// Maximum leaves per tree (leaf-wise growth).
pub const NUM_LEAVES: usize = 31;

/// Minimum training rows on each side of a split.
pub const MIN_CHILD_SAMPLES: usize = 20;

/// Fraction of rows drawn (without replacement) when bagging is on.
pub const SUBSAMPLE: f64 = 0.8;

/// Redraw the row bag every this many rounds; 0 disables bagging, so
/// `SUBSAMPLE` has no effect at the default.
pub const SUBSAMPLE_FREQ: usize = 0;

/// Fraction of encoded columns considered by each tree.
pub const COLSAMPLE_BYTREE: f64 = 0.8;

/// L2 penalty on leaf values.
pub const REG_LAMBDA: f64 = 1.0;

/// Ensemble RNG seed.
pub const MODEL_SEED: u64 = 42;

// ============================================================================
// Decay-Rate Selection
// ============================================================================

/// Candidate decay rates, evaluated in this order (ties keep the earliest).
pub const DECAY_CANDIDATES: [f64; 5] = [0.0, 0.01, 0.03, 0.05, 0.08];

/// Cross-validation fold count.
pub const CV_FOLDS: usize = 3;

/// Seed for the cross-validation shuffle.
pub const CV_SEED: u64 = 42;

// ============================================================================
// Reward Search
// ============================================================================

/// Weight of the relative attendance error in the search loss.
pub const ALPHA: f64 = 3.0;

/// Weight of the relative reward cost in the search loss.
pub const BETA: f64 = 0.2;

/// Upper search bound is `reward_max * (1 + EXPLORATION_MARGIN)`.
pub const EXPLORATION_MARGIN: f64 = 0.2;

/// Floor for the cost-term denominator.
pub const COST_DENOMINATOR_FLOOR: f64 = 1e-6;

/// Absolute reward tolerance of the bounded minimizer.
pub const SEARCH_XATOL: f64 = 1e-5;

/// Iteration cap of the bounded minimizer.
pub const SEARCH_MAX_ITERATIONS: usize = 500;

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "REWARD_OPTIMIZER_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "reward_optimizer.toml";
