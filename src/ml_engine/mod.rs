//! ML Engine for Event Reward Optimization
//!
//! Learns how reward size and lead time drive event attendance, then searches
//! for the cheapest reward expected to reach a target head count.
//!
//! ## Key Features
//! - One-hot + standard-scaled feature encoding with unseen-category tolerance
//! - **Time-decayed reward** `reward * exp(-lambda * date_gap)` as a feature
//! - Decay rate chosen by seeded K-fold cross-validated R²
//! - Gradient-boosted regression trees (leaf-wise, optional seeded bagging)
//! - Bounded Brent search over a composite target-error / cost loss
//! - Atomic model publication: single writer, many lock-free readers
//!
//! ## Architecture
//! - `encoder`: FeatureEncoder (vocabularies, means, scales)
//! - `decay`: time-decay transform
//! - `gbdt`: boosted tree ensemble
//! - `metrics`: R² and the K-fold splitter
//! - `predictor`: AttendancePredictor and the AttendanceModel trait
//! - `decay_selector`: cross-validated decay-rate selection
//! - `minimizer`: bounded scalar minimizer
//! - `reward_search`: loss definition and reward recommendation
//! - `state`: ModelState and the RewardEngine that publishes it
//! - `dataset`: CSV training table loader

pub mod dataset;
pub mod decay;
pub mod decay_selector;
pub mod encoder;
pub mod error;
pub mod gbdt;
pub mod metrics;
pub mod minimizer;
pub mod predictor;
pub mod reward_search;
pub mod state;

// Re-export public types
pub use dataset::TrainingDataset;
pub use decay::effective_reward;
pub use decay_selector::{CandidateScore, DecayRateSelector, DecaySelection, FoldingPolicy};
pub use encoder::{EncoderParams, FeatureEncoder};
pub use error::{EngineError, EngineResult};
pub use gbdt::GradientBoostedTrees;
pub use metrics::{kfold_splits, r2_score, Fold};
pub use minimizer::{minimize_bounded, Minimum};
pub use predictor::{AttendanceModel, AttendancePredictor};
pub use reward_search::{RewardLoss, RewardSearch};
pub use state::{ModelState, RewardEngine, TrainingReport};
