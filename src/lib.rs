//! Reward Optimizer: event attendance forecasting and reward recommendation
//!
//! Learns from historical campus events how reward size and lead time drive
//! attendance, then recommends the reward expected to reach a target head
//! count at the lowest cost.
//!
//! ## Architecture
//!
//! - **Types**: event features, training records, request/response records
//! - **ML Engine**: encoder, time-decay transform, decay-rate selection,
//!   boosted-tree attendance predictor, bounded reward search, atomically
//!   published model state
//! - **Config**: TOML engine configuration with validation
//! - **Synthetic**: seeded event-log generator with a known decay rate

pub mod config;
pub mod ml_engine;
pub mod synthetic;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, EngineConfig};

// Re-export commonly used types
pub use types::{
    EventFeatures, EventRecord, FeatureVector, RecommendRequest, RecommendationResponse,
    RewardRecommendation, SearchBounds,
};

// Re-export ML Engine types
pub use ml_engine::{
    AttendanceModel, AttendancePredictor, DecaySelection, EngineError, EngineResult,
    FoldingPolicy, ModelState, RewardEngine, TrainingDataset, TrainingReport,
};
