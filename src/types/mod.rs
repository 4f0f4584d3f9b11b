//! Shared data structures for the reward optimization pipeline
//!
//! - `event`: EventFeatures (extracted attributes), EventRecord (training
//!   row), FeatureVector (per-prediction view)
//! - `recommendation`: RecommendRequest, SearchBounds, RewardRecommendation,
//!   RecommendationResponse (narrative generator input)

mod event;
mod recommendation;

pub use event::*;
pub use recommendation::*;
