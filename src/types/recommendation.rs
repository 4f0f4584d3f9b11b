//! Request and result records exchanged with the upstream feature extractor
//! and the downstream narrative generator.

use serde::{Deserialize, Serialize};

use super::EventFeatures;

/// A reward recommendation request.
///
/// `title` is carried for the narrative generator only and never reaches the
/// model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub features: EventFeatures,
    pub target_participants: f64,
}

/// Optional caller overrides for the reward search interval.
///
/// Unset ends fall back to the trained reward range
/// (`max(0, reward_min)` and `reward_max * (1 + exploration_margin)`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchBounds {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl SearchBounds {
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }
}

/// Outcome of a reward search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardRecommendation {
    /// Recommended reward, always within the resolved search interval
    pub reward: f64,
    /// Predicted attendance at `reward`
    pub expected_attendance: f64,
    /// Resolved lower search bound
    pub low: f64,
    /// Resolved upper search bound
    pub high: f64,
    /// Composite loss at `reward`
    pub loss: f64,
    /// Objective evaluations spent by the minimizer
    pub evaluations: usize,
}

/// The four values handed to the narrative generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub features: EventFeatures,
    pub recommended_reward: f64,
    pub expected_participants: f64,
    pub target_participants: f64,
}

impl RecommendationResponse {
    pub fn new(request: RecommendRequest, recommendation: &RewardRecommendation) -> Self {
        Self {
            title: request.title,
            features: request.features,
            recommended_reward: recommendation.reward,
            expected_participants: recommendation.expected_attendance,
            target_participants: request.target_participants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ignores_unknown_keys() {
        let json = r#"{
            "title": "Hackathon",
            "event_type": "competition",
            "organizer_type": "club",
            "target_major": "all",
            "target_grade": "all",
            "weekday": "Sat",
            "brand_score": 2.5,
            "date_gap": 14,
            "promotion_intensity": "high",
            "target_participants": 60
        }"#;
        let req: RecommendRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.title.as_deref(), Some("Hackathon"));
        assert_eq!(req.features.weekday, "Sat");
        assert_eq!(req.target_participants, 60.0);
    }

    #[test]
    fn test_response_carries_request_values() {
        let json = r#"{
            "event_type": "seminar",
            "organizer_type": "department",
            "target_major": "math",
            "target_grade": "1",
            "weekday": "Mon",
            "brand_score": 3.0,
            "date_gap": 3,
            "target_participants": 40
        }"#;
        let req: RecommendRequest = serde_json::from_str(json).unwrap();
        let rec = RewardRecommendation {
            reward: 2500.0,
            expected_attendance: 38.5,
            low: 0.0,
            high: 9600.0,
            loss: 0.2,
            evaluations: 17,
        };
        let resp = RecommendationResponse::new(req, &rec);
        assert_eq!(resp.recommended_reward, 2500.0);
        assert_eq!(resp.expected_participants, 38.5);
        assert_eq!(resp.target_participants, 40.0);
        assert!(resp.title.is_none());

        let out = serde_json::to_value(&resp).unwrap();
        assert!(out.get("title").is_none());
        assert_eq!(out["features"]["target_major"], "math");
    }
}
