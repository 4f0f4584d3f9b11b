//! Event records: the features describing an event, the training rows that
//! add observed outcomes, and the per-prediction feature vector.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Names of the categorical attributes, in encoding order.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "event_type",
    "organizer_type",
    "target_major",
    "target_grade",
    "weekday",
];

/// Names of the numeric attributes, in encoding order.
///
/// `reward_amount` and `reward_effective` are not part of [`EventFeatures`];
/// they are attached per prediction through [`FeatureVector`].
pub const NUMERIC_COLUMNS: [&str; 4] = ["brand_score", "date_gap", "reward_amount", "reward_effective"];

/// Training target column.
pub const TARGET_COLUMN: &str = "attended_participants";

/// Every column a training table must carry.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "event_type",
    "organizer_type",
    "target_major",
    "target_grade",
    "weekday",
    "brand_score",
    "date_gap",
    "reward_amount",
    "attended_participants",
    "applied_participants",
];

/// Attributes describing a single event, as supplied by the feature
/// extraction collaborator (a form or a language/vision model).
///
/// Extra keys in the incoming JSON are ignored. Categorical fields that
/// arrive as a list of strings are joined with `", "`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFeatures {
    #[serde(deserialize_with = "string_or_joined_list")]
    pub event_type: String,
    #[serde(deserialize_with = "string_or_joined_list")]
    pub organizer_type: String,
    #[serde(deserialize_with = "string_or_joined_list")]
    pub target_major: String,
    #[serde(deserialize_with = "string_or_joined_list")]
    pub target_grade: String,
    #[serde(deserialize_with = "string_or_joined_list")]
    pub weekday: String,
    /// Organizer brand recognition score (1-5 in the source data)
    pub brand_score: f64,
    /// Days remaining until the event. `7` and `7.0` are both accepted.
    #[serde(deserialize_with = "whole_days")]
    pub date_gap: u32,
}

impl EventFeatures {
    /// Categorical values in [`CATEGORICAL_COLUMNS`] order.
    pub fn categorical_values(&self) -> [&str; 5] {
        [
            self.event_type.as_str(),
            self.organizer_type.as_str(),
            self.target_major.as_str(),
            self.target_grade.as_str(),
            self.weekday.as_str(),
        ]
    }
}

/// One historical event with its observed outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub features: EventFeatures,
    /// Reward offered per participant
    pub reward_amount: f64,
    /// Participants who actually showed up (the regression target)
    pub attended_participants: f64,
    /// Participants who signed up
    pub applied_participants: f64,
}

impl EventRecord {
    /// Share of applicants who attended. Applicants are clipped below at 1.
    pub fn attendance_rate(&self) -> f64 {
        self.attended_participants / self.applied_participants.max(1.0)
    }
}

/// Event attributes plus a candidate reward and its time-decayed value.
///
/// Built per prediction and never stored.
#[derive(Debug, Clone, Copy)]
pub struct FeatureVector<'a> {
    pub features: &'a EventFeatures,
    pub reward_amount: f64,
    pub reward_effective: f64,
}

impl<'a> FeatureVector<'a> {
    pub fn new(features: &'a EventFeatures, reward_amount: f64, reward_effective: f64) -> Self {
        Self {
            features,
            reward_amount,
            reward_effective,
        }
    }

    /// Numeric values in [`NUMERIC_COLUMNS`] order.
    pub fn numeric_values(&self) -> [f64; 4] {
        [
            self.features.brand_score,
            f64::from(self.features.date_gap),
            self.reward_amount,
            self.reward_effective,
        ]
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// Accept either `"x"` or `["x", "y"]`, the latter joined as `"x, y"`.
fn string_or_joined_list<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s,
        StringOrList::Many(items) => items.join(", "),
    })
}

/// Accept a JSON integer or a whole-valued float that fits in `u32`.
fn whole_days<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let days = f64::deserialize(deserializer)?;
    if days >= 0.0 && days.fract() == 0.0 && days <= f64::from(u32::MAX) {
        Ok(days as u32)
    } else {
        Err(D::Error::custom(format!(
            "date_gap must be a whole number of days >= 0, got {days}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_features() -> EventFeatures {
        EventFeatures {
            event_type: "seminar".to_string(),
            organizer_type: "department".to_string(),
            target_major: "computer science".to_string(),
            target_grade: "all".to_string(),
            weekday: "Wed".to_string(),
            brand_score: 3.0,
            date_gap: 7,
        }
    }

    #[test]
    fn test_attendance_rate_clips_applicants() {
        let record = EventRecord {
            features: sample_features(),
            reward_amount: 3000.0,
            attended_participants: 4.0,
            applied_participants: 0.0,
        };
        assert_eq!(record.attendance_rate(), 4.0);

        let record = EventRecord {
            applied_participants: 8.0,
            ..record
        };
        assert!((record.attendance_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_list_valued_categories_are_joined() {
        let json = r#"{
            "title": "AI career talk",
            "event_type": ["seminar", "career"],
            "organizer_type": "department",
            "target_major": "computer science",
            "target_grade": ["3", "4"],
            "weekday": "Wed",
            "brand_score": 4.0,
            "date_gap": 10
        }"#;
        let features: EventFeatures = serde_json::from_str(json).unwrap();
        assert_eq!(features.event_type, "seminar, career");
        assert_eq!(features.target_grade, "3, 4");
        assert_eq!(features.date_gap, 10);
    }

    #[test]
    fn test_date_gap_accepts_whole_floats() {
        let json = |gap: &str| {
            format!(
                r#"{{"event_type": "seminar", "organizer_type": "club", "target_major": "all",
                    "target_grade": "all", "weekday": "Fri", "brand_score": 2.5, "date_gap": {gap}}}"#
            )
        };
        let parse = |gap: &str| serde_json::from_str::<EventFeatures>(&json(gap));

        assert_eq!(parse("7").unwrap().date_gap, 7);
        assert_eq!(parse("7.0").unwrap().date_gap, 7);
        assert_eq!(parse("0").unwrap().date_gap, 0);
        assert!(parse("7.5").is_err());
        assert!(parse("-1").is_err());
        assert!(parse("\"7\"").is_err());
    }

    #[test]
    fn test_numeric_values_order() {
        let features = sample_features();
        let fv = FeatureVector::new(&features, 2000.0, 1500.0);
        assert_eq!(fv.numeric_values(), [3.0, 7.0, 2000.0, 1500.0]);
    }
}
