//! Seeded synthetic event log with a known reward decay rate.
//!
//! Attendance is generated as
//!
//! ```text
//! attended = base + type_effect + brand_effect * brand_score
//!          + reward_slope * reward * exp(-decay_lambda * date_gap) + N(0, noise_std)
//! ```
//!
//! clipped at zero and rounded. Applicants are attendance plus a uniform
//! no-show count. The same config always yields the same rows.
//!
//! The defaults make the decayed reward the dominant term (up to 100
//! participants against at most 36 from the other effects) so the decay rate
//! is recoverable from a few hundred rows.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::ml_engine::{effective_reward, TrainingDataset};
use crate::types::{EventFeatures, EventRecord};

const EVENT_TYPES: [(&str, f64); 5] = [
    ("seminar", 0.0),
    ("workshop", 4.0),
    ("competition", 8.0),
    ("career fair", 12.0),
    ("concert", 16.0),
];
const ORGANIZERS: [&str; 4] = ["department", "club", "student council", "company"];
const MAJORS: [&str; 4] = ["all", "engineering", "business", "humanities"];
const GRADES: [&str; 5] = ["all", "1", "2", "3", "4"];
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Generator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub rows: usize,
    /// True decay rate baked into the attendance signal
    pub decay_lambda: f64,
    /// Rewards are drawn from `[0, max_reward]` in steps of 100
    pub max_reward: f64,
    /// Days until the event are drawn from `0..=max_gap`
    pub max_gap: u32,
    pub base_attendance: f64,
    pub brand_effect: f64,
    /// Participants per unit of effective reward
    pub reward_slope: f64,
    pub noise_std: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rows: 300,
            decay_lambda: 0.05,
            max_reward: 5000.0,
            max_gap: 30,
            base_attendance: 10.0,
            brand_effect: 4.0,
            reward_slope: 0.02,
            noise_std: 1.5,
            seed: 42,
        }
    }
}

/// Synthetic event-log generator.
#[derive(Debug, Clone)]
pub struct SyntheticEvents {
    config: SyntheticConfig,
}

impl SyntheticEvents {
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config }
    }

    /// Noise-free expected attendance for `features` at `reward`.
    pub fn expected_attendance(&self, features: &EventFeatures, reward: f64) -> f64 {
        let c = &self.config;
        let type_effect = EVENT_TYPES
            .iter()
            .find(|(name, _)| *name == features.event_type)
            .map_or(0.0, |(_, effect)| *effect);
        let effective = effective_reward(reward, f64::from(features.date_gap), c.decay_lambda);
        (c.base_attendance + type_effect + c.brand_effect * features.brand_score
            + c.reward_slope * effective)
            .max(0.0)
    }

    pub fn generate(&self) -> Vec<EventRecord> {
        let c = &self.config;
        let mut rng = StdRng::seed_from_u64(c.seed);
        // Invalid spreads (negative, NaN) disable the noise term
        let noise = Normal::new(0.0, c.noise_std).ok();
        let reward_steps = (c.max_reward / 100.0).floor().max(0.0) as u32;

        (0..c.rows)
            .map(|_| {
                let features = EventFeatures {
                    event_type: EVENT_TYPES[rng.gen_range(0..EVENT_TYPES.len())].0.to_string(),
                    organizer_type: ORGANIZERS[rng.gen_range(0..ORGANIZERS.len())].to_string(),
                    target_major: MAJORS[rng.gen_range(0..MAJORS.len())].to_string(),
                    target_grade: GRADES[rng.gen_range(0..GRADES.len())].to_string(),
                    weekday: WEEKDAYS[rng.gen_range(0..WEEKDAYS.len())].to_string(),
                    brand_score: f64::from(rng.gen_range(2..=10u32)) / 2.0,
                    date_gap: rng.gen_range(0..=c.max_gap),
                };
                let reward_amount = f64::from(rng.gen_range(0..=reward_steps)) * 100.0;

                let jitter = noise.as_ref().map_or(0.0, |n| n.sample(&mut rng));
                let attended = (self.expected_attendance(&features, reward_amount) + jitter)
                    .max(0.0)
                    .round();
                let no_shows = f64::from(rng.gen_range(0..=20u32));

                EventRecord {
                    features,
                    reward_amount,
                    attended_participants: attended,
                    applied_participants: attended + no_shows,
                }
            })
            .collect()
    }

    pub fn dataset(&self) -> TrainingDataset {
        TrainingDataset::new(self.generate())
    }
}
