//! Engine Integration Tests
//!
//! End-to-end runs over synthetic event logs: decay selection, attendance
//! forecasts, reward recommendation and refits while readers are active.
//!
//! Ensemble size is reduced from the production defaults to keep the suite
//! fast; every other setting is the built-in default.

use reward_optimizer::config::{EngineConfig, ModelConfig};
use reward_optimizer::ml_engine::DecayRateSelector;
use reward_optimizer::synthetic::{SyntheticConfig, SyntheticEvents};
use reward_optimizer::{
    EngineError, EventRecord, FoldingPolicy, RecommendRequest, RecommendationResponse,
    RewardEngine, SearchBounds,
};

fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.model = ModelConfig {
        n_estimators: 100,
        learning_rate: 0.1,
        min_child_samples: 10,
        ..ModelConfig::default()
    };
    config
}

fn events(rows: usize, decay_lambda: f64, seed: u64) -> Vec<EventRecord> {
    SyntheticEvents::new(SyntheticConfig {
        rows,
        decay_lambda,
        seed,
        ..SyntheticConfig::default()
    })
    .generate()
}

// ============================================================================
// Decay Selection
// ============================================================================

fn assert_selects_true_decay(model: &ModelConfig, seed: u64) {
    let records = events(300, 0.05, seed);
    let mut config = test_config();
    config.model = model.clone();
    config.selection.decay_candidates = vec![0.0, 0.05];

    let selection = DecayRateSelector::new(&config.model, &config.selection)
        .select(&records)
        .unwrap();

    let no_decay = selection.scores[0];
    let true_decay = selection.scores[1];
    assert_eq!(no_decay.lambda, 0.0);
    assert_eq!(true_decay.policy, FoldingPolicy::KFold(3));
    assert_eq!(
        selection.selected, 0.05,
        "seed {seed}: R² with decay {} should beat R² without {}",
        true_decay.mean_r2, no_decay.mean_r2
    );
}

#[test]
fn selector_recovers_true_decay_rate_across_seeds() {
    let model = test_config().model;
    for seed in [1, 2, 3, 7, 12, 15, 18, 19] {
        assert_selects_true_decay(&model, seed);
    }
}

#[test]
fn selector_recovers_true_decay_rate_with_default_model() {
    assert_selects_true_decay(&ModelConfig::default(), 3);
}

#[test]
fn fit_reports_every_default_candidate() {
    let engine = RewardEngine::new(test_config());
    let report = engine.fit(&events(90, 0.03, 1)).unwrap();

    let lambdas: Vec<f64> = report.selection.scores.iter().map(|s| s.lambda).collect();
    assert_eq!(lambdas, vec![0.0, 0.01, 0.03, 0.05, 0.08]);
    assert!(lambdas.contains(&report.decay_lambda));
    assert_eq!(report.rows, 90);
    assert!(report.mean_attendance_rate > 0.0 && report.mean_attendance_rate <= 1.0);
}

// ============================================================================
// Prediction & Search
// ============================================================================

#[test]
fn predictions_are_non_negative() {
    let engine = RewardEngine::new(test_config());
    let records = events(120, 0.05, 3);
    engine.fit(&records).unwrap();

    for record in records.iter().take(10) {
        for &reward in &[0.0, 50.0, 2500.0, 1e6, -1e6] {
            let p = engine.predict_participants(&record.features, reward).unwrap();
            assert!(p >= 0.0, "reward {reward} gave {p}");
        }
    }
}

#[test]
fn unseen_categories_are_not_errors() {
    let engine = RewardEngine::new(test_config());
    let records = events(80, 0.05, 5);
    engine.fit(&records).unwrap();

    let mut features = records[0].features.clone();
    features.event_type = "film screening".to_string();
    features.weekday = "Holiday".to_string();
    let p = engine.predict_participants(&features, 1000.0).unwrap();
    assert!(p >= 0.0);
}

#[test]
fn recommendation_stays_within_bounds() {
    let engine = RewardEngine::new(test_config());
    let records = events(150, 0.05, 11);
    engine.fit(&records).unwrap();
    let features = &records[0].features;

    let rec = engine
        .find_best_reward(features, 40.0, SearchBounds::default())
        .unwrap();
    let report = engine.snapshot().unwrap().report().clone();
    assert_eq!(rec.low, report.reward_min.max(0.0));
    assert!((rec.high - report.reward_max * 1.2).abs() < 1e-6);
    assert!(rec.reward >= rec.low && rec.reward <= rec.high);
    assert!(rec.expected_attendance >= 0.0);

    let rec = engine
        .find_best_reward(features, 40.0, SearchBounds::new(1000.0, 2000.0))
        .unwrap();
    assert!(rec.reward >= 1000.0 && rec.reward <= 2000.0);

    let rec = engine
        .find_best_reward(features, 40.0, SearchBounds::new(1500.0, 1500.0))
        .unwrap();
    assert_eq!(rec.reward, 1500.0);

    let rec = engine
        .find_best_reward(features, 0.0, SearchBounds::new(0.0, 0.0))
        .unwrap();
    assert_eq!(rec.reward, 0.0);

    assert!(matches!(
        engine.find_best_reward(features, 40.0, SearchBounds::new(3000.0, 100.0)),
        Err(EngineError::InvalidBounds { .. })
    ));
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let records = events(100, 0.05, 13);
    let a = RewardEngine::new(test_config());
    let b = RewardEngine::new(test_config());
    let ra = a.fit(&records).unwrap();
    let rb = b.fit(&records).unwrap();
    assert_eq!(ra.selection, rb.selection);

    let features = &records[4].features;
    let pa = a.predict_participants(features, 1800.0).unwrap();
    let pb = b.predict_participants(features, 1800.0).unwrap();
    assert_eq!(pa.to_bits(), pb.to_bits());

    let xa = a.find_best_reward(features, 35.0, SearchBounds::default()).unwrap();
    let xb = b.find_best_reward(features, 35.0, SearchBounds::default()).unwrap();
    assert_eq!(xa.reward.to_bits(), xb.reward.to_bits());
    assert_eq!(xa.expected_attendance.to_bits(), xb.expected_attendance.to_bits());
}

#[test]
fn request_response_flow() {
    let engine = RewardEngine::new(test_config());
    engine.fit(&events(100, 0.05, 17)).unwrap();

    let request: RecommendRequest = serde_json::from_str(
        r#"{
            "title": "Spring career fair",
            "event_type": "career fair",
            "organizer_type": ["department", "company"],
            "target_major": "all",
            "target_grade": "all",
            "weekday": "Wed",
            "brand_score": 4,
            "date_gap": 6,
            "target_participants": 50,
            "poster_colour": "blue"
        }"#,
    )
    .unwrap();
    assert_eq!(request.features.organizer_type, "department, company");

    let rec = engine
        .find_best_reward(&request.features, request.target_participants, SearchBounds::default())
        .unwrap();
    let response = RecommendationResponse::new(request, &rec);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["target_participants"], 50.0);
    assert_eq!(json["recommended_reward"], rec.reward);
    assert_eq!(json["expected_participants"], rec.expected_attendance);
    assert_eq!(json["features"]["event_type"], "career fair");
}

// ============================================================================
// Model Publication
// ============================================================================

#[test]
fn readers_see_complete_states_during_refit() {
    let engine = RewardEngine::new(test_config());
    let first = events(60, 0.05, 19);
    let second = events(80, 0.0, 23);
    engine.fit(&first).unwrap();
    let features = first[0].features.clone();

    std::thread::scope(|scope| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    for i in 0..50 {
                        let state = engine.snapshot().unwrap();
                        let rows = state.report().rows;
                        assert!(rows == 60 || rows == 80, "torn state with {rows} rows");
                        let p = engine
                            .predict_participants(&features, f64::from(i) * 100.0)
                            .unwrap();
                        assert!(p >= 0.0);
                    }
                })
            })
            .collect();

        engine.fit(&second).unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    });

    assert_eq!(engine.snapshot().unwrap().report().rows, 80);
}

#[test]
fn failed_fit_leaves_model_in_service() {
    let engine = RewardEngine::new(test_config());
    let records = events(60, 0.05, 29);
    engine.fit(&records).unwrap();
    let before = engine.predict_participants(&records[0].features, 900.0).unwrap();

    let mut broken = records.clone();
    broken[3].reward_amount = f64::NAN;
    assert!(matches!(engine.fit(&broken), Err(EngineError::DataValidation(_))));

    let after = engine.predict_participants(&records[0].features, 900.0).unwrap();
    assert_eq!(before.to_bits(), after.to_bits());
}
