//! Training Table Integration Tests
//!
//! Synthetic CSV written to disk, loaded back and fitted, the same path the
//! `synthetic-events` and `reward-optimizer train` binaries take.

use std::fs::File;
use std::io::BufWriter;

use reward_optimizer::config::{EngineConfig, ModelConfig};
use reward_optimizer::synthetic::{SyntheticConfig, SyntheticEvents};
use reward_optimizer::{EngineError, RewardEngine, TrainingDataset};

#[test]
fn synthetic_csv_roundtrip_and_fit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.csv");

    let generated = SyntheticEvents::new(SyntheticConfig {
        rows: 80,
        ..SyntheticConfig::default()
    })
    .dataset();
    generated
        .write_csv(BufWriter::new(File::create(&path).unwrap()))
        .unwrap();

    let loaded = TrainingDataset::from_path(&path).unwrap();
    assert_eq!(loaded, generated);
    assert!(loaded.attendance_rates().iter().all(|r| (0.0..=1.0).contains(r)));

    let mut config = EngineConfig::default();
    config.model = ModelConfig {
        n_estimators: 50,
        learning_rate: 0.1,
        min_child_samples: 5,
        ..ModelConfig::default()
    };
    let engine = RewardEngine::new(config);
    let report = engine.fit(loaded.records()).unwrap();
    assert_eq!(report.rows, 80);
}

#[test]
fn missing_file_is_data_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TrainingDataset::from_path(dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, EngineError::DataValidation(_)));
}

#[test]
fn columns_in_any_order_with_extras() {
    let text = "\
reward_amount,applied_participants,attended_participants,notes,weekday,target_grade,\
target_major,organizer_type,event_type,date_gap,brand_score
2000,30,24,\"bring a laptop, please\",Tue,all,engineering,club,workshop,4,3.5
";
    let ds = TrainingDataset::from_csv_str(text).unwrap();
    assert_eq!(ds.len(), 1);
    let r = &ds.records()[0];
    assert_eq!(r.features.event_type, "workshop");
    assert_eq!(r.features.brand_score, 3.5);
    assert_eq!(r.features.date_gap, 4);
    assert_eq!(r.reward_amount, 2000.0);
    assert!((r.attendance_rate() - 0.8).abs() < 1e-12);
}

#[test]
fn fit_on_empty_table_fails_cleanly() {
    let header_only = "event_type,organizer_type,target_major,target_grade,weekday,\
                       brand_score,date_gap,reward_amount,attended_participants,applied_participants\n";
    let ds = TrainingDataset::from_csv_str(header_only).unwrap();
    assert!(ds.is_empty());

    let engine = RewardEngine::default();
    assert!(matches!(
        engine.fit(ds.records()),
        Err(EngineError::DataValidation(_))
    ));
    assert!(!engine.is_fitted());
}
