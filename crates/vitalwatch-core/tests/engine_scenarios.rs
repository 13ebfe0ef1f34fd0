//! End-to-end engine scenarios: realistic observation streams for a few
//! subjects, checked through results, history, summaries and exports.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use vitalwatch_core::{
    AnomalyEngine, AnomalyType, DetectorConfig, JsonFileBaseline, NormalRange, Observation,
    RangeDistanceModel, RawObservation, Severity, SubjectId, VitalError, VitalParameter,
};

fn sid(id: &str) -> SubjectId {
    SubjectId::parse(id).unwrap()
}

#[test]
fn tachycardia_and_desaturation_in_one_observation() {
    let engine = AnomalyEngine::with_defaults().unwrap();
    let results = engine
        .process_measurements("ward3-bed7", [("heart_rate", 125.0), ("oxygen_saturation", 89.0)])
        .unwrap();

    assert_eq!(results.len(), 3);

    let hr = &results[0];
    assert_eq!(hr.anomaly_type, AnomalyType::HeartRate);
    // max(65, 25) / 40 = 1.625
    assert_eq!(hr.severity, Severity::Critical);
    assert!(hr.risk_factors.contains(&"Tachycardia".to_string()));

    let spo2 = &results[1];
    assert_eq!(spo2.anomaly_type, AnomalyType::OxygenSaturation);
    assert!(spo2
        .risk_factors
        .contains(&"Potential respiratory distress".to_string()));

    let compound = &results[2];
    assert_eq!(compound.anomaly_type, AnomalyType::MultiParameter);
    assert_eq!(compound.value, 2.0);
    assert_eq!(compound.normal_range, NormalRange::sentinel());
    assert_eq!(compound.severity, Severity::Critical);
    assert!((compound.confidence - (hr.confidence + spo2.confidence) / 2.0).abs() < 1e-9);
    assert_eq!(
        compound.description,
        "Multiple parameter anomalies detected: Heart Rate, Oxygen Saturation"
    );
}

#[test]
fn results_carry_observation_timestamp() {
    let engine = AnomalyEngine::with_defaults().unwrap();
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap();
    let obs = Observation::at("p1", ts, [("glucose", 55.0)]).unwrap();

    let results = engine.process(&obs);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].timestamp, ts);
    assert!(results[0].risk_factors.contains(&"Hypoglycemia".to_string()));
    assert_eq!(engine.baseline(&sid("p1")).unwrap().last_updated, ts);
}

#[test]
fn history_summary_window_uses_result_timestamps() {
    let engine = AnomalyEngine::with_defaults().unwrap();
    let now = Utc::now();

    let old = Observation::at("p1", now - Duration::hours(30), [("temperature", 39.0)]).unwrap();
    let fresh = Observation::at("p1", now - Duration::hours(1), [("respiratory_rate", 30.0)]).unwrap();
    engine.process(&old);
    engine.process(&fresh);

    let day = engine.history_summary(&sid("p1"), 24);
    assert_eq!(day.total_anomalies, 1);
    assert_eq!(day.type_breakdown.get(&AnomalyType::RespiratoryRate), Some(&1));
    assert_eq!(day.type_breakdown.get(&AnomalyType::Temperature), None);

    let two_days = engine.history_summary(&sid("p1"), 48);
    assert_eq!(two_days.total_anomalies, 2);
}

#[test]
fn history_capacity_bounds_each_subject() {
    let config = DetectorConfig {
        history_capacity: 4,
        ..DetectorConfig::default()
    };
    let engine = AnomalyEngine::new(config).unwrap();

    // Alternating extremes keep the baseline moving so every call fires.
    for i in 0..10 {
        let glucose = if i % 2 == 0 { 400.0 } else { 20.0 };
        engine
            .process_measurements("p1", [("glucose", glucose)])
            .unwrap();
    }
    engine
        .process_measurements("p2", [("glucose", 400.0)])
        .unwrap();

    assert_eq!(engine.anomaly_history(&sid("p1")).len(), 4);
    assert_eq!(engine.anomaly_history(&sid("p2")).len(), 1);
}

#[test]
fn custom_normal_ranges_limit_tracked_parameters() {
    let mut config = DetectorConfig::default();
    config.normal_ranges.clear();
    config
        .normal_ranges
        .insert(VitalParameter::HeartRate, NormalRange::new(50.0, 90.0).unwrap());
    let engine = AnomalyEngine::new(config).unwrap();

    let results = engine
        .process_measurements("athlete", [("heart_rate", 95.0), ("glucose", 400.0)])
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].normal_range, NormalRange { min: 50.0, max: 90.0 });
    let baseline = engine.baseline(&sid("athlete")).unwrap();
    assert!(!baseline.tracks(VitalParameter::Glucose));
}

#[test]
fn blood_pressure_alias_is_accepted() {
    let engine = AnomalyEngine::with_defaults().unwrap();
    let results = engine
        .process_measurements("p1", [("blood_pressure", 200.0)])
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].anomaly_type, AnomalyType::BloodPressure);
    assert!(results[0]
        .risk_factors
        .contains(&"Hypertensive crisis".to_string()));
}

#[test]
fn rejected_payloads_never_reach_the_engine() {
    let engine = AnomalyEngine::with_defaults().unwrap();
    let run = |json: &str| -> Result<usize, VitalError> {
        let observation = RawObservation::from_json(json)?.into_observation()?;
        Ok(engine.process(&observation).len())
    };

    let err = run(r#"{"subject_id": "p1", "measurements": {"heart_rate": "high"}}"#).unwrap_err();
    assert!(matches!(err, VitalError::InvalidMeasurement { .. }));
    assert!(run("not json").is_err());
    assert!(run(r#"{"subject_id": "p1", "measurements": {"blood_pressure": 120, "blood_pressure_systolic": 200}}"#).is_err());
    assert!(engine.subjects().is_empty());

    // Unknown fields are forward compatible, whatever their type.
    let flagged = run(r#"{"subject_id": "p1", "measurements": {"glucose": 300, "notes": "post-meal"}}"#).unwrap();
    assert_eq!(flagged, 1);
}

#[test]
fn baselines_survive_restart_through_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baselines.json");

    {
        let engine = AnomalyEngine::with_defaults()
            .unwrap()
            .with_persistence(Arc::new(JsonFileBaseline::new(&path)));
        for hr in [70.0, 72.0, 71.0] {
            engine.process_measurements("p1", [("heart_rate", hr)]).unwrap();
        }
    }

    let engine = AnomalyEngine::with_defaults()
        .unwrap()
        .with_persistence(Arc::new(JsonFileBaseline::new(&path)));
    // Restored lazily on first access.
    engine.process_measurements("p1", [("heart_rate", 71.0)]).unwrap();
    assert_eq!(engine.baseline(&sid("p1")).unwrap().sample_count, 4);
}

#[test]
fn range_distance_model_corroborates_gross_outliers() {
    let config = DetectorConfig::default();
    let model = RangeDistanceModel::new(config.normal_ranges.clone(), config.min_range_width);
    let engine = AnomalyEngine::new(config).unwrap().with_outlier_model(Arc::new(model));

    // Mild: 106 vs (60, 100) -> d = 0.15^2, score well under 0.5.
    let mild = engine.process_measurements("p1", [("heart_rate", 106.0)]).unwrap();
    assert_eq!(mild.len(), 1);
    assert!((mild[0].confidence - 0.95).abs() < 1e-9);
    assert!(!mild[0]
        .risk_factors
        .contains(&"Model-corroborated outlier".to_string()));

    // Gross: 190 vs (60, 100) -> d > 1, score above 0.5.
    let gross = engine.process_measurements("p2", [("heart_rate", 190.0)]).unwrap();
    assert!((gross[0].confidence - 1.0).abs() < 1e-9);
    assert!(gross[0]
        .risk_factors
        .contains(&"Model-corroborated outlier".to_string()));
}
