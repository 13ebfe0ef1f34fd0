//! Property tests: severity monotonicity, confidence bounds, baseline
//! stability and history bounds over random inputs.

use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;
use vitalwatch_core::{
    AnomalyEngine, AnomalyHistory, AnomalyId, AnomalyResult, AnomalyType, DetectorConfig,
    NormalRange, Severity, SeverityClassifier, SubjectId, VitalParameter, RULE_CONFIDENCE_CAP,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A valid (min, max) pair; widths may be zero.
fn arb_range() -> impl Strategy<Value = (f64, f64)> {
    (-500.0f64..500.0, 0.0f64..200.0).prop_map(|(min, width)| (min, min + width))
}

fn arb_parameter() -> impl Strategy<Value = VitalParameter> {
    prop_oneof![
        Just(VitalParameter::HeartRate),
        Just(VitalParameter::BloodPressureSystolic),
        Just(VitalParameter::Glucose),
        Just(VitalParameter::OxygenSaturation),
        Just(VitalParameter::Temperature),
        Just(VitalParameter::RespiratoryRate),
    ]
}

/// Plausible physiological values for any parameter.
fn arb_value() -> impl Strategy<Value = f64> {
    0.0f64..400.0
}

fn stub_result() -> Arc<AnomalyResult> {
    Arc::new(AnomalyResult {
        id: AnomalyId::new(),
        anomaly_type: AnomalyType::Glucose,
        severity: Severity::Low,
        confidence: 0.5,
        value: 0.0,
        normal_range: NormalRange::sentinel(),
        timestamp: Utc::now(),
        description: String::new(),
        recommendations: vec![],
        risk_factors: vec![],
    })
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Values inside the range are never flagged.
    #[test]
    fn in_range_values_are_never_anomalous(
        (min, max) in arb_range(),
        t in 0.0f64..=1.0,
    ) {
        let classifier = SeverityClassifier::default();
        let value = min + (max - min) * t;
        prop_assume!(value >= min && value <= max);
        prop_assert!(classifier.classify(value, min, max).is_none());
    }

    /// Further out never means a lower tier.
    #[test]
    fn severity_is_monotone_in_distance(
        (min, max) in arb_range(),
        near in 0.001f64..100.0,
        extra in 0.0f64..100.0,
        above in any::<bool>(),
    ) {
        let classifier = SeverityClassifier::default();
        let far = near + extra;
        let (a, b) = if above {
            (max + near, max + far)
        } else {
            (min - near, min - far)
        };
        let closer = classifier.classify(a, min, max);
        let further = classifier.classify(b, min, max);
        prop_assume!(closer.is_some() && further.is_some());
        let (closer, further) = (closer.unwrap(), further.unwrap());
        prop_assert!(closer.severity <= further.severity);
        prop_assert!(closer.relative_deviation <= further.relative_deviation);
    }

    /// Rule-based confidence stays in [0.5, 0.95] and deviations are finite,
    /// even for collapsed ranges.
    #[test]
    fn confidence_is_bounded(
        center in -500.0f64..500.0,
        width in 0.0f64..50.0,
        offset in -1000.0f64..1000.0,
    ) {
        let classifier = SeverityClassifier::default();
        let (min, max) = (center, center + width);
        if let Some(a) = classifier.classify(center + offset, min, max) {
            prop_assert!(a.relative_deviation.is_finite());
            prop_assert!(a.relative_deviation > 0.0);
            prop_assert!(a.confidence >= 0.5);
            prop_assert!(a.confidence <= RULE_CONFIDENCE_CAP);
        }
    }

    /// Every strictly out-of-range measurement yields exactly one result for
    /// its parameter, and confidence stays within [0, 1].
    #[test]
    fn one_result_per_anomalous_parameter(
        readings in proptest::collection::btree_map(arb_parameter(), arb_value(), 1..6),
    ) {
        let engine = AnomalyEngine::with_defaults().unwrap();
        let defaults = DetectorConfig::default().normal_ranges;

        let named: Vec<(&str, f64)> = readings.iter().map(|(p, v)| (p.name(), *v)).collect();
        let results = engine.process_measurements("prop", named).unwrap();

        let expected: Vec<AnomalyType> = readings
            .iter()
            .filter(|(p, v)| !defaults[*p].contains(**v))
            .map(|(p, _)| p.anomaly_type())
            .collect();

        let singles: Vec<AnomalyType> = results
            .iter()
            .filter(|r| !r.is_multi_parameter())
            .map(|r| r.anomaly_type)
            .collect();
        prop_assert_eq!(&singles, &expected);

        let compound = results.iter().filter(|r| r.is_multi_parameter()).count();
        prop_assert_eq!(compound, usize::from(expected.len() >= 2));

        for r in &results {
            prop_assert!((0.0..=1.0).contains(&r.confidence));
        }
    }

    /// Repeated updates keep min <= max and sample counts exact.
    #[test]
    fn baseline_bounds_never_invert(
        values in proptest::collection::vec(arb_value(), 1..40),
    ) {
        let engine = AnomalyEngine::with_defaults().unwrap();
        for v in &values {
            engine.process_measurements("prop", [("glucose", *v)]).unwrap();
        }
        let baseline = engine.baseline(&SubjectId::parse("prop").unwrap()).unwrap();
        prop_assert_eq!(baseline.sample_count, values.len() as u64);
        for range in baseline.ranges.values() {
            prop_assert!(range.min <= range.max);
        }
    }

    /// Repeating one value converges the learned range onto it.
    #[test]
    fn identical_updates_converge(value in 60.0f64..100.0, repeats in 2usize..30) {
        let engine = AnomalyEngine::with_defaults().unwrap();
        for _ in 0..repeats {
            engine.process_measurements("prop", [("heart_rate", value)]).unwrap();
        }
        let hr = engine
            .baseline(&SubjectId::parse("prop").unwrap())
            .unwrap()
            .range(VitalParameter::HeartRate)
            .unwrap();
        prop_assert!((hr.min - value).abs() < 1e-6);
        prop_assert!((hr.max - value).abs() < 1e-6);
    }

    /// History never exceeds capacity and keeps the newest entries.
    #[test]
    fn history_is_bounded_fifo(capacity in 1usize..20, batches in proptest::collection::vec(1usize..5, 1..30)) {
        let history = AnomalyHistory::new(capacity);
        let subject = SubjectId::parse("prop").unwrap();
        let mut all = Vec::new();
        for size in batches {
            let batch: Vec<_> = (0..size).map(|_| stub_result()).collect();
            all.extend(batch.iter().cloned());
            history.record(&subject, &batch);
            prop_assert!(history.entries(&subject).len() <= capacity);
        }

        let kept = history.entries(&subject);
        let tail = &all[all.len().saturating_sub(capacity)..];
        prop_assert_eq!(kept.len(), tail.len());
        for (k, t) in kept.iter().zip(tail) {
            prop_assert!(Arc::ptr_eq(k, t));
        }
    }
}
