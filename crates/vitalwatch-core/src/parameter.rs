//! Physiological parameter kinds and their per-parameter profiles.
//!
//! `VitalParameter` is the closed set of measurements the core knows how to
//! judge. Everything parameter-specific (display label, unit, guidance and
//! clinical risk rules) lives in a `ParameterProfile` registered in a
//! `ProfileTable`, so detection code never branches on parameter names.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Parameter kinds ─────────────────────────────────────────────────────

/// A physiological parameter tracked by subject baselines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalParameter {
    HeartRate,
    #[serde(alias = "blood_pressure")]
    BloodPressureSystolic,
    Glucose,
    OxygenSaturation,
    Temperature,
    RespiratoryRate,
}

impl VitalParameter {
    /// Canonical evaluation order.
    pub const ALL: [VitalParameter; 6] = [
        VitalParameter::HeartRate,
        VitalParameter::BloodPressureSystolic,
        VitalParameter::Glucose,
        VitalParameter::OxygenSaturation,
        VitalParameter::Temperature,
        VitalParameter::RespiratoryRate,
    ];

    /// Wire name used in observation payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HeartRate => "heart_rate",
            Self::BloodPressureSystolic => "blood_pressure_systolic",
            Self::Glucose => "glucose",
            Self::OxygenSaturation => "oxygen_saturation",
            Self::Temperature => "temperature",
            Self::RespiratoryRate => "respiratory_rate",
        }
    }

    /// Resolve a wire name (or a known alias) to a parameter.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "heart_rate" => Some(Self::HeartRate),
            "blood_pressure_systolic" | "blood_pressure" => Some(Self::BloodPressureSystolic),
            "glucose" => Some(Self::Glucose),
            "oxygen_saturation" => Some(Self::OxygenSaturation),
            "temperature" => Some(Self::Temperature),
            "respiratory_rate" => Some(Self::RespiratoryRate),
            _ => None,
        }
    }

    /// The anomaly type reported for this parameter.
    pub fn anomaly_type(&self) -> AnomalyType {
        match self {
            Self::HeartRate => AnomalyType::HeartRate,
            Self::BloodPressureSystolic => AnomalyType::BloodPressure,
            Self::Glucose => AnomalyType::Glucose,
            Self::OxygenSaturation => AnomalyType::OxygenSaturation,
            Self::Temperature => AnomalyType::Temperature,
            Self::RespiratoryRate => AnomalyType::RespiratoryRate,
        }
    }
}

impl std::fmt::Display for VitalParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ── Anomaly types ───────────────────────────────────────────────────────

/// Type tag carried by every `AnomalyResult`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    HeartRate,
    BloodPressure,
    Glucose,
    OxygenSaturation,
    Temperature,
    RespiratoryRate,
    /// Synthetic compound anomaly raised by the correlator.
    MultiParameter,
}

impl AnomalyType {
    /// Human-readable, title-cased name ("Oxygen Saturation").
    pub fn title(&self) -> &'static str {
        match self {
            Self::HeartRate => "Heart Rate",
            Self::BloodPressure => "Blood Pressure",
            Self::Glucose => "Glucose",
            Self::OxygenSaturation => "Oxygen Saturation",
            Self::Temperature => "Temperature",
            Self::RespiratoryRate => "Respiratory Rate",
            Self::MultiParameter => "Multi Parameter",
        }
    }
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::HeartRate => "heart_rate",
            Self::BloodPressure => "blood_pressure",
            Self::Glucose => "glucose",
            Self::OxygenSaturation => "oxygen_saturation",
            Self::Temperature => "temperature",
            Self::RespiratoryRate => "respiratory_rate",
            Self::MultiParameter => "multi_parameter",
        };
        write!(f, "{}", s)
    }
}

// ── Risk rules ──────────────────────────────────────────────────────────

/// Comparison applied by a `RiskRule` to the measured value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Threshold {
    /// Strictly greater than.
    Above(f64),
    /// Greater than or equal to.
    AtLeast(f64),
    /// Strictly less than.
    Below(f64),
}

impl Threshold {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Self::Above(t) => value > t,
            Self::AtLeast(t) => value >= t,
            Self::Below(t) => value < t,
        }
    }
}

/// A fixed clinical rule: when the value crosses `threshold`, tag the result.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskRule {
    pub threshold: Threshold,
    pub tag: String,
}

impl RiskRule {
    pub fn new(threshold: Threshold, tag: impl Into<String>) -> Self {
        Self {
            threshold,
            tag: tag.into(),
        }
    }
}

// ── Profiles ────────────────────────────────────────────────────────────

/// Everything the single-parameter detector needs to describe an anomaly
/// for one parameter.
#[derive(Clone, Debug)]
pub struct ParameterProfile {
    pub parameter: VitalParameter,
    /// Sentence-case label used in descriptions ("Heart rate").
    pub label: String,
    /// Display unit ("bpm", "mmHg", "%").
    pub unit: String,
    /// Decimal places used when formatting values.
    pub precision: usize,
    /// Generic guidance, in display order.
    pub recommendations: Vec<String>,
    /// Clinical tagging rules, evaluated in order.
    pub risk_rules: Vec<RiskRule>,
}

impl ParameterProfile {
    fn build(
        parameter: VitalParameter,
        label: &str,
        unit: &str,
        precision: usize,
        recommendations: &[&str],
        risk_rules: Vec<RiskRule>,
    ) -> Self {
        Self {
            parameter,
            label: label.to_string(),
            unit: unit.to_string(),
            precision,
            recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
            risk_rules,
        }
    }

    /// Format a value with this profile's precision and unit.
    pub fn format_value(&self, value: f64) -> String {
        if self.unit == "%" {
            format!("{:.*}%", self.precision, value)
        } else {
            format!("{:.*} {}", self.precision, value, self.unit)
        }
    }

    /// Tags of every risk rule matched by `value`, in rule order.
    pub fn matching_risks(&self, value: f64) -> Vec<String> {
        self.risk_rules
            .iter()
            .filter(|rule| rule.threshold.matches(value))
            .map(|rule| rule.tag.clone())
            .collect()
    }
}

/// Registry of parameter profiles.
///
/// Starts from the standard table; `register` replaces a parameter's profile.
#[derive(Clone, Debug)]
pub struct ProfileTable {
    profiles: HashMap<VitalParameter, ParameterProfile>,
}

impl ProfileTable {
    /// The built-in clinical profile table.
    pub fn standard() -> Self {
        use Threshold::*;
        use VitalParameter::*;

        let profiles = vec![
            ParameterProfile::build(
                HeartRate,
                "Heart rate",
                "bpm",
                0,
                &[
                    "Monitor heart rate closely",
                    "Rest and avoid strenuous activity",
                    "Contact healthcare provider if symptoms persist",
                ],
                vec![
                    RiskRule::new(Above(120.0), "Tachycardia"),
                    RiskRule::new(Below(50.0), "Bradycardia"),
                ],
            ),
            ParameterProfile::build(
                BloodPressureSystolic,
                "Systolic blood pressure",
                "mmHg",
                0,
                &[
                    "Monitor blood pressure regularly",
                    "Follow prescribed medication schedule",
                    "Reduce sodium intake and stress",
                ],
                vec![
                    RiskRule::new(Above(180.0), "Hypertensive crisis"),
                    RiskRule::new(Below(90.0), "Hypotension"),
                ],
            ),
            ParameterProfile::build(
                Glucose,
                "Glucose level",
                "mg/dL",
                0,
                &[
                    "Monitor blood glucose levels",
                    "Follow diabetic care plan",
                    "Contact healthcare provider for significant changes",
                ],
                vec![
                    RiskRule::new(Below(70.0), "Hypoglycemia"),
                    RiskRule::new(Above(250.0), "Severe hyperglycemia"),
                ],
            ),
            ParameterProfile::build(
                OxygenSaturation,
                "Oxygen saturation",
                "%",
                0,
                &[
                    "Ensure adequate rest",
                    "Monitor breathing patterns",
                    "Seek immediate medical attention if below 90%",
                ],
                vec![RiskRule::new(Below(92.0), "Potential respiratory distress")],
            ),
            ParameterProfile::build(
                Temperature,
                "Temperature",
                "°C",
                1,
                &[
                    "Monitor temperature regularly",
                    "Stay hydrated",
                    "Rest and avoid temperature extremes",
                ],
                vec![
                    RiskRule::new(AtLeast(38.0), "Fever"),
                    RiskRule::new(Below(35.0), "Hypothermia"),
                ],
            ),
            ParameterProfile::build(
                RespiratoryRate,
                "Respiratory rate",
                "breaths/min",
                0,
                &[
                    "Monitor breathing rate",
                    "Ensure adequate rest",
                    "Contact healthcare provider if breathing difficulty persists",
                ],
                vec![
                    RiskRule::new(Above(24.0), "Tachypnea"),
                    RiskRule::new(Below(8.0), "Bradypnea"),
                ],
            ),
        ];

        Self {
            profiles: profiles.into_iter().map(|p| (p.parameter, p)).collect(),
        }
    }

    /// Install or replace the profile for `profile.parameter`.
    pub fn register(&mut self, profile: ParameterProfile) {
        self.profiles.insert(profile.parameter, profile);
    }

    pub fn get(&self, parameter: VitalParameter) -> Option<&ParameterProfile> {
        self.profiles.get(&parameter)
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::standard()
    }
}
