//! Configuration for the vitalwatch CLI
//!
//! Layered as: built-in defaults, then an optional file (TOML, YAML or
//! JSON, picked by extension), then `VITALWATCH__*` environment variables,
//! e.g. `VITALWATCH__DETECTOR__HISTORY_CAPACITY=50`.

use serde::{Deserialize, Serialize};
use vitalwatch_core::DetectorConfig;

use crate::error::CliResult;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "VITALWATCH";

/// Main CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Detection engine configuration
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl AppConfig {
    /// Load configuration, tolerating a missing file
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        Self::build(path, false)
    }

    /// Load configuration from a file that must exist, then validate it
    pub fn load_strict(path: &str) -> CliResult<Self> {
        let config = Self::build(Some(path), true)?;
        config.detector.validate()?;
        Ok(config)
    }

    fn build(path: Option<&str>, required: bool) -> CliResult<Self> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(required));
        }

        // Add environment variables with VITALWATCH__ prefix
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use vitalwatch_core::VitalParameter;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.json);
        assert_eq!(config.detector.history_capacity, 100);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.detector.normal_ranges.len(), 6);
        assert!(config.detector.validate().is_ok());
    }

    #[test]
    fn test_load_toml_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[detector]
history_capacity = 25

[detector.thresholds]
low = 0.2
medium = 0.4
high = 0.8

[detector.normal_ranges.heart_rate]
min = 50.0
max = 90.0
"#
        )
        .unwrap();

        let config = AppConfig::load_strict(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.detector.history_capacity, 25);
        assert_eq!(config.detector.thresholds.high, 0.8);
        let hr = config.detector.normal_ranges[&VitalParameter::HeartRate];
        assert_eq!((hr.min, hr.max), (50.0, 90.0));
    }

    #[test]
    fn test_strict_load_rejects_invalid_thresholds() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "detector:\n  thresholds:\n    low: 0.5\n    medium: 0.4\n    high: 0.9").unwrap();
        assert!(AppConfig::load_strict(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_strict_load_requires_file() {
        assert!(AppConfig::load_strict("/nonexistent/vitalwatch.toml").is_err());
    }
}
