//! Configuration inspection commands

use std::path::Path;

use tabled::Tabled;

use crate::config::AppConfig;
use crate::error::CliResult;
use crate::output::{self, print_success, OutputFormat};

/// Table row for one normal range
#[derive(Debug, Tabled)]
struct RangeRow {
    #[tabled(rename = "PARAMETER")]
    parameter: String,
    #[tabled(rename = "MIN")]
    min: f64,
    #[tabled(rename = "MAX")]
    max: f64,
}

/// Print the effective configuration
pub fn show(config: &AppConfig, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<RangeRow> = config
                .detector
                .normal_ranges
                .iter()
                .map(|(parameter, range)| RangeRow {
                    parameter: parameter.to_string(),
                    min: range.min,
                    max: range.max,
                })
                .collect();
            output::print_output(&config.detector.normal_ranges, rows, format)?;

            let t = &config.detector.thresholds;
            println!("Thresholds:        low {} / medium {} / high {}", t.low, t.medium, t.high);
            println!("Min range width:   {}", config.detector.min_range_width);
            println!("History capacity:  {}", config.detector.history_capacity);
            println!(
                "Features:          multi_parameter={} ml_augmentation={}",
                config.detector.features.multi_parameter, config.detector.features.ml_augmentation
            );
            println!("Log level:         {}", config.logging.level);
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => output::print_single(config, format),
    }
}

/// Validate a configuration file
pub fn check(path: &Path) -> CliResult<()> {
    let display = path.display().to_string();
    let config = AppConfig::load_strict(&display)?;
    print_success(&format!(
        "{} is valid ({} tracked parameters)",
        display,
        config.detector.normal_ranges.len()
    ));
    Ok(())
}
