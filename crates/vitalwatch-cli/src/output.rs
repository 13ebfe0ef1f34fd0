//! Output formatting utilities

use colored::*;
use serde::Serialize;
use tabled::{Table, Tabled};
use vitalwatch_core::{AnomalyResult, HistorySummary, Severity};

use crate::error::CliResult;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print rows as a table, or the serializable document in JSON/YAML
pub fn print_output<T: Serialize, R: Tabled>(document: &T, rows: Vec<R>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(rows));
            }
        }
        OutputFormat::Json | OutputFormat::Yaml => print_single(document, format)?,
    }
    Ok(())
}

/// Print a single item in the specified format
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(data)?);
        }
    }
    Ok(())
}

/// Table row for one anomaly
#[derive(Debug, Tabled)]
pub struct AnomalyRow {
    #[tabled(rename = "SUBJECT")]
    pub subject: String,
    #[tabled(rename = "TIME")]
    pub time: String,
    #[tabled(rename = "TYPE")]
    pub anomaly_type: String,
    #[tabled(rename = "SEVERITY")]
    pub severity: String,
    #[tabled(rename = "CONFIDENCE")]
    pub confidence: String,
    #[tabled(rename = "DESCRIPTION")]
    pub description: String,
}

impl AnomalyRow {
    pub fn new(subject: &str, result: &AnomalyResult) -> Self {
        Self {
            subject: subject.to_string(),
            time: result.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            anomaly_type: result.anomaly_type.to_string(),
            severity: colorize_severity(result.severity),
            confidence: format!("{:.2}", result.confidence),
            description: result.description.clone(),
        }
    }
}

/// Table row for a subject's history summary
#[derive(Debug, Tabled)]
pub struct SummaryRow {
    #[tabled(rename = "SUBJECT")]
    pub subject: String,
    #[tabled(rename = "TOTAL")]
    pub total: usize,
    #[tabled(rename = "CRITICAL")]
    pub critical: usize,
    #[tabled(rename = "HIGH")]
    pub high: usize,
    #[tabled(rename = "MEDIUM")]
    pub medium: usize,
    #[tabled(rename = "LOW")]
    pub low: usize,
    #[tabled(rename = "AVG CONFIDENCE")]
    pub average_confidence: String,
}

impl From<&HistorySummary> for SummaryRow {
    fn from(summary: &HistorySummary) -> Self {
        Self {
            subject: summary.subject_id.to_string(),
            total: summary.total_anomalies,
            critical: summary.count(Severity::Critical),
            high: summary.count(Severity::High),
            medium: summary.count(Severity::Medium),
            low: summary.count(Severity::Low),
            average_confidence: format!("{:.2}", summary.average_confidence),
        }
    }
}

/// Colorize a severity tier
pub fn colorize_severity(severity: Severity) -> String {
    let label = severity.to_string().to_uppercase();
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::High => label.red().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::Low => label.normal().to_string(),
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        let format = OutputFormat::default();
        assert!(matches!(format, OutputFormat::Table));
    }

    #[test]
    fn test_severity_label_is_uppercase() {
        colored::control::set_override(false);
        assert_eq!(colorize_severity(Severity::Critical), "CRITICAL");
        assert_eq!(colorize_severity(Severity::Low), "LOW");
    }
}
