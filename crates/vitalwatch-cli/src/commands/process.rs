//! Batch processing of JSON-lines observations

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};
use vitalwatch_core::{
    AnomalyEngine, AnomalyResult, HistorySummary, JsonFileBaseline, RangeDistanceModel,
    RawObservation, SubjectId,
};

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::output::{
    self, print_info, print_success, print_warning, AnomalyRow, OutputFormat, SummaryRow,
};

/// Arguments for `vitalwatch process`
#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// JSON-lines observation file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Baseline state file, loaded before and saved after every update
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Print per-subject summaries over the last N hours
    #[arg(long)]
    pub summary_hours: Option<u32>,

    /// Write `<subject>.json` exports into this directory
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Corroborate results with the built-in range-distance outlier model
    #[arg(long)]
    pub outlier_model: bool,
}

/// Anomalies raised by one observation
#[derive(Debug, Serialize)]
pub struct ObservationReport {
    pub subject_id: SubjectId,
    pub timestamp: DateTime<Utc>,
    pub anomalies: Vec<Arc<AnomalyResult>>,
}

/// Everything one `process` run produced
#[derive(Debug, Serialize)]
pub struct ProcessReport {
    pub observations: Vec<ObservationReport>,
    pub processed: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<HistorySummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<PathBuf>,
}

impl ProcessReport {
    pub fn anomaly_count(&self) -> usize {
        self.observations.iter().map(|o| o.anomalies.len()).sum()
    }
}

/// Execute `vitalwatch process`
pub fn execute(args: ProcessArgs, config: &AppConfig, format: OutputFormat) -> CliResult<()> {
    let engine = build_engine(&args, config)?;
    let reader = open_input(&args.input)?;

    let mut observations = Vec::new();
    let mut skipped = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match RawObservation::from_json(&line).and_then(RawObservation::into_observation) {
            Ok(observation) => {
                let anomalies = engine.process(&observation);
                for anomaly in &anomalies {
                    info!(
                        target: "audit",
                        subject = %observation.subject_id(),
                        anomaly_id = %anomaly.id,
                        anomaly_type = %anomaly.anomaly_type,
                        severity = %anomaly.severity,
                        confidence = anomaly.confidence,
                        "anomaly recorded"
                    );
                }
                observations.push(ObservationReport {
                    subject_id: observation.subject_id().clone(),
                    timestamp: observation.timestamp(),
                    anomalies,
                });
            }
            Err(e) => {
                warn!(line = index + 1, error = %e, "skipping invalid observation");
                skipped += 1;
            }
        }
    }

    let summaries = match args.summary_hours {
        Some(hours) => engine
            .subjects()
            .iter()
            .map(|id| engine.history_summary(id, hours))
            .collect(),
        None => Vec::new(),
    };

    let exports = match &args.export_dir {
        Some(dir) => write_exports(&engine, dir)?,
        None => Vec::new(),
    };

    let report = ProcessReport {
        processed: observations.len(),
        observations,
        skipped,
        summaries,
        exports,
    };

    match format {
        OutputFormat::Table => print_tables(&report),
        OutputFormat::Json | OutputFormat::Yaml => output::print_single(&report, format),
    }
}

fn build_engine(args: &ProcessArgs, config: &AppConfig) -> CliResult<AnomalyEngine> {
    let mut engine = AnomalyEngine::new(config.detector.clone())?;

    if args.outlier_model {
        let model = RangeDistanceModel::new(
            config.detector.normal_ranges.clone(),
            config.detector.min_range_width,
        );
        engine = engine.with_outlier_model(Arc::new(model));
    }

    if let Some(path) = &args.state {
        let backend = Arc::new(JsonFileBaseline::new(path));
        engine = engine.with_persistence(backend.clone());
        let restored = engine.restore_baselines(backend.as_ref())?;
        info!(path = %path.display(), restored, "baseline state loaded");
    }

    Ok(engine)
}

fn open_input(input: &str) -> CliResult<Box<dyn BufRead>> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(input)
        .map_err(|e| CliError::InvalidInput(format!("cannot open {}: {}", input, e)))?;
    Ok(Box::new(BufReader::new(file)))
}

fn write_exports(engine: &AnomalyEngine, dir: &Path) -> CliResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for subject in engine.subjects() {
        let path = dir.join(format!("{}.json", subject));
        std::fs::write(&path, engine.export_json(&subject)?)?;
        written.push(path);
    }
    Ok(written)
}

fn print_tables(report: &ProcessReport) -> CliResult<()> {
    let rows: Vec<AnomalyRow> = report
        .observations
        .iter()
        .flat_map(|o| {
            o.anomalies
                .iter()
                .map(move |a| AnomalyRow::new(o.subject_id.as_str(), a))
        })
        .collect();

    if rows.is_empty() {
        print_success(&format!(
            "{} observations processed, no anomalies detected",
            report.processed
        ));
    } else {
        output::print_output(&report.observations, rows, OutputFormat::Table)?;
        print_info(&format!(
            "{} observations processed, {} anomalies detected",
            report.processed,
            report.anomaly_count()
        ));
    }

    if report.skipped > 0 {
        print_warning(&format!("{} invalid observations skipped", report.skipped));
    }

    if !report.summaries.is_empty() {
        let rows: Vec<SummaryRow> = report.summaries.iter().map(SummaryRow::from).collect();
        output::print_output(&report.summaries, rows, OutputFormat::Table)?;
    }

    for path in &report.exports {
        print_success(&format!("exported {}", path.display()));
    }

    Ok(())
}
