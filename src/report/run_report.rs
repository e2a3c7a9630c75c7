//! JSON run report export

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{ColumnMapping, SelectionParams, SolveStatus};

use super::summary::SelectionSummary;

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    /// vipselect version
    pub vipselect_version: String,
    /// Solver backend name
    pub solver: String,
    pub input_file: String,
    /// Decision table path; absent on dry runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
}

/// Outcome figures
#[derive(Serialize)]
pub struct RunResults {
    pub status: SolveStatus,
    pub objective_value: f64,
    pub baseline_value: f64,
    pub lift: f64,
    pub records: usize,
    pub households: usize,
    pub eligible_households: usize,
    pub excluded_households: usize,
    pub vip_count: usize,
}

impl From<&SelectionSummary> for RunResults {
    fn from(summary: &SelectionSummary) -> Self {
        Self {
            status: summary.status,
            objective_value: summary.objective_value,
            baseline_value: summary.baseline_value,
            lift: summary.lift(),
            records: summary.records,
            households: summary.households,
            eligible_households: summary.eligible_households,
            excluded_households: summary.excluded_households(),
            vip_count: summary.vip_count,
        }
    }
}

/// Complete run report
#[derive(Serialize)]
pub struct RunReport<'a> {
    pub metadata: RunMetadata,
    pub columns: &'a ColumnMapping,
    pub params: &'a SelectionParams,
    pub results: RunResults,
}

/// Parameters describing where the run read from and wrote to
pub struct ReportParams<'a> {
    pub input_file: &'a Path,
    pub output_file: Option<&'a Path>,
    pub solver: &'a str,
    pub columns: &'a ColumnMapping,
    pub params: &'a SelectionParams,
}

/// Build the report for a finished run
pub fn build_run_report<'a>(summary: &SelectionSummary, params: &ReportParams<'a>) -> RunReport<'a> {
    RunReport {
        metadata: RunMetadata {
            timestamp: Utc::now().to_rfc3339(),
            vipselect_version: env!("CARGO_PKG_VERSION").to_string(),
            solver: params.solver.to_string(),
            input_file: params.input_file.display().to_string(),
            output_file: params.output_file.map(|p| p.display().to_string()),
        },
        columns: params.columns,
        params: params.params,
        results: RunResults::from(summary),
    }
}

/// Write the run report as pretty-printed JSON
pub fn export_run_report(report: &RunReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write run report: {}", output_path.display()))?;
    Ok(())
}
