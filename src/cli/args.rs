//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::RunConfig;

/// vipselect - Choose VIP households by maximizing projected margin
#[derive(Parser, Debug)]
#[command(name = "vipselect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input feature table (CSV or Parquet), one row per household and week
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output decision table (CSV or Parquet, determined by extension).
    /// Defaults to input directory with '_vip' suffix (e.g., features.csv → features_vip.csv).
    /// An existing file is overwritten.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON config file with column names and model parameters.
    /// Keys that are omitted keep their defaults; see `vipselect init-config`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of VIP households (overrides the config file)
    #[arg(long)]
    pub vip_cap: Option<usize>,

    /// Households whose lowest perk value is below this are never VIP
    /// (overrides the config file)
    #[arg(long, value_parser = validate_threshold)]
    pub eligibility_threshold: Option<f64>,

    /// Run report path (JSON).
    /// Defaults to input directory with '_vip_report.json' suffix.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Solve and report without writing the decision table
    #[arg(long, default_value = "false")]
    pub dry_run: bool,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a config file populated with the default columns and parameters
    InitConfig {
        /// Path of the JSON file to create
        output: PathBuf,
    },
}

impl Cli {
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    /// Get the output path, deriving from input if not explicitly provided.
    /// The derived path will be in the same directory as the input with a '_vip' suffix.
    pub fn output_path(&self) -> Option<PathBuf> {
        let input = self.input.as_ref()?;
        Some(self.output.clone().unwrap_or_else(|| {
            let parent = input.parent().unwrap_or_else(|| std::path::Path::new("."));
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            let extension = input
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("parquet");
            parent.join(format!("{}_vip.{}", stem, extension))
        }))
    }

    /// Get the run report path, deriving from input if not explicitly provided.
    pub fn report_path(&self) -> Option<PathBuf> {
        if let Some(report) = &self.report {
            return Some(report.clone());
        }
        let input = self.input.as_ref()?;
        let parent = input.parent().unwrap_or_else(|| std::path::Path::new("."));
        let stem = input.file_stem().and_then(|s| s.to_str())?;
        Some(parent.join(format!("{}_vip_report.json", stem)))
    }

    /// Load the config file (or defaults) and apply command-line overrides
    pub fn resolve_config(&self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(cap) = self.vip_cap {
            config.params.vip_cap = cap;
        }
        if let Some(threshold) = self.eligibility_threshold {
            config.params.eligibility_threshold = threshold;
        }
        Ok(config)
    }
}

/// Validator for eligibility_threshold parameter
fn validate_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !value.is_finite() {
        Err(format!("eligibility_threshold must be finite, got {}", value))
    } else {
        Ok(value)
    }
}
