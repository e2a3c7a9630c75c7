//! Decision table output

use std::path::Path;

use polars::prelude::*;

use super::error::{SelectionError, SelectionResult};
use super::solver::Selection;

/// Name of the VIP flag column in the output table
pub const VIP_FLAG_COLUMN: &str = "vip_fg";

/// Build the (household id, vip flag) table, one row per household
pub fn decisions_to_dataframe(selection: &Selection, household_column: &str) -> PolarsResult<DataFrame> {
    let ids: Vec<String> = selection
        .decisions
        .iter()
        .map(|d| d.household.clone())
        .collect();
    let flags: Vec<f64> = selection.decisions.iter().map(|d| d.flag()).collect();

    DataFrame::new(vec![
        Column::new(household_column.into(), ids),
        Column::new(VIP_FLAG_COLUMN.into(), flags),
    ])
}

/// Save the decision table (CSV or Parquet based on extension).
///
/// An existing file at `path` is overwritten.
pub fn save_decisions(df: &mut DataFrame, path: &Path) -> SelectionResult<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let write_err = |reason: String| SelectionError::Write {
        path: path.to_path_buf(),
        reason,
    };

    match extension.as_str() {
        "csv" => {
            let mut file = std::fs::File::create(path).map_err(|e| write_err(e.to_string()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .map_err(|e| write_err(e.to_string()))?;
        }
        "parquet" => {
            let file = std::fs::File::create(path).map_err(|e| write_err(e.to_string()))?;
            ParquetWriter::new(file)
                .finish(df)
                .map_err(|e| write_err(e.to_string()))?;
        }
        _ => {
            return Err(write_err(format!(
                "unsupported output format '{}'. Supported formats: csv, parquet",
                extension
            )))
        }
    }

    log::debug!("wrote {} decisions to {}", df.height(), path.display());
    Ok(())
}
