//! Error types for the selection pipeline.
//!
//! Every variant maps to one stage of a run: reading the feature table,
//! validating parameters, solving, or writing decisions. Any of them ends the
//! run; no decisions are written after an error.

use std::path::PathBuf;

use thiserror::Error;

use super::solver::SolveStatus;

/// Errors that can occur while selecting VIP households.
#[derive(Error, Debug)]
pub enum SelectionError {
    /// A required input column is absent from the feature table.
    #[error("Required column '{column}' not found. Available columns: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// A required column is present but a value in it cannot be used.
    #[error("Column '{column}' row {row}: {reason}")]
    MalformedValue {
        column: String,
        row: usize,
        reason: String,
    },

    /// A required column exists but has a type that cannot be read.
    #[error("Column '{column}' cannot be read as {expected}")]
    ColumnType { column: String, expected: String },

    /// The feature table has no rows.
    #[error("Input contains no household records")]
    EmptyInput,

    /// A tunable parameter is out of range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The solver finished without an optimal assignment.
    #[error("Solver did not reach an optimal solution (status: {status})")]
    SolverFailed { status: SolveStatus },

    /// A decision variable came back fractional.
    #[error("Household '{household}' has non-integral decision value {value}")]
    NonIntegral { household: String, value: f64 },

    /// A household came back both VIP and non-VIP, or neither.
    #[error("Household '{household}' is not exactly one of VIP / non-VIP")]
    InconsistentAssignment { household: String },

    /// The decision table could not be written.
    #[error("Failed to write decisions to {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

pub type SelectionResult<T> = Result<T, SelectionError>;
