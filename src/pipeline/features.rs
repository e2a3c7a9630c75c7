//! Household feature extraction and preparation
//!
//! Turns the raw feature table into typed weekly records, then groups them by
//! household with the seasonal multiplier attached to each week.

use std::collections::HashMap;

use polars::prelude::*;

use super::error::{SelectionError, SelectionResult};
use super::params::ColumnMapping;
use super::seasonal::SeasonalCalendar;

/// One household's spend in one week
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdWeekRecord {
    pub household: String,
    pub week: i64,
    pub non_ob_spend: f64,
    pub ob_spend: f64,
    pub fuel_gallons: f64,
    pub gc_spend: f64,
    pub cs_spend: f64,
    pub perk_value: f64,
}

/// A weekly record with its VIP spend multiplier
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRecord {
    pub record: HouseholdWeekRecord,
    pub multiplier: f64,
}

/// All weeks observed for one household
#[derive(Debug, Clone)]
pub struct HouseholdFeatures {
    pub household: String,
    pub records: Vec<WeightedRecord>,
    /// Lowest perk value across the household's records
    pub min_perk_value: f64,
}

impl HouseholdFeatures {
    /// Whether the household may be selected as VIP.
    ///
    /// A household with any week below the threshold is excluded.
    pub fn is_eligible(&self, threshold: f64) -> bool {
        self.min_perk_value >= threshold
    }
}

/// Prepared input for the model builder
#[derive(Debug, Clone, Default)]
pub struct PreparedFeatures {
    /// Households in order of first appearance in the input
    pub households: Vec<HouseholdFeatures>,
    pub record_count: usize,
}

impl PreparedFeatures {
    pub fn household_count(&self) -> usize {
        self.households.len()
    }

    /// Number of households that pass the eligibility filter
    pub fn eligible_count(&self, threshold: f64) -> usize {
        self.households
            .iter()
            .filter(|h| h.is_eligible(threshold))
            .count()
    }
}

/// Read typed records from the feature table.
///
/// # Errors
/// - `MissingColumn` if any mapped column is absent
/// - `ColumnType` if the household column holds floats
/// - `MalformedValue` for nulls, non-integral weeks, or negative/non-finite spend
/// - `EmptyInput` if the table has no rows
pub fn extract_records(
    df: &DataFrame,
    columns: &ColumnMapping,
) -> SelectionResult<Vec<HouseholdWeekRecord>> {
    let available: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    check_columns(&available, columns)?;

    if df.height() == 0 {
        return Err(SelectionError::EmptyInput);
    }

    let households = string_values(df, &columns.household)?;
    let weeks = week_values(df, &columns.week)?;
    let non_ob = spend_values(df, &columns.non_ob_spend)?;
    let ob = spend_values(df, &columns.ob_spend)?;
    let fuel = spend_values(df, &columns.fuel_gallons)?;
    let gc = spend_values(df, &columns.gc_spend)?;
    let cs = spend_values(df, &columns.cs_spend)?;
    let perk = float_values(df, &columns.perk_value)?;

    for (row, value) in perk.iter().enumerate() {
        if !value.is_finite() {
            return Err(malformed(&columns.perk_value, row, "perk value must be finite"));
        }
    }

    let records = households
        .into_iter()
        .enumerate()
        .map(|(i, household)| HouseholdWeekRecord {
            household,
            week: weeks[i],
            non_ob_spend: non_ob[i],
            ob_spend: ob[i],
            fuel_gallons: fuel[i],
            gc_spend: gc[i],
            cs_spend: cs[i],
            perk_value: perk[i],
        })
        .collect();

    Ok(records)
}

/// Fail with `MissingColumn` for the first mapped column not in `available`
pub fn check_columns(available: &[String], columns: &ColumnMapping) -> SelectionResult<()> {
    match columns
        .required()
        .into_iter()
        .find(|name| !available.iter().any(|c| c.as_str() == *name))
    {
        Some(name) => Err(SelectionError::MissingColumn {
            column: name.to_string(),
            available: available.to_vec(),
        }),
        None => Ok(()),
    }
}

/// Group records by household and attach seasonal multipliers
pub fn prepare(records: Vec<HouseholdWeekRecord>, calendar: &SeasonalCalendar) -> PreparedFeatures {
    let record_count = records.len();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut households: Vec<HouseholdFeatures> = Vec::new();

    for record in records {
        let multiplier = calendar.multiplier(record.week);
        let slot = match index.get(&record.household) {
            Some(&i) => i,
            None => {
                index.insert(record.household.clone(), households.len());
                households.push(HouseholdFeatures {
                    household: record.household.clone(),
                    records: Vec::new(),
                    min_perk_value: f64::INFINITY,
                });
                households.len() - 1
            }
        };

        let entry = &mut households[slot];
        entry.min_perk_value = entry.min_perk_value.min(record.perk_value);
        entry.records.push(WeightedRecord { record, multiplier });
    }

    log::debug!(
        "prepared {} households from {} records",
        households.len(),
        record_count
    );

    PreparedFeatures {
        households,
        record_count,
    }
}

fn malformed(column: &str, row: usize, reason: &str) -> SelectionError {
    SelectionError::MalformedValue {
        column: column.to_string(),
        row,
        reason: reason.to_string(),
    }
}

/// Household ids as strings. Float columns are refused: `1001.0` is not an id.
fn string_values(df: &DataFrame, column: &str) -> SelectionResult<Vec<String>> {
    let type_error = || SelectionError::ColumnType {
        column: column.to_string(),
        expected: "string or integer".to_string(),
    };
    let source = df.column(column).map_err(|_| type_error())?;
    if source.dtype().is_float() {
        return Err(type_error());
    }
    let cast = source.cast(&DataType::String).map_err(|_| type_error())?;
    let ca = cast.as_materialized_series().str().map_err(|_| type_error())?;

    ca.iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) => Ok(v.to_string()),
            None => Err(malformed(column, row, "household id is missing")),
        })
        .collect()
}

fn float_values(df: &DataFrame, column: &str) -> SelectionResult<Vec<f64>> {
    let cast = df
        .column(column)
        .and_then(|c| c.cast(&DataType::Float64))
        .map_err(|_| SelectionError::ColumnType {
            column: column.to_string(),
            expected: "Float64".to_string(),
        })?;
    let ca = cast
        .as_materialized_series()
        .f64()
        .map_err(|_| SelectionError::ColumnType {
            column: column.to_string(),
            expected: "Float64".to_string(),
        })?;

    ca.iter()
        .enumerate()
        .map(|(row, value)| value.ok_or_else(|| malformed(column, row, "value is missing or not numeric")))
        .collect()
}

fn spend_values(df: &DataFrame, column: &str) -> SelectionResult<Vec<f64>> {
    let values = float_values(df, column)?;
    for (row, &value) in values.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(malformed(
                column,
                row,
                &format!("spend must be a finite non-negative number, got {}", value),
            ));
        }
    }
    Ok(values)
}

fn week_values(df: &DataFrame, column: &str) -> SelectionResult<Vec<i64>> {
    // Week ids are often stored as floats (3.0); anything fractional is malformed.
    float_values(df, column)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            if value.is_finite() && value.fract() == 0.0 {
                Ok(value as i64)
            } else {
                Err(malformed(
                    column,
                    row,
                    &format!("week id must be a whole number, got {}", value),
                ))
            }
        })
        .collect()
}
