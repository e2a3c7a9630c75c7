//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

use vipselect::pipeline::{
    build_model, extract_records, prepare, solve_selection, ColumnMapping, HighsBackend, Selection,
    SelectionModel, SelectionParams,
};

/// Create a small feature table with known characteristics
///
/// - `h1`: promotion-week heavy spender, VIP is clearly profitable
/// - `h2`: spends in dampened weeks only, VIP loses margin
/// - `h3`: profitable as VIP but one week has perk value below 0.05
/// - `h4`: moderate promotion-week spender
pub fn create_feature_dataframe() -> DataFrame {
    df! {
        "hshld_no" => ["h1", "h1", "h2", "h3", "h3", "h4"],
        "week_id" => [3.0f64, 7.0, 4.0, 3.0, 5.0, 7.0],
        "non_ob_spend" => [200.0f64, 150.0, 80.0, 300.0, 20.0, 60.0],
        "ob_spend" => [10.0f64, 0.0, 5.0, 0.0, 0.0, 0.0],
        "fuel_gallons" => [20.0f64, 10.0, 30.0, 0.0, 0.0, 5.0],
        "gc_spend" => [40.0f64, 30.0, 10.0, 0.0, 0.0, 0.0],
        "cs_spend" => [5.0f64, 5.0, 0.0, 0.0, 0.0, 2.0],
        "perk_value" => [0.40f64, 0.35, 0.60, 0.30, 0.02, 0.20],
    }
    .unwrap()
}

/// Feature table with a single household in a single week
pub fn create_single_household_dataframe(week: f64, non_ob_spend: f64, perk_value: f64) -> DataFrame {
    df! {
        "hshld_no" => ["solo"],
        "week_id" => [week],
        "non_ob_spend" => [non_ob_spend],
        "ob_spend" => [0.0f64],
        "fuel_gallons" => [0.0f64],
        "gc_spend" => [0.0f64],
        "cs_spend" => [0.0f64],
        "perk_value" => [perk_value],
    }
    .unwrap()
}

/// Random feature table: `households` households over weeks 1..=9
pub fn create_random_feature_dataframe(households: usize, seed: u64) -> DataFrame {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    let mut rng = StdRng::seed_from_u64(seed);

    let mut ids = Vec::new();
    let mut weeks = Vec::new();
    let mut non_ob = Vec::new();
    let mut ob = Vec::new();
    let mut fuel = Vec::new();
    let mut gc = Vec::new();
    let mut cs = Vec::new();
    let mut perk = Vec::new();

    for h in 0..households {
        let household_perk: f64 = rng.gen_range(0.0..0.5);
        for week in 1..=9i64 {
            if rng.gen_bool(0.3) {
                continue;
            }
            ids.push(format!("hh{:04}", h));
            weeks.push(week);
            non_ob.push(rng.gen_range(0.0..200.0));
            ob.push(rng.gen_range(0.0..50.0));
            fuel.push(rng.gen_range(0.0..40.0));
            gc.push(rng.gen_range(0.0..100.0));
            cs.push(rng.gen_range(0.0..30.0));
            perk.push(household_perk);
        }
    }

    DataFrame::new(vec![
        Column::new("hshld_no".into(), ids),
        Column::new("week_id".into(), weeks),
        Column::new("non_ob_spend".into(), non_ob),
        Column::new("ob_spend".into(), ob),
        Column::new("fuel_gallons".into(), fuel),
        Column::new("gc_spend".into(), gc),
        Column::new("cs_spend".into(), cs),
        Column::new("perk_value".into(), perk),
    ])
    .unwrap()
}

/// Run the full in-memory pipeline with HiGHS
pub fn solve_frame(df: &DataFrame, params: &SelectionParams) -> (SelectionModel, Selection) {
    let records = extract_records(df, &ColumnMapping::default()).unwrap();
    let features = prepare(records, &params.calendar);
    let model = build_model(&features, params).unwrap();
    let selection = solve_selection(&model, &HighsBackend).unwrap();
    (model, selection)
}

/// Best objective by ranking eligible households on VIP lift and taking the
/// top `cap` positive ones
pub fn greedy_optimum(model: &SelectionModel) -> f64 {
    let mut lifts: Vec<f64> = model
        .households()
        .iter()
        .filter(|h| h.eligible)
        .map(|h| h.margin.lift())
        .filter(|&lift| lift > 0.0)
        .collect();
    lifts.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    model.baseline_value() + lifts.into_iter().take(model.vip_cap()).sum::<f64>()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("features.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("features.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}
