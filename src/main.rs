//! vipselect: VIP Household Selection CLI Tool
//!
//! Loads weekly household spend, solves the margin-maximizing VIP selection
//! problem, and writes one VIP flag per household.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;

use vipselect::cli::{confirm_overwrite, Cli, Commands};
use vipselect::pipeline::{
    build_model, check_columns, decisions_to_dataframe, extract_records, get_column_names,
    load_dataset_with_progress, prepare, save_decisions, solve_selection, HighsBackend, MipBackend,
    RunConfig,
};
use vipselect::report::{build_run_report, export_run_report, ReportParams, SelectionSummary};
use vipselect::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_step_time, print_success,
};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::InitConfig { output } => run_init_config(output),
        };
    }

    let input = cli.input().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;

    let config = cli.resolve_config()?;
    config.params.validate()?;
    let columns = &config.columns;
    let params = &config.params;

    let output_path = if cli.dry_run { None } else { cli.output_path() };

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(input, output_path.as_deref(), params);

    // Check the schema before reading any rows
    let available = get_column_names(input)?;
    check_columns(&available, columns)?;

    if let Some(path) = &output_path {
        if path.exists() && !cli.no_confirm && !confirm_overwrite(path)? {
            println!("Cancelled by user.");
            return Ok(());
        }
    }

    // Step 1: Load dataset
    print_step_header(1, "Load Features");
    let step_start = Instant::now();
    let (df, rows, cols, memory_mb) = load_dataset_with_progress(
        input,
        cli.infer_schema_length,
        &[columns.household.as_str()],
    )?;

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);
    print_step_time(step_start.elapsed());

    // Step 2: Feature preparation
    print_step_header(2, "Prepare Households");
    let step_start = Instant::now();
    let records = extract_records(&df, columns)?;
    let record_count = records.len();
    let features = prepare(records, &params.calendar);
    drop(df);

    print_count("household(s)", features.household_count(), None);
    let excluded = features.household_count() - features.eligible_count(params.eligibility_threshold);
    if excluded == 0 {
        print_info("No households fall below the eligibility threshold");
    } else {
        print_count(
            "household(s) excluded from VIP",
            excluded,
            Some(&format!("(perk value <{:.3})", params.eligibility_threshold)),
        );
    }
    print_step_time(step_start.elapsed());

    // Step 3: Build and solve
    print_step_header(3, "Optimize Selection");
    let step_start = Instant::now();
    let model = build_model(&features, params)?;
    let backend = HighsBackend;
    let spinner = create_spinner("Solving selection model...");
    let selection = match solve_selection(&model, &backend) {
        Ok(selection) => {
            finish_with_success(&spinner, "Selection model solved");
            selection
        }
        Err(e) => {
            finish_with_warning(&spinner, "Selection model not solved");
            return Err(e.into());
        }
    };
    println!(
        "      Status: {}  Objective: {}",
        style(selection.status).green().bold(),
        style(format!("{:.4}", selection.objective_value)).yellow()
    );
    print_count("VIP household(s) selected", selection.vip_count(), None);
    print_step_time(step_start.elapsed());

    // Step 4: Save output
    print_step_header(4, "Save Results");
    let step_start = Instant::now();
    match &output_path {
        Some(path) => {
            let spinner = create_spinner("Writing decision table...");
            let mut decisions = decisions_to_dataframe(&selection, &columns.household)?;
            save_decisions(&mut decisions, path)?;
            finish_with_success(&spinner, &format!("Saved to {}", path.display()));
        }
        None => print_info("Dry run: decision table not written"),
    }

    let summary = SelectionSummary::new(record_count, &model, &selection);
    if let Some(report_path) = cli.report_path() {
        let report = build_run_report(
            &summary,
            &ReportParams {
                input_file: input,
                output_file: output_path.as_deref(),
                solver: backend.name(),
                columns,
                params,
            },
        );
        export_run_report(&report, &report_path)?;
        print_success(&format!("Run report saved to {}", report_path.display()));
    }
    print_step_time(step_start.elapsed());

    summary.display();
    print_completion();

    Ok(())
}

/// Write the default config to `output`
fn run_init_config(output: &Path) -> Result<()> {
    RunConfig::default().save(output)?;
    print_success(&format!("Default config written to {}", output.display()));
    Ok(())
}
