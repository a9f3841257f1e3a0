//! ChurnForge: exploratory churn analysis CLI for telecom customer tables
//!
//! This is the main entrypoint that orchestrates loading, cleaning,
//! aggregation, chart rendering and export.

use anyhow::{Context, Result};
use churnforge::clean::missing_total_charges;
use churnforge::report::{self, Findings};
use churnforge::{clean, load_raw_dataset, viz, write_cleaned_dataset, Args, ChurnAnalysis, Config};
use clap::Parser;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::default_toml()?);
        return Ok(());
    }

    init_logging(&args);

    let mut config = Config::resolve(args.config.as_deref())?;
    config.merge_with_args(&args);
    config.validate()?;

    run_full_pipeline(&args, &config)
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Run the full analysis pipeline
fn run_full_pipeline(args: &Args, config: &Config) -> Result<()> {
    println!("=== Telecom Churn Analysis ===");

    let start_time = Instant::now();
    config.prepare_directories()?;

    // Step 1: Load the raw table
    if args.verbose {
        println!("\nStep 1: Loading data");
        println!("  Input file: {}", args.input.display());
    }

    let load_start = Instant::now();
    let raw = load_raw_dataset(&args.input)?;
    println!("✓ Data loaded: {} customers", raw.len());
    if args.verbose {
        println!("  Loading time: {:.2}s", load_start.elapsed().as_secs_f64());
    }
    report::print_dataset_overview(&raw);

    // Step 2: Clean
    let imputed = missing_total_charges(&raw);
    let dataset = clean(&raw).context("Failed to clean customer table")?;
    report::print_cleaning_summary(imputed, &dataset);

    // Step 3: Aggregate
    let analysis_start = Instant::now();
    let analysis = ChurnAnalysis::run(&dataset, &config.analysis)
        .context("Failed to compute churn analysis")?;
    report::print_analysis(&analysis);
    if args.verbose {
        println!(
            "\n  Analysis time: {:.2}s",
            analysis_start.elapsed().as_secs_f64()
        );
    }

    // Step 4: Charts
    let viz_start = Instant::now();
    let charts = viz::generate_charts(
        &dataset,
        &analysis,
        config.analysis.histogram_bins,
        &config.charts,
        &config.images_directory(),
    )
    .context("Failed to render charts")?;
    if !charts.is_empty() {
        println!("\n✓ Charts generated: {}", charts.len());
        if args.verbose {
            println!("  Rendering time: {:.2}s", viz_start.elapsed().as_secs_f64());
        }
    }

    // Step 5: Findings and export
    let findings = Findings::derive(&analysis, config.analysis.early_tenure_months);
    report::print_findings(&findings);

    let data_path = config.processed_data_path();
    write_cleaned_dataset(&dataset, &data_path)?;

    let summary_path = config.summary_path();
    let summary = report::render_summary(&analysis.overview, &findings, chrono::Local::now());
    report::write_summary(&summary_path, &summary)?;

    println!("\n=== Analysis Complete ===");
    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    report::print_generated_files(&data_path, &summary_path, &charts);
    println!("All outputs saved to: {}", config.output_directory().display());

    Ok(())
}
