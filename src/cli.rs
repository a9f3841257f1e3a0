//! Command-line interface definitions and argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Exploratory churn analysis of a telecom customer table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "WA_Fn-UseC_-Telco-Customer-Churn.csv")]
    pub input: PathBuf,

    /// Path to a TOML config file (defaults to ./churnforge.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the cleaned data and the text summary
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for chart images (defaults to <output-dir>/images)
    #[arg(long)]
    pub images_dir: Option<PathBuf>,

    /// Number of equal-width bins for the monthly-charges churn curve
    #[arg(long)]
    pub bins: Option<usize>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Print a default config file to stdout and exit
    #[arg(long)]
    pub print_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Enable verbose output (debug logging)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Effective log filter, `--verbose` wins over `--log-level`
    pub fn log_filter(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}
