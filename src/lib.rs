//! ChurnForge: exploratory churn analysis of telecom customer tables
//!
//! This library cleans the raw customer table into an analysis-ready dataset
//! and aggregates churn rates, binned rates and feature correlations from it.

pub mod analysis;
pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod report;
pub mod stats;
pub mod viz;

// Re-export public items for easier access
pub use analysis::ChurnAnalysis;
pub use clean::clean;
pub use cli::Args;
pub use config::Config;
pub use data::{load_raw_dataset, write_cleaned_dataset};
pub use dataset::{CustomerRecord, Dataset, Field, RawDataset, RawRecord};
pub use error::{AnalysisError, CleanError};
pub use stats::{binned_churn_rate, churn_rate_by, correlation_matrix, AggregateSummary, CorrelationMatrix};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
