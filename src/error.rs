//! Typed failures raised by the cleaning and aggregation stages

use crate::dataset::Field;
use thiserror::Error;

/// Reasons the cleaner refuses a raw dataset.
///
/// Any of these aborts the whole `clean` call; no partially cleaned
/// dataset is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CleanError {
    /// A binary field holds a value outside its fixed vocabulary
    #[error("row {row}: {field} value {value:?} is not in its encoding vocabulary")]
    Encoding {
        row: usize,
        field: Field,
        value: String,
    },

    /// A schema-typed numeric field could not be parsed
    #[error("row {row}: {field} value {value:?} is not a valid non-negative number")]
    InvalidNumber {
        row: usize,
        field: Field,
        value: String,
    },

    /// A required field is null
    #[error("row {row}: {field} is missing")]
    MissingValue { row: usize, field: Field },
}

/// Reasons an aggregation over a cleaned dataset cannot be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("{field} is not supported by {operation}")]
    UnsupportedFeature {
        field: Field,
        operation: &'static str,
    },

    #[error("{field} has zero variance, its correlation is undefined")]
    DegenerateFeature { field: Field },

    #[error("bin count must be positive")]
    InvalidBinCount,

    #[error("dataset has no customers to analyze")]
    EmptyDataset,
}
