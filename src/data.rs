//! CSV loading and export of the customer table using Polars

use crate::dataset::{CustomerRecord, Dataset, Field, FieldKind, FieldValue, RawDataset, RawRecord};
use anyhow::Context;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Load the raw customer table from a CSV file
///
/// # Arguments
/// * `file_path` - Path to the CSV file with the customer churn columns
///
/// # Returns
/// * `RawDataset` with every cell kept as text; null cells stay absent
pub fn load_raw_dataset(file_path: impl AsRef<Path>) -> crate::Result<RawDataset> {
    let file_path = file_path.as_ref();

    // Schema inference is disabled so every column comes back as text and
    // placeholders such as " " in TotalCharges survive the read
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))
        .with_context(|| format!("Failed to open CSV file: {}", file_path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse CSV file: {}", file_path.display()))?;

    debug!(shape = ?df.shape(), "Read CSV into DataFrame");
    let raw = dataframe_to_raw(&df)?;
    info!(rows = raw.len(), path = %file_path.display(), "Loaded raw customer table");

    Ok(raw)
}

/// Convert a text-typed DataFrame into raw records, requiring every known column
fn dataframe_to_raw(df: &DataFrame) -> crate::Result<RawDataset> {
    let mut records = vec![RawRecord::new(); df.height()];

    for field in Field::ALL {
        let column = df
            .column(field.column_name())
            .with_context(|| format!("Missing column: {}", field.column_name()))?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let values = column.str()?;

        for (record, value) in records.iter_mut().zip(values.into_iter()) {
            if let Some(value) = value {
                record.set(field, value);
            }
        }
    }

    Ok(RawDataset::new(records))
}

/// Write the cleaned dataset to CSV
///
/// Columns keep their source names and order; binary fields are written as
/// 0/1 integers.
pub fn write_cleaned_dataset(dataset: &Dataset, output_path: impl AsRef<Path>) -> crate::Result<()> {
    let output_path = output_path.as_ref();
    let mut df = dataset_to_dataframe(dataset)?;

    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!(rows = dataset.len(), path = %output_path.display(), "Wrote cleaned dataset");
    Ok(())
}

fn dataset_to_dataframe(dataset: &Dataset) -> crate::Result<DataFrame> {
    let records = dataset.records();
    let columns: Vec<Column> = Field::ALL
        .iter()
        .map(|&field| column_for(field, records))
        .collect();

    Ok(DataFrame::new(columns)?)
}

fn column_for(field: Field, records: &[CustomerRecord]) -> Column {
    let name = PlSmallStr::from_static(field.column_name());

    let series = match field.kind() {
        FieldKind::Binary => {
            let values: Vec<i32> = records
                .iter()
                .map(|r| match r.value(field) {
                    FieldValue::Flag(flag) => i32::from(flag),
                    _ => 0,
                })
                .collect();
            Series::new(name, values)
        }
        FieldKind::Count => {
            let values: Vec<u32> = records.iter().map(|r| r.tenure_months).collect();
            Series::new(name, values)
        }
        FieldKind::Amount => {
            let values: Vec<f64> = records
                .iter()
                .map(|r| r.numeric(field).unwrap_or(f64::NAN))
                .collect();
            Series::new(name, values)
        }
        FieldKind::Identifier | FieldKind::Category => {
            let values: Vec<&str> = records
                .iter()
                .map(|r| match r.value(field) {
                    FieldValue::Text(text) => text,
                    _ => "",
                })
                .collect();
            Series::new(name, values)
        }
    };

    series.into()
}
