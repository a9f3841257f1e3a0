//! Turning the raw customer table into an analysis-ready dataset
//!
//! Cleaning coerces total charges to numbers, imputes the missing ones and
//! encodes the two-valued columns as flags. Rows are never dropped: either
//! every row cleans or the whole call fails.

use crate::dataset::{CustomerRecord, Dataset, Field, RawDataset, RawRecord};
use crate::error::CleanError;
use tracing::{debug, info};

/// Fields encoded to 0/1 during cleaning
pub const BINARY_FIELDS: [Field; 7] = [
    Field::Gender,
    Field::SeniorCitizen,
    Field::Partner,
    Field::Dependents,
    Field::PhoneService,
    Field::PaperlessBilling,
    Field::Churn,
];

/// Clean a raw dataset
///
/// # Arguments
/// * `raw` - Table as loaded from the source; it is only borrowed
///
/// # Returns
/// * A `Dataset` with the same number of rows and no missing total charges
///
/// Missing total charges are imputed as `monthly_charges * tenure_months`.
/// That is only exact when the monthly charge never changed over the tenure,
/// so imputed totals are estimates, not observed values.
pub fn clean(raw: &RawDataset) -> Result<Dataset, CleanError> {
    let mut records = Vec::with_capacity(raw.len());
    let mut imputed = 0usize;

    for (row, raw_record) in raw.records().iter().enumerate() {
        let (record, was_imputed) = clean_record(row, raw_record)?;
        if was_imputed {
            debug!(
                row,
                customer = %record.customer_id,
                total_charges = record.total_charges,
                "Imputed missing total charges"
            );
            imputed += 1;
        }
        records.push(record);
    }

    info!(rows = records.len(), imputed, "Cleaned customer table");
    Ok(Dataset::new(records))
}

/// Count the rows whose total charges will be imputed by `clean`
pub fn missing_total_charges(raw: &RawDataset) -> usize {
    raw.records()
        .iter()
        .filter(|r| parse_total_charges(r.get(Field::TotalCharges)).is_none())
        .count()
}

fn clean_record(row: usize, raw: &RawRecord) -> Result<(CustomerRecord, bool), CleanError> {
    let tenure_months = parse_tenure(row, raw)?;
    let monthly_charges = parse_monthly_charges(row, raw)?;

    let (total_charges, imputed) = match parse_total_charges(raw.get(Field::TotalCharges)) {
        Some(total) => (total, false),
        None => (monthly_charges * f64::from(tenure_months), true),
    };

    let record = CustomerRecord {
        customer_id: text(row, raw, Field::CustomerId)?,
        is_male: binary(row, raw, Field::Gender)?,
        is_senior_citizen: binary(row, raw, Field::SeniorCitizen)?,
        has_partner: binary(row, raw, Field::Partner)?,
        has_dependents: binary(row, raw, Field::Dependents)?,
        tenure_months,
        has_phone_service: binary(row, raw, Field::PhoneService)?,
        multiple_lines: text(row, raw, Field::MultipleLines)?,
        internet_service: text(row, raw, Field::InternetService)?,
        online_security: text(row, raw, Field::OnlineSecurity)?,
        online_backup: text(row, raw, Field::OnlineBackup)?,
        device_protection: text(row, raw, Field::DeviceProtection)?,
        tech_support: text(row, raw, Field::TechSupport)?,
        streaming_tv: text(row, raw, Field::StreamingTv)?,
        streaming_movies: text(row, raw, Field::StreamingMovies)?,
        contract: text(row, raw, Field::Contract)?,
        paperless_billing: binary(row, raw, Field::PaperlessBilling)?,
        payment_method: text(row, raw, Field::PaymentMethod)?,
        monthly_charges,
        total_charges,
        churned: binary(row, raw, Field::Churn)?,
    };

    Ok((record, imputed))
}

/// Map a two-valued field to a flag.
///
/// Every mapped field shares one dictionary: `Yes -> 1, No -> 0,
/// Female -> 0, Male -> 1`. `SeniorCitizen` is stored as `0`/`1` in the
/// source and only accepts those tokens.
pub fn encode_binary(field: Field, value: &str) -> Option<bool> {
    match (field, value) {
        (Field::SeniorCitizen, "1") => Some(true),
        (Field::SeniorCitizen, "0") => Some(false),
        (Field::SeniorCitizen, _) => None,
        (_, "Yes" | "Male") => Some(true),
        (_, "No" | "Female") => Some(false),
        _ => None,
    }
}

/// Coerce a raw total-charges cell; `None` means missing.
///
/// Nulls, the whitespace placeholder, unparseable text and values outside
/// the non-negative finite range all count as missing.
fn parse_total_charges(value: Option<&str>) -> Option<f64> {
    value?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_tenure(row: usize, raw: &RawRecord) -> Result<u32, CleanError> {
    let value = required(row, raw, Field::Tenure)?;
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| CleanError::InvalidNumber {
            row,
            field: Field::Tenure,
            value: value.to_string(),
        })
}

fn parse_monthly_charges(row: usize, raw: &RawRecord) -> Result<f64, CleanError> {
    let value = required(row, raw, Field::MonthlyCharges)?;
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| CleanError::InvalidNumber {
            row,
            field: Field::MonthlyCharges,
            value: value.to_string(),
        })
}

fn binary(row: usize, raw: &RawRecord, field: Field) -> Result<bool, CleanError> {
    let value = required(row, raw, field)?;
    encode_binary(field, value).ok_or_else(|| CleanError::Encoding {
        row,
        field,
        value: value.to_string(),
    })
}

fn text(row: usize, raw: &RawRecord, field: Field) -> Result<String, CleanError> {
    required(row, raw, field).map(str::to_string)
}

fn required(row: usize, raw: &RawRecord, field: Field) -> Result<&str, CleanError> {
    raw.get(field)
        .ok_or(CleanError::MissingValue { row, field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_customer(gender: &str, tenure: &str, monthly: &str, total: &str) -> RawRecord {
        RawRecord::from_pairs(&[
            (Field::CustomerId, "7590-VHVEG"),
            (Field::Gender, gender),
            (Field::SeniorCitizen, "0"),
            (Field::Partner, "Yes"),
            (Field::Dependents, "No"),
            (Field::Tenure, tenure),
            (Field::PhoneService, "No"),
            (Field::MultipleLines, "No phone service"),
            (Field::InternetService, "DSL"),
            (Field::OnlineSecurity, "No"),
            (Field::OnlineBackup, "Yes"),
            (Field::DeviceProtection, "No"),
            (Field::TechSupport, "No"),
            (Field::StreamingTv, "No"),
            (Field::StreamingMovies, "No"),
            (Field::Contract, "Month-to-month"),
            (Field::PaperlessBilling, "Yes"),
            (Field::PaymentMethod, "Electronic check"),
            (Field::MonthlyCharges, monthly),
            (Field::TotalCharges, total),
            (Field::Churn, "No"),
        ])
    }

    #[test]
    fn test_imputes_placeholder_total_charges() {
        let raw = RawDataset::new(vec![raw_customer("Female", "5", "70.0", " ")]);

        let cleaned = clean(&raw).unwrap();
        assert_eq!(cleaned.records()[0].total_charges, 350.0);
    }

    #[test]
    fn test_unparseable_and_null_totals_are_imputed() {
        let mut null_total = raw_customer("Male", "2", "20.5", "");
        null_total.clear(Field::TotalCharges);
        let raw = RawDataset::new(vec![
            raw_customer("Male", "3", "10.0", "n/a"),
            null_total,
            raw_customer("Male", "4", "10.0", "NaN"),
        ]);

        assert_eq!(missing_total_charges(&raw), 3);
        let cleaned = clean(&raw).unwrap();
        let totals: Vec<f64> = cleaned.iter().map(|r| r.total_charges).collect();
        assert_eq!(totals, vec![30.0, 41.0, 40.0]);
    }

    #[test]
    fn test_observed_totals_are_kept() {
        let raw = RawDataset::new(vec![raw_customer("Male", "34", "56.95", "1889.5")]);

        let cleaned = clean(&raw).unwrap();
        assert_eq!(cleaned.records()[0].total_charges, 1889.5);
        assert_eq!(missing_total_charges(&raw), 0);
    }

    #[test]
    fn test_binary_encoding() {
        let raw = RawDataset::new(vec![
            raw_customer("Male", "1", "29.85", "29.85"),
            raw_customer("Female", "1", "29.85", "29.85"),
        ]);

        let cleaned = clean(&raw).unwrap();
        assert!(cleaned.records()[0].is_male);
        assert!(!cleaned.records()[1].is_male);
        assert!(cleaned.records()[0].has_partner);
        assert!(!cleaned.records()[0].has_dependents);
        assert!(!cleaned.records()[0].churned);
    }

    #[test]
    fn test_unknown_gender_rejects_whole_dataset() {
        let raw = RawDataset::new(vec![
            raw_customer("Male", "1", "29.85", "29.85"),
            raw_customer("Unknown", "1", "29.85", "29.85"),
        ]);

        let err = clean(&raw).unwrap_err();
        assert_eq!(
            err,
            CleanError::Encoding {
                row: 1,
                field: Field::Gender,
                value: "Unknown".to_string(),
            }
        );
    }

    #[test]
    fn test_single_binary_dictionary() {
        assert_eq!(encode_binary(Field::Gender, "Yes"), Some(true));
        assert_eq!(encode_binary(Field::Partner, "Male"), Some(true));
        assert_eq!(encode_binary(Field::Churn, "No"), Some(false));
        assert_eq!(encode_binary(Field::Partner, "yes"), None);
        assert_eq!(encode_binary(Field::SeniorCitizen, "1"), Some(true));
        assert_eq!(encode_binary(Field::SeniorCitizen, "Yes"), None);
    }

    #[test]
    fn test_encoded_tokens_rejected_for_mapped_fields() {
        assert_eq!(encode_binary(Field::Partner, "1"), None);
        assert_eq!(encode_binary(Field::Gender, "0"), None);

        let mut record = raw_customer("Male", "1", "29.85", "29.85");
        record.set(Field::Partner, "1".to_string());
        assert_eq!(
            clean(&RawDataset::new(vec![record])),
            Err(CleanError::Encoding {
                row: 0,
                field: Field::Partner,
                value: "1".to_string(),
            })
        );
    }

    #[test]
    fn test_gender_yes_encodes_as_male() {
        let raw = RawDataset::new(vec![raw_customer("Yes", "1", "29.85", "29.85")]);

        assert!(clean(&raw).unwrap().records()[0].is_male);
    }

    #[test]
    fn test_invalid_tenure_is_an_error() {
        let raw = RawDataset::new(vec![raw_customer("Male", "-3", "29.85", "29.85")]);

        assert!(matches!(
            clean(&raw),
            Err(CleanError::InvalidNumber {
                field: Field::Tenure,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_required_field() {
        let mut record = raw_customer("Male", "1", "29.85", "29.85");
        record.clear(Field::Contract);
        let raw = RawDataset::new(vec![record]);

        assert_eq!(
            clean(&raw),
            Err(CleanError::MissingValue {
                row: 0,
                field: Field::Contract,
            })
        );
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let raw = RawDataset::new(vec![
            raw_customer("Male", "5", "70.0", " "),
            raw_customer("Female", "12", "19.95", "239.4"),
        ]);

        let once = clean(&raw).unwrap();
        let twice = clean(&once.to_raw()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.len(), raw.len());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let raw = RawDataset::new(vec![raw_customer("Male", "5", "70.0", " ")]);
        let before = raw.clone();

        clean(&raw).unwrap();
        assert_eq!(raw, before);
    }
}
