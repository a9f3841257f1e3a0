//! Integration tests for ChurnForge

use churnforge::clean::missing_total_charges;
use churnforge::config::{AnalysisConfig, Config};
use churnforge::report::{self, Findings};
use churnforge::stats::GroupKey;
use churnforge::{
    churn_rate_by, clean, load_raw_dataset, write_cleaned_dataset, ChurnAnalysis, CleanError,
    CustomerRecord, Dataset, Field,
};
use std::io::Write;
use tempfile::NamedTempFile;

const HEADER: &str = "customerID,gender,SeniorCitizen,Partner,Dependents,tenure,PhoneService,MultipleLines,InternetService,OnlineSecurity,OnlineBackup,DeviceProtection,TechSupport,StreamingTV,StreamingMovies,Contract,PaperlessBilling,PaymentMethod,MonthlyCharges,TotalCharges,Churn";

const ROWS: [&str; 11] = [
    "7590-VHVEG,Female,0,Yes,No,1,No,No phone service,DSL,No,Yes,No,No,No,No,Month-to-month,Yes,Electronic check,29.85,29.85,No",
    "5575-GNVDE,Male,0,No,No,34,Yes,No,DSL,Yes,No,Yes,No,No,No,One year,No,Mailed check,56.95,1889.5,No",
    "3668-QPYBK,Male,0,No,No,2,Yes,No,DSL,Yes,Yes,No,No,No,No,Month-to-month,Yes,Mailed check,53.85,108.15,Yes",
    "7795-CFOCW,Male,0,No,No,45,No,No phone service,DSL,Yes,No,Yes,Yes,No,No,One year,No,Bank transfer (automatic),42.3,1840.75,No",
    "9237-HQITU,Female,0,No,No,2,Yes,No,Fiber optic,No,No,No,No,No,No,Month-to-month,Yes,Electronic check,70.7,151.65,Yes",
    "9305-CDSKC,Female,1,No,No,8,Yes,Yes,Fiber optic,No,No,Yes,No,Yes,Yes,Month-to-month,Yes,Electronic check,99.65,820.5,Yes",
    "4472-LVYGI,Female,0,Yes,Yes,0,No,No phone service,DSL,Yes,No,Yes,Yes,Yes,No,Two year,Yes,Bank transfer (automatic),52.55, ,No",
    "6713-OKOMC,Female,1,No,No,10,No,No phone service,DSL,Yes,No,No,No,No,No,Month-to-month,No,Mailed check,29.75,301.9,No",
    "7892-POOKP,Female,0,Yes,No,28,Yes,Yes,Fiber optic,No,No,Yes,Yes,Yes,Yes,Month-to-month,Yes,Electronic check,104.8,3046.05,Yes",
    "1452-KIOVK,Male,0,No,Yes,22,Yes,Yes,Fiber optic,No,Yes,No,No,Yes,No,Month-to-month,Yes,Credit card (automatic),89.1,1949.4,No",
    "6388-TABGU,Male,0,No,Yes,62,Yes,No,No,No internet service,No internet service,No internet service,No internet service,No internet service,No internet service,Two year,No,Bank transfer (automatic),20.15,1250.3,No",
];

/// Create a test CSV file with sample customers
fn create_test_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

fn load_and_clean(path: &std::path::Path) -> Dataset {
    let raw = load_raw_dataset(path).unwrap();
    clean(&raw).unwrap()
}

fn assert_same_customers(a: &Dataset, b: &Dataset) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x.monthly_charges - y.monthly_charges).abs() < 1e-9);
        assert!((x.total_charges - y.total_charges).abs() < 1e-9);
        let without_amounts = |r: &CustomerRecord| CustomerRecord {
            monthly_charges: 0.0,
            total_charges: 0.0,
            ..r.clone()
        };
        assert_eq!(without_amounts(x), without_amounts(y));
    }
}

#[test]
fn test_end_to_end_pipeline() {
    let test_file = create_test_csv(&ROWS);

    // Load and clean
    let raw = load_raw_dataset(test_file.path()).unwrap();
    assert_eq!(raw.len(), 11);
    assert_eq!(missing_total_charges(&raw), 1);

    let dataset = clean(&raw).unwrap();
    assert_eq!(dataset.len(), 11);

    // The blank total of a zero-tenure customer is imputed as 52.55 * 0
    let new_customer = dataset
        .iter()
        .find(|r| r.customer_id == "4472-LVYGI")
        .unwrap();
    assert_eq!(new_customer.total_charges, 0.0);
    assert!(new_customer.has_dependents);
    assert!(!new_customer.is_male);

    // Aggregate
    let analysis = ChurnAnalysis::run(&dataset, &AnalysisConfig::default()).unwrap();
    assert_eq!(analysis.overview.total, 11);
    assert_eq!(analysis.overview.churned, 4);
    assert_eq!(analysis.monthly_charges.total(), 11);
    assert_eq!(analysis.correlation.fields().len(), 10);
    assert_eq!(analysis.correlation.get(Field::Churn, Field::Churn), Some(1.0));

    let by_contract = churn_rate_by(&dataset, Field::Contract).unwrap();
    let monthly = by_contract
        .get(&GroupKey::Category("Month-to-month".to_string()))
        .unwrap();
    assert_eq!(monthly.count, 7);
    assert_eq!(monthly.churned, 4);
    assert_eq!(by_contract.highest_rate().unwrap().key, monthly.key);
    assert_eq!(by_contract.total(), dataset.len());
}

#[test]
fn test_export_writes_flags_and_recleaning_is_idempotent() {
    let test_file = create_test_csv(&ROWS);
    let dataset = load_and_clean(test_file.path());

    let dir = tempfile::tempdir().unwrap();
    let exported = dir.path().join("cleaned.csv");
    write_cleaned_dataset(&dataset, &exported).unwrap();

    let written = std::fs::read_to_string(&exported).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some(HEADER));
    assert!(lines.next().unwrap().starts_with("7590-VHVEG,0,0,1,0,1,0,"));
    assert_eq!(written.lines().count(), 12);

    let recleaned = clean(&dataset.to_raw()).unwrap();
    assert_same_customers(&dataset, &recleaned);
}

#[test]
fn test_unknown_binary_value_aborts_cleaning() {
    let bad_row = ROWS[1].replacen("Male", "Unknown", 1);
    let test_file = create_test_csv(&[ROWS[0], &bad_row]);

    let raw = load_raw_dataset(test_file.path()).unwrap();
    assert_eq!(
        clean(&raw),
        Err(CleanError::Encoding {
            row: 1,
            field: Field::Gender,
            value: "Unknown".to_string(),
        })
    );
}

#[test]
fn test_summary_written_to_output_directory() {
    let test_file = create_test_csv(&ROWS);
    let dataset = load_and_clean(test_file.path());

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.output.directory = dir.path().join("report");
    config.prepare_directories().unwrap();

    let analysis = ChurnAnalysis::run(&dataset, &config.analysis).unwrap();
    let findings = Findings::derive(&analysis, config.analysis.early_tenure_months);
    let summary = report::render_summary(&analysis.overview, &findings, chrono::Local::now());
    report::write_summary(&config.summary_path(), &summary).unwrap();
    write_cleaned_dataset(&dataset, config.processed_data_path()).unwrap();

    let text = std::fs::read_to_string(config.summary_path()).unwrap();
    assert!(text.contains("- Total customers: 11"));
    assert!(text.contains("- Overall churn rate: 36.36%"));
    assert!(text.contains("Contract: highest churn for Month-to-month"));
    assert!(text.contains("InternetService: highest churn for Fiber optic"));
    assert!(config.processed_data_path().exists());
    assert!(config.images_directory().is_dir());
}

#[test]
fn test_constant_column_fails_correlation() {
    let all_female: Vec<String> = ROWS.iter().map(|r| r.replacen(",Male,", ",Female,", 1)).collect();
    let rows: Vec<&str> = all_female.iter().map(String::as_str).collect();
    let test_file = create_test_csv(&rows);
    let dataset = load_and_clean(test_file.path());

    let result = ChurnAnalysis::run(&dataset, &AnalysisConfig::default());
    assert!(matches!(
        result,
        Err(churnforge::AnalysisError::DegenerateFeature {
            field: Field::Gender
        })
    ));
}

#[test]
fn test_header_only_csv_is_rejected_before_aggregation() {
    let test_file = create_test_csv(&[]);
    let dataset = load_and_clean(test_file.path());
    assert!(dataset.is_empty());

    let result = ChurnAnalysis::run(&dataset, &AnalysisConfig::default());
    assert_eq!(
        result.unwrap_err(),
        churnforge::AnalysisError::EmptyDataset
    );
}
