//! Customer table schema, raw and cleaned records

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// How a column is represented once the table has been cleaned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Opaque customer identity
    Identifier,
    /// Two-valued column encoded as 0/1
    Binary,
    /// Non-negative integer (tenure in months)
    Count,
    /// Non-negative monetary amount
    Amount,
    /// Multi-valued enumerated string
    Category,
}

impl FieldKind {
    /// Whether values of this kind can enter a correlation or a binning
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Binary | FieldKind::Count | FieldKind::Amount)
    }
}

/// Columns of the customer churn table, in source order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    CustomerId,
    Gender,
    SeniorCitizen,
    Partner,
    Dependents,
    Tenure,
    PhoneService,
    MultipleLines,
    InternetService,
    OnlineSecurity,
    OnlineBackup,
    DeviceProtection,
    TechSupport,
    StreamingTv,
    StreamingMovies,
    Contract,
    PaperlessBilling,
    PaymentMethod,
    MonthlyCharges,
    TotalCharges,
    Churn,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::CustomerId,
        Field::Gender,
        Field::SeniorCitizen,
        Field::Partner,
        Field::Dependents,
        Field::Tenure,
        Field::PhoneService,
        Field::MultipleLines,
        Field::InternetService,
        Field::OnlineSecurity,
        Field::OnlineBackup,
        Field::DeviceProtection,
        Field::TechSupport,
        Field::StreamingTv,
        Field::StreamingMovies,
        Field::Contract,
        Field::PaperlessBilling,
        Field::PaymentMethod,
        Field::MonthlyCharges,
        Field::TotalCharges,
        Field::Churn,
    ];

    /// Header used for this field in CSV input and output
    pub fn column_name(self) -> &'static str {
        match self {
            Field::CustomerId => "customerID",
            Field::Gender => "gender",
            Field::SeniorCitizen => "SeniorCitizen",
            Field::Partner => "Partner",
            Field::Dependents => "Dependents",
            Field::Tenure => "tenure",
            Field::PhoneService => "PhoneService",
            Field::MultipleLines => "MultipleLines",
            Field::InternetService => "InternetService",
            Field::OnlineSecurity => "OnlineSecurity",
            Field::OnlineBackup => "OnlineBackup",
            Field::DeviceProtection => "DeviceProtection",
            Field::TechSupport => "TechSupport",
            Field::StreamingTv => "StreamingTV",
            Field::StreamingMovies => "StreamingMovies",
            Field::Contract => "Contract",
            Field::PaperlessBilling => "PaperlessBilling",
            Field::PaymentMethod => "PaymentMethod",
            Field::MonthlyCharges => "MonthlyCharges",
            Field::TotalCharges => "TotalCharges",
            Field::Churn => "Churn",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::CustomerId => FieldKind::Identifier,
            Field::Gender
            | Field::SeniorCitizen
            | Field::Partner
            | Field::Dependents
            | Field::PhoneService
            | Field::PaperlessBilling
            | Field::Churn => FieldKind::Binary,
            Field::Tenure => FieldKind::Count,
            Field::MonthlyCharges | Field::TotalCharges => FieldKind::Amount,
            Field::MultipleLines
            | Field::InternetService
            | Field::OnlineSecurity
            | Field::OnlineBackup
            | Field::DeviceProtection
            | Field::TechSupport
            | Field::StreamingTv
            | Field::StreamingMovies
            | Field::Contract
            | Field::PaymentMethod => FieldKind::Category,
        }
    }

    /// Display label of a binary field's value
    pub fn flag_label(self, flag: bool) -> &'static str {
        match (self, flag) {
            (Field::Gender, true) => "Male",
            (Field::Gender, false) => "Female",
            (_, true) => "Yes",
            (_, false) => "No",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Field {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.column_name() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown column: {}", s))
    }
}

/// Borrowed view of one cell of a cleaned record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Flag(bool),
    Count(u32),
    Amount(f64),
}

impl FieldValue<'_> {
    /// Numeric reading of the cell; flags read as 0.0/1.0
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Text(_) => None,
            FieldValue::Flag(flag) => Some(if flag { 1.0 } else { 0.0 }),
            FieldValue::Count(count) => Some(f64::from(count)),
            FieldValue::Amount(amount) => Some(amount),
        }
    }
}

/// One row exactly as read from the source, before any cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    values: Vec<Option<String>>,
}

impl Default for RawRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl RawRecord {
    pub fn new() -> Self {
        Self {
            values: vec![None; Field::ALL.len()],
        }
    }

    /// Build a record from `(field, value)` pairs; unlisted fields stay null
    pub fn from_pairs<S: AsRef<str>>(pairs: &[(Field, S)]) -> Self {
        let mut record = Self::new();
        for (field, value) in pairs {
            record.set(*field, value.as_ref());
        }
        record
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(field.index()).and_then(|v| v.as_deref())
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field.index()] = Some(value.into());
    }

    pub fn clear(&mut self, field: Field) {
        if let Some(slot) = self.values.get_mut(field.index()) {
            *slot = None;
        }
    }
}

/// The uncleaned table. Kept around for reference only; analysis never reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    records: Vec<RawRecord>,
}

impl RawDataset {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.records.len(), Field::ALL.len())
    }

    /// Number of distinct non-null values per column, in column order
    pub fn unique_counts(&self) -> Vec<(Field, usize)> {
        Field::ALL
            .iter()
            .map(|&field| {
                let distinct: HashSet<&str> =
                    self.records.iter().filter_map(|r| r.get(field)).collect();
                (field, distinct.len())
            })
            .collect()
    }

    /// Rows whose total charges hold the whitespace-only placeholder
    pub fn placeholder_total_charges(&self) -> usize {
        self.records
            .iter()
            .filter_map(|r| r.get(Field::TotalCharges))
            .filter(|v| !v.is_empty() && v.trim().is_empty())
            .count()
    }
}

/// One telecom subscriber after cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub is_male: bool,
    pub is_senior_citizen: bool,
    pub has_partner: bool,
    pub has_dependents: bool,
    pub tenure_months: u32,
    pub has_phone_service: bool,
    pub multiple_lines: String,
    pub internet_service: String,
    pub online_security: String,
    pub online_backup: String,
    pub device_protection: String,
    pub tech_support: String,
    pub streaming_tv: String,
    pub streaming_movies: String,
    pub contract: String,
    pub paperless_billing: bool,
    pub payment_method: String,
    pub monthly_charges: f64,
    pub total_charges: f64,
    pub churned: bool,
}

impl CustomerRecord {
    pub fn value(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::CustomerId => FieldValue::Text(&self.customer_id),
            Field::Gender => FieldValue::Flag(self.is_male),
            Field::SeniorCitizen => FieldValue::Flag(self.is_senior_citizen),
            Field::Partner => FieldValue::Flag(self.has_partner),
            Field::Dependents => FieldValue::Flag(self.has_dependents),
            Field::Tenure => FieldValue::Count(self.tenure_months),
            Field::PhoneService => FieldValue::Flag(self.has_phone_service),
            Field::MultipleLines => FieldValue::Text(&self.multiple_lines),
            Field::InternetService => FieldValue::Text(&self.internet_service),
            Field::OnlineSecurity => FieldValue::Text(&self.online_security),
            Field::OnlineBackup => FieldValue::Text(&self.online_backup),
            Field::DeviceProtection => FieldValue::Text(&self.device_protection),
            Field::TechSupport => FieldValue::Text(&self.tech_support),
            Field::StreamingTv => FieldValue::Text(&self.streaming_tv),
            Field::StreamingMovies => FieldValue::Text(&self.streaming_movies),
            Field::Contract => FieldValue::Text(&self.contract),
            Field::PaperlessBilling => FieldValue::Flag(self.paperless_billing),
            Field::PaymentMethod => FieldValue::Text(&self.payment_method),
            Field::MonthlyCharges => FieldValue::Amount(self.monthly_charges),
            Field::TotalCharges => FieldValue::Amount(self.total_charges),
            Field::Churn => FieldValue::Flag(self.churned),
        }
    }

    pub fn numeric(&self, field: Field) -> Option<f64> {
        self.value(field).as_f64()
    }

    /// Textual form in the source vocabulary: flags as their labels
    /// (`SeniorCitizen` as `0`/`1`), numbers in shortest round-trip form
    pub fn to_raw(&self) -> RawRecord {
        let mut raw = RawRecord::new();
        for field in Field::ALL {
            let text = match self.value(field) {
                FieldValue::Text(text) => text.to_string(),
                FieldValue::Flag(flag) if field == Field::SeniorCitizen => {
                    u8::from(flag).to_string()
                }
                FieldValue::Flag(flag) => field.flag_label(flag).to_string(),
                FieldValue::Count(count) => count.to_string(),
                FieldValue::Amount(amount) => amount.to_string(),
            };
            raw.set(field, text);
        }
        raw
    }
}

/// Analysis-ready table, read-only once built
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<CustomerRecord>,
}

impl Dataset {
    pub fn new(records: Vec<CustomerRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CustomerRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of a numeric field in record order, `None` for text fields
    pub fn numeric_column(&self, field: Field) -> Option<Vec<f64>> {
        if !field.kind().is_numeric() {
            return None;
        }
        self.records.iter().map(|r| r.numeric(field)).collect()
    }

    /// Re-express the cleaned table in raw form, ready to clean again
    pub fn to_raw(&self) -> RawDataset {
        RawDataset::new(self.records.iter().map(CustomerRecord::to_raw).collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a CustomerRecord;
    type IntoIter = std::slice::Iter<'a, CustomerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Baseline customer used by unit tests across the crate
#[cfg(test)]
pub(crate) fn sample_customer() -> CustomerRecord {
    CustomerRecord {
        customer_id: "5575-GNVDE".to_string(),
        is_male: true,
        is_senior_citizen: false,
        has_partner: false,
        has_dependents: false,
        tenure_months: 34,
        has_phone_service: true,
        multiple_lines: "No".to_string(),
        internet_service: "DSL".to_string(),
        online_security: "Yes".to_string(),
        online_backup: "No".to_string(),
        device_protection: "Yes".to_string(),
        tech_support: "No".to_string(),
        streaming_tv: "No".to_string(),
        streaming_movies: "No".to_string(),
        contract: "One year".to_string(),
        paperless_billing: false,
        payment_method: "Mailed check".to_string(),
        monthly_charges: 56.95,
        total_charges: 1889.5,
        churned: false,
    }
}

/// Six customers where every numeric and binary column varies
#[cfg(test)]
pub(crate) fn sample_dataset() -> Dataset {
    let rows = [
        (1, 70.35, "Month-to-month", "Fiber optic", "Electronic check", true, true),
        (5, 90.1, "Month-to-month", "Fiber optic", "Electronic check", false, true),
        (30, 25.0, "One year", "DSL", "Mailed check", true, false),
        (45, 42.3, "Two year", "DSL", "Bank transfer (automatic)", false, false),
        (60, 105.5, "Two year", "Fiber optic", "Credit card (automatic)", true, false),
        (8, 20.05, "Month-to-month", "No", "Mailed check", false, false),
    ];
    Dataset::new(
        rows.iter()
            .enumerate()
            .map(
                |(i, &(tenure, monthly, contract, internet, payment, male, churned))| {
                    CustomerRecord {
                        customer_id: format!("C{:03}", i),
                        is_male: male,
                        is_senior_citizen: i % 3 == 0,
                        has_partner: i % 2 == 0,
                        has_dependents: i == 3,
                        tenure_months: tenure,
                        has_phone_service: i != 2,
                        internet_service: internet.to_string(),
                        contract: contract.to_string(),
                        paperless_billing: churned || i == 4,
                        payment_method: payment.to_string(),
                        monthly_charges: monthly,
                        total_charges: monthly * f64::from(tenure),
                        churned,
                        ..sample_customer()
                    }
                },
            )
            .collect(),
    )
}
