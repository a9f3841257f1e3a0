//! Churn aggregation, binning and correlation over a cleaned dataset
//!
//! Every function here is read-only over its `Dataset` and returns a fresh,
//! caller-owned result. Churn rates are always fractions in `[0, 1]`;
//! turning them into percentages is left to the reporting layer.

use crate::dataset::{CustomerRecord, Dataset, Field, FieldKind, FieldValue};
use crate::error::AnalysisError;
use ndarray::{Array2, Axis};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Demographic flags compared against churn
pub const DEMOGRAPHIC_FEATURES: [Field; 4] = [
    Field::Gender,
    Field::SeniorCitizen,
    Field::Partner,
    Field::Dependents,
];

/// Subscribed services compared against churn
pub const SERVICE_FEATURES: [Field; 9] = [
    Field::PhoneService,
    Field::MultipleLines,
    Field::InternetService,
    Field::OnlineSecurity,
    Field::OnlineBackup,
    Field::DeviceProtection,
    Field::TechSupport,
    Field::StreamingTv,
    Field::StreamingMovies,
];

/// Numeric and binary columns entering the correlation matrix alongside churn
pub const CORRELATION_FEATURES: [Field; 9] = [
    Field::Tenure,
    Field::MonthlyCharges,
    Field::TotalCharges,
    Field::SeniorCitizen,
    Field::Gender,
    Field::Partner,
    Field::Dependents,
    Field::PhoneService,
    Field::PaperlessBilling,
];

const NO_INTERNET_SERVICE: &str = "No internet service";
const NO_PHONE_SERVICE: &str = "No phone service";

/// Value range of one bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
    /// Only the last bin of a binning includes its upper bound
    pub closed_upper: bool,
}

impl Interval {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower
            && (value < self.upper || (self.closed_upper && value == self.upper))
    }

    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let close = if self.closed_upper { ']' } else { ')' };
        write!(f, "[{:.2}, {:.2}{}", self.lower, self.upper, close)
    }
}

/// Equal-width partition of `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binning {
    min: f64,
    max: f64,
    bins: usize,
    width: f64,
}

impl Binning {
    /// Split `[min, max]` into `bins` half-open intervals, the last one closed
    pub fn equal_width(min: f64, max: f64, bins: usize) -> Result<Self, AnalysisError> {
        if bins == 0 {
            return Err(AnalysisError::InvalidBinCount);
        }
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Ok(Self {
            min,
            max,
            bins,
            width: (max - min) / bins as f64,
        })
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn interval(&self, index: usize) -> Interval {
        let last = index + 1 >= self.bins;
        Interval {
            lower: self.edge(index),
            upper: if last { self.max } else { self.edge(index + 1) },
            closed_upper: last,
        }
    }

    pub fn intervals(&self) -> Vec<Interval> {
        (0..self.bins).map(|i| self.interval(i)).collect()
    }

    /// Index of the bin holding `value`, `None` outside `[min, max]`
    pub fn locate(&self, value: f64) -> Option<usize> {
        if !(self.min..=self.max).contains(&value) {
            return None;
        }
        if self.width == 0.0 {
            return Some(0);
        }

        let mut index = (((value - self.min) / self.width).floor() as usize).min(self.bins - 1);
        // Division rounding can land one bin off near an edge
        if index > 0 && value < self.interval(index).lower {
            index -= 1;
        } else if index + 1 < self.bins && value >= self.interval(index).upper {
            index += 1;
        }
        Some(index)
    }

    fn edge(&self, index: usize) -> f64 {
        self.min + self.width * index as f64
    }
}

/// Key of one partition in an `AggregateSummary`
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    Flag(bool),
    Count(u32),
    Category(String),
    Interval(Interval),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Flag(flag) => write!(f, "{}", u8::from(*flag)),
            GroupKey::Count(count) => write!(f, "{}", count),
            GroupKey::Category(category) => f.write_str(category),
            GroupKey::Interval(interval) => write!(f, "{}", interval),
        }
    }
}

/// Size and churn rate of one partition
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub key: GroupKey,
    /// Always at least 1
    pub count: usize,
    pub churned: usize,
    /// Fraction of `count` that churned
    pub churn_rate: f64,
}

/// Churn statistics per distinct value (or bin) of one feature.
///
/// Entries have no meaningful order; use `sorted_by_rate` for display.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSummary {
    feature: Field,
    groups: Vec<GroupStats>,
}

impl AggregateSummary {
    pub fn feature(&self) -> Field {
        self.feature
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroupStats> {
        self.groups.iter()
    }

    /// Human-readable label of a key, e.g. `Male` rather than `1` for gender
    pub fn label(&self, key: &GroupKey) -> String {
        match key {
            GroupKey::Flag(flag) => self.feature.flag_label(*flag).to_string(),
            other => other.to_string(),
        }
    }

    pub fn get(&self, key: &GroupKey) -> Option<&GroupStats> {
        self.groups.iter().find(|g| &g.key == key)
    }

    /// Total records across all partitions
    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.count).sum()
    }

    pub fn sorted_by_rate(&self, descending: bool) -> Vec<&GroupStats> {
        let mut sorted: Vec<&GroupStats> = self.groups.iter().collect();
        sorted.sort_by(|a, b| {
            let ordering = a
                .churn_rate
                .partial_cmp(&b.churn_rate)
                .unwrap_or(Ordering::Equal);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        sorted
    }

    pub fn highest_rate(&self) -> Option<&GroupStats> {
        self.sorted_by_rate(true).into_iter().next()
    }

    pub fn lowest_rate(&self) -> Option<&GroupStats> {
        self.sorted_by_rate(false).into_iter().next()
    }
}

/// Group records by `key_of` and fold them into per-group churn statistics.
/// Records mapped to `None` are left out.
fn summarize<'a, K, F, G>(
    feature: Field,
    dataset: &'a Dataset,
    key_of: F,
    into_key: G,
) -> AggregateSummary
where
    K: Ord,
    F: Fn(&'a CustomerRecord) -> Option<K>,
    G: Fn(K) -> GroupKey,
{
    let mut partitions: BTreeMap<K, (usize, usize)> = BTreeMap::new();
    for record in dataset {
        if let Some(key) = key_of(record) {
            let entry = partitions.entry(key).or_default();
            entry.0 += 1;
            entry.1 += usize::from(record.churned);
        }
    }

    let groups = partitions
        .into_iter()
        .map(|(key, (count, churned))| GroupStats {
            key: into_key(key),
            count,
            churned,
            churn_rate: churned as f64 / count as f64,
        })
        .collect();

    AggregateSummary { feature, groups }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ExactKey<'a> {
    Flag(bool),
    Count(u32),
    Text(&'a str),
}

/// Churn rate per exact value of `feature`
///
/// Monetary amounts are continuous and cannot be grouped by exact value;
/// use `binned_churn_rate` for them.
pub fn churn_rate_by(dataset: &Dataset, feature: Field) -> Result<AggregateSummary, AnalysisError> {
    if feature.kind() == FieldKind::Amount {
        return Err(AnalysisError::UnsupportedFeature {
            field: feature,
            operation: "churn_rate_by",
        });
    }

    Ok(summarize(
        feature,
        dataset,
        |record| match record.value(feature) {
            FieldValue::Flag(flag) => Some(ExactKey::Flag(flag)),
            FieldValue::Count(count) => Some(ExactKey::Count(count)),
            FieldValue::Text(text) => Some(ExactKey::Text(text)),
            FieldValue::Amount(_) => None,
        },
        |key| match key {
            ExactKey::Flag(flag) => GroupKey::Flag(flag),
            ExactKey::Count(count) => GroupKey::Count(count),
            ExactKey::Text(text) => GroupKey::Category(text.to_string()),
        },
    ))
}

/// Churn rate per equal-width bin of a numeric feature
///
/// Bins with no records are left out of the summary.
pub fn binned_churn_rate(
    dataset: &Dataset,
    feature: Field,
    bins: usize,
) -> Result<AggregateSummary, AnalysisError> {
    if bins == 0 {
        return Err(AnalysisError::InvalidBinCount);
    }
    let values = dataset
        .numeric_column(feature)
        .ok_or(AnalysisError::UnsupportedFeature {
            field: feature,
            operation: "binned_churn_rate",
        })?;

    let Some((min, max)) = value_range(&values) else {
        return Ok(AggregateSummary {
            feature,
            groups: Vec::new(),
        });
    };
    let binning = Binning::equal_width(min, max, bins)?;

    Ok(summarize(
        feature,
        dataset,
        |record| record.numeric(feature).and_then(|v| binning.locate(v)),
        |index| GroupKey::Interval(binning.interval(index)),
    ))
}

/// Churn rate per value of a service column.
///
/// `"No internet service"` counts as `"No"`, and customers without phone
/// service are left out of the multiple-lines breakdown.
pub fn service_churn_rate(
    dataset: &Dataset,
    feature: Field,
) -> Result<AggregateSummary, AnalysisError> {
    match feature.kind() {
        FieldKind::Category => Ok(summarize(
            feature,
            dataset,
            |record| match record.value(feature) {
                FieldValue::Text(NO_PHONE_SERVICE) if feature == Field::MultipleLines => None,
                FieldValue::Text(NO_INTERNET_SERVICE) => Some("No"),
                FieldValue::Text(text) => Some(text),
                _ => None,
            },
            |text| GroupKey::Category(text.to_string()),
        )),
        FieldKind::Binary => churn_rate_by(dataset, feature),
        _ => Err(AnalysisError::UnsupportedFeature {
            field: feature,
            operation: "service_churn_rate",
        }),
    }
}

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |range, &v| match range {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Symmetric Pearson correlation matrix over named fields
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    fields: Vec<Field>,
    values: Array2<f64>,
}

impl CorrelationMatrix {
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn get(&self, a: Field, b: Field) -> Option<f64> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        Some(self.values[[i, j]])
    }

    /// Correlation of every other field with `target`, strongest positive first
    pub fn ranked_against(&self, target: Field) -> Vec<(Field, f64)> {
        let Some(t) = self.position(target) else {
            return Vec::new();
        };
        let mut ranked: Vec<(Field, f64)> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != t)
            .map(|(i, &field)| (field, self.values[[i, t]]))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked
    }

    fn position(&self, field: Field) -> Option<usize> {
        self.fields.iter().position(|&f| f == field)
    }
}

/// Pearson correlation between every pair of `features` plus `target`
///
/// Every field must be numeric or binary, and none may be constant.
pub fn correlation_matrix(
    dataset: &Dataset,
    features: &[Field],
    target: Field,
) -> Result<CorrelationMatrix, AnalysisError> {
    let mut fields: Vec<Field> = Vec::with_capacity(features.len() + 1);
    for &field in features.iter().chain(std::iter::once(&target)) {
        if !fields.contains(&field) {
            fields.push(field);
        }
    }

    let mut columns = Vec::with_capacity(fields.len());
    for &field in &fields {
        let column = dataset
            .numeric_column(field)
            .ok_or(AnalysisError::UnsupportedFeature {
                field,
                operation: "correlation_matrix",
            })?;
        match value_range(&column) {
            Some((lo, hi)) if lo < hi => columns.push(column),
            _ => return Err(AnalysisError::DegenerateFeature { field }),
        }
    }

    let n_samples = dataset.len();
    let n_fields = fields.len();
    let data = Array2::from_shape_fn((n_samples, n_fields), |(i, j)| columns[j][i]);
    let means = data
        .mean_axis(Axis(0))
        .ok_or(AnalysisError::DegenerateFeature { field: target })?;
    let mut centered = &data - &means.insert_axis(Axis(0));
    // Unit max magnitude per column keeps the sums of squares finite
    for mut column in centered.columns_mut() {
        let scale = column.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if scale > 0.0 {
            column /= scale;
        }
    }

    let norms: Vec<f64> = (0..n_fields)
        .map(|j| centered.column(j).dot(&centered.column(j)).sqrt())
        .collect();

    let mut values = Array2::<f64>::eye(n_fields);
    for a in 0..n_fields {
        for b in (a + 1)..n_fields {
            let r = centered.column(a).dot(&centered.column(b)) / (norms[a] * norms[b]);
            let r = r.clamp(-1.0, 1.0);
            values[[a, b]] = r;
            values[[b, a]] = r;
        }
    }

    Ok(CorrelationMatrix { fields, values })
}

/// Headline churn counts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChurnOverview {
    pub total: usize,
    pub churned: usize,
    pub churn_rate: f64,
}

impl ChurnOverview {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let total = dataset.len();
        let churned = dataset.iter().filter(|r| r.churned).count();
        let churn_rate = if total == 0 {
            0.0
        } else {
            churned as f64 / total as f64
        };
        Self {
            total,
            churned,
            churn_rate,
        }
    }

    pub fn retained(&self) -> usize {
        self.total - self.churned
    }

    pub fn retention_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            1.0 - self.churn_rate
        }
    }
}

/// Descriptive statistics of one numeric column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    pub field: Field,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); NaN below two values
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Count, mean, spread and quartiles of each numeric field.
/// Statistics of an empty dataset are NaN.
pub fn describe(dataset: &Dataset, fields: &[Field]) -> Result<Vec<ColumnSummary>, AnalysisError> {
    fields
        .iter()
        .map(|&field| {
            let mut values =
                dataset
                    .numeric_column(field)
                    .ok_or(AnalysisError::UnsupportedFeature {
                        field,
                        operation: "describe",
                    })?;
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

            let count = values.len();
            let mean = mean(&values);
            let std = if count < 2 {
                f64::NAN
            } else {
                let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
                (ss / (count - 1) as f64).sqrt()
            };

            Ok(ColumnSummary {
                field,
                count,
                mean,
                std,
                min: quantile(&values, 0.0),
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: quantile(&values, 1.0),
            })
        })
        .collect()
}

/// Linear-interpolated quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Average spend and tenure of a group of customers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpendProfile {
    pub customers: usize,
    pub mean_monthly_charges: f64,
    pub mean_total_charges: f64,
    pub mean_tenure_months: f64,
}

impl SpendProfile {
    fn from_records<'a>(records: impl Iterator<Item = &'a CustomerRecord>) -> Self {
        let (mut customers, mut monthly, mut total, mut tenure) = (0usize, 0.0, 0.0, 0.0);
        for record in records {
            customers += 1;
            monthly += record.monthly_charges;
            total += record.total_charges;
            tenure += f64::from(record.tenure_months);
        }
        let n = customers as f64;
        Self {
            customers,
            mean_monthly_charges: monthly / n,
            mean_total_charges: total / n,
            mean_tenure_months: tenure / n,
        }
    }
}

/// Spend profile overall and split by churn status
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinancialProfile {
    pub overall: SpendProfile,
    pub stayed: SpendProfile,
    pub churned: SpendProfile,
}

impl FinancialProfile {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            overall: SpendProfile::from_records(dataset.iter()),
            stayed: SpendProfile::from_records(dataset.iter().filter(|r| !r.churned)),
            churned: SpendProfile::from_records(dataset.iter().filter(|r| r.churned)),
        }
    }
}
