//! The full set of summaries one report run needs, computed in one pass

use crate::config::AnalysisConfig;
use crate::dataset::{Dataset, Field};
use crate::error::AnalysisError;
use crate::stats::{
    binned_churn_rate, churn_rate_by, correlation_matrix, describe, service_churn_rate,
    AggregateSummary, ChurnOverview, ColumnSummary, CorrelationMatrix, FinancialProfile,
    CORRELATION_FEATURES, DEMOGRAPHIC_FEATURES, SERVICE_FEATURES,
};
use tracing::debug;

/// Numeric columns shown in the descriptive statistics table
pub const DESCRIBED_FEATURES: [Field; 4] = [
    Field::SeniorCitizen,
    Field::Tenure,
    Field::MonthlyCharges,
    Field::TotalCharges,
];

/// Summaries consumed by the charts and the console report
#[derive(Debug, Clone)]
pub struct ChurnAnalysis {
    pub overview: ChurnOverview,
    pub descriptive: Vec<ColumnSummary>,
    pub tenure: AggregateSummary,
    pub demographics: Vec<AggregateSummary>,
    pub services: Vec<AggregateSummary>,
    pub contract: AggregateSummary,
    pub payment_method: AggregateSummary,
    pub monthly_charges: AggregateSummary,
    pub financial: FinancialProfile,
    pub correlation: CorrelationMatrix,
}

impl ChurnAnalysis {
    /// Compute every summary over a cleaned dataset; fails with
    /// `EmptyDataset` when there are no customers
    pub fn run(dataset: &Dataset, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        if dataset.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }

        let demographics = DEMOGRAPHIC_FEATURES
            .iter()
            .map(|&field| churn_rate_by(dataset, field))
            .collect::<Result<Vec<_>, _>>()?;
        let services = SERVICE_FEATURES
            .iter()
            .map(|&field| service_churn_rate(dataset, field))
            .collect::<Result<Vec<_>, _>>()?;

        let analysis = Self {
            overview: ChurnOverview::from_dataset(dataset),
            descriptive: describe(dataset, &DESCRIBED_FEATURES)?,
            tenure: churn_rate_by(dataset, Field::Tenure)?,
            demographics,
            services,
            contract: churn_rate_by(dataset, Field::Contract)?,
            payment_method: churn_rate_by(dataset, Field::PaymentMethod)?,
            monthly_charges: binned_churn_rate(
                dataset,
                Field::MonthlyCharges,
                config.monthly_charge_bins,
            )?,
            financial: FinancialProfile::from_dataset(dataset),
            correlation: correlation_matrix(dataset, &CORRELATION_FEATURES, Field::Churn)?,
        };

        debug!(
            customers = analysis.overview.total,
            tenure_groups = analysis.tenure.len(),
            "Computed churn analysis"
        );
        Ok(analysis)
    }

    /// Breakdown of one service column
    pub fn service(&self, field: Field) -> Option<&AggregateSummary> {
        self.services.iter().find(|s| s.feature() == field)
    }

    /// Churn rate of customers below and at-or-above a tenure threshold
    pub fn tenure_split(&self, threshold_months: u32) -> TenureSplit {
        let mut early = (0usize, 0usize);
        let mut established = (0usize, 0usize);
        for group in self.tenure.iter() {
            let bucket = match group.key {
                crate::stats::GroupKey::Count(months) if months < threshold_months => &mut early,
                _ => &mut established,
            };
            bucket.0 += group.count;
            bucket.1 += group.churned;
        }

        let rate = |(count, churned): (usize, usize)| {
            (count > 0).then(|| churned as f64 / count as f64)
        };
        TenureSplit {
            threshold_months,
            early_rate: rate(early),
            established_rate: rate(established),
        }
    }
}

/// Churn rate either side of a tenure threshold; `None` when a side is empty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TenureSplit {
    pub threshold_months: u32,
    pub early_rate: Option<f64>,
    pub established_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{sample_dataset, CustomerRecord};

    #[test]
    fn test_run_computes_every_summary() {
        let analysis = ChurnAnalysis::run(&sample_dataset(), &AnalysisConfig::default()).unwrap();

        assert_eq!(analysis.overview.total, 6);
        assert_eq!(analysis.demographics.len(), DEMOGRAPHIC_FEATURES.len());
        assert_eq!(analysis.services.len(), SERVICE_FEATURES.len());
        assert_eq!(analysis.contract.len(), 3);
        assert_eq!(analysis.monthly_charges.total(), 6);
        assert_eq!(analysis.correlation.fields().len(), CORRELATION_FEATURES.len() + 1);
        assert_eq!(analysis.descriptive.len(), DESCRIBED_FEATURES.len());
        assert!(analysis.service(Field::InternetService).is_some());
    }

    #[test]
    fn test_run_fails_on_constant_correlation_feature() {
        let dataset = Dataset::new(
            sample_dataset()
                .iter()
                .map(|r| CustomerRecord {
                    has_phone_service: true,
                    ..r.clone()
                })
                .collect(),
        );

        let result = ChurnAnalysis::run(&dataset, &AnalysisConfig::default());
        assert!(matches!(
            result,
            Err(AnalysisError::DegenerateFeature {
                field: Field::PhoneService
            })
        ));
    }

    #[test]
    fn test_run_rejects_empty_dataset() {
        let result = ChurnAnalysis::run(&Dataset::default(), &AnalysisConfig::default());
        assert_eq!(result.unwrap_err(), AnalysisError::EmptyDataset);
    }

    #[test]
    fn test_tenure_split() {
        let analysis = ChurnAnalysis::run(&sample_dataset(), &AnalysisConfig::default()).unwrap();

        let split = analysis.tenure_split(12);
        // tenure 1, 5, 8 -> two of three churned; 30, 45, 60 -> none
        assert_eq!(split.early_rate, Some(2.0 / 3.0));
        assert_eq!(split.established_rate, Some(0.0));

        let split = analysis.tenure_split(0);
        assert_eq!(split.early_rate, None);
    }
}
