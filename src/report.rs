//! Console narration of the analysis and the exported text summary

use crate::analysis::{ChurnAnalysis, TenureSplit};
use crate::dataset::{Dataset, Field, RawDataset};
use crate::stats::{AggregateSummary, ChurnOverview, ColumnSummary, CorrelationMatrix, FinancialProfile, SpendProfile};
use anyhow::Context;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

/// How many positive correlates the findings name
const TOP_CORRELATES: usize = 3;

/// A group singled out in the findings
#[derive(Debug, Clone, PartialEq)]
pub struct GroupHighlight {
    pub label: String,
    pub customers: usize,
    pub churn_rate: f64,
}

/// Highest and lowest churn group of one feature
#[derive(Debug, Clone, PartialEq)]
pub struct Extremes {
    pub feature: Field,
    pub riskiest: GroupHighlight,
    pub safest: GroupHighlight,
}

impl Extremes {
    fn of(summary: &AggregateSummary) -> Option<Self> {
        let highlight = |g: &crate::stats::GroupStats| GroupHighlight {
            label: summary.label(&g.key),
            customers: g.count,
            churn_rate: g.churn_rate,
        };
        Some(Self {
            feature: summary.feature(),
            riskiest: highlight(summary.highest_rate()?),
            safest: highlight(summary.lowest_rate()?),
        })
    }
}

/// Conclusions drawn from the computed summaries
#[derive(Debug, Clone, PartialEq)]
pub struct Findings {
    pub contract: Option<Extremes>,
    pub internet_service: Option<Extremes>,
    pub payment_method: Option<Extremes>,
    pub tenure: TenureSplit,
    /// Fields most positively correlated with churn, strongest first
    pub top_correlates: Vec<(Field, f64)>,
}

impl Findings {
    pub fn derive(analysis: &ChurnAnalysis, early_tenure_months: u32) -> Self {
        Self {
            contract: Extremes::of(&analysis.contract),
            internet_service: analysis
                .service(Field::InternetService)
                .and_then(Extremes::of),
            payment_method: Extremes::of(&analysis.payment_method),
            tenure: analysis.tenure_split(early_tenure_months),
            top_correlates: analysis
                .correlation
                .ranked_against(Field::Churn)
                .into_iter()
                .filter(|(_, r)| *r > 0.0)
                .take(TOP_CORRELATES)
                .collect(),
        }
    }

    fn extremes(&self) -> impl Iterator<Item = &Extremes> {
        [&self.contract, &self.internet_service, &self.payment_method]
            .into_iter()
            .flatten()
    }
}

/// Format a fraction as a percentage with two decimals
pub fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn optional_percent(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), percent)
}

fn section(title: &str) {
    println!("\n{}", "=".repeat(50));
    println!("{}", title);
    println!("{}", "=".repeat(50));
}

pub fn print_dataset_overview(raw: &RawDataset) {
    section("Dataset Overview");
    let (rows, columns) = raw.shape();
    println!("Shape: {} rows x {} columns", rows, columns);

    println!("\nDistinct values per column:");
    for (field, distinct) in raw.unique_counts() {
        println!("  {:<18} {:>6}", field, distinct);
    }
    println!(
        "\nTotalCharges holding a blank placeholder: {}",
        raw.placeholder_total_charges()
    );
}

pub fn print_cleaning_summary(imputed: usize, dataset: &Dataset) {
    section("Data Cleaning");
    println!("Imputed TotalCharges as MonthlyCharges x tenure: {} rows", imputed);
    println!("Rows after cleaning: {}", dataset.len());
    println!("Encoded binary columns as 0/1: gender (Male = 1), SeniorCitizen, Partner, Dependents, PhoneService, PaperlessBilling, Churn");
}

pub fn print_descriptive_statistics(summaries: &[ColumnSummary]) {
    section("Descriptive Statistics");
    println!(
        "  {:<16} | {:>6} | {:>9} | {:>9} | {:>8} | {:>8} | {:>8} | {:>8} | {:>9}",
        "Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    println!("  {}", "-".repeat(104));
    for s in summaries {
        println!(
            "  {:<16} | {:>6} | {:>9.2} | {:>9.2} | {:>8.2} | {:>8.2} | {:>8.2} | {:>8.2} | {:>9.2}",
            s.field.to_string(),
            s.count,
            s.mean,
            s.std,
            s.min,
            s.q1,
            s.median,
            s.q3,
            s.max
        );
    }
}

pub fn print_churn_overview(overview: &ChurnOverview) {
    section("Churn Overview");
    println!("Total customers:    {}", overview.total);
    println!("Churned customers:  {}", overview.churned);
    println!("Churn rate:         {}", percent(overview.churn_rate));
    println!("Retained customers: {}", overview.retained());
    println!("Retention rate:     {}", percent(overview.retention_rate()));
}

/// Print one grouped churn table, highest rate first
pub fn print_group_table(summary: &AggregateSummary) {
    println!("\n{}:", summary.feature());
    for group in summary.sorted_by_rate(true) {
        println!(
            "  {:<28} {:>6} customers, churn rate {:>7}",
            summary.label(&group.key),
            group.count,
            percent(group.churn_rate)
        );
    }
}

pub fn print_financial_profile(profile: &FinancialProfile) {
    section("Financial Profile");
    let rows: [(&str, &SpendProfile); 3] = [
        ("All customers", &profile.overall),
        ("Stayed", &profile.stayed),
        ("Churned", &profile.churned),
    ];
    println!(
        "  {:<14} | {:>9} | {:>12} | {:>12} | {:>8}",
        "Group", "customers", "avg monthly", "avg total", "avg tenure"
    );
    println!("  {}", "-".repeat(66));
    for (name, spend) in rows {
        println!(
            "  {:<14} | {:>9} | {:>12.2} | {:>12.2} | {:>8.1} mo",
            name,
            spend.customers,
            spend.mean_monthly_charges,
            spend.mean_total_charges,
            spend.mean_tenure_months
        );
    }
}

pub fn print_correlation_ranking(matrix: &CorrelationMatrix) {
    section("Correlation with Churn");
    for (field, r) in matrix.ranked_against(Field::Churn) {
        println!("  {:<18} {:>7.3}", field.to_string(), r);
    }
}

/// Print every grouped summary and profile of an analysis
pub fn print_analysis(analysis: &ChurnAnalysis) {
    print_descriptive_statistics(&analysis.descriptive);
    print_churn_overview(&analysis.overview);

    section("Demographics");
    analysis.demographics.iter().for_each(print_group_table);

    section("Services");
    analysis.services.iter().for_each(print_group_table);

    section("Contract and Payment");
    print_group_table(&analysis.contract);
    print_group_table(&analysis.payment_method);

    section("Monthly Charges");
    print_group_table(&analysis.monthly_charges);

    print_financial_profile(&analysis.financial);
    print_correlation_ranking(&analysis.correlation);
}

pub fn print_findings(findings: &Findings) {
    section("Key Findings");
    for line in finding_lines(findings) {
        println!("- {}", line);
    }
}

pub fn print_generated_files(data_path: &Path, summary_path: &Path, charts: &[PathBuf]) {
    println!("\nGenerated files:");
    println!("  Cleaned data: {}", data_path.display());
    println!("  Summary:      {}", summary_path.display());
    for chart in charts {
        println!("  Chart:        {}", chart.display());
    }
}

fn finding_lines(findings: &Findings) -> Vec<String> {
    let mut lines = Vec::new();

    for extremes in findings.extremes() {
        lines.push(format!(
            "{}: highest churn for {} ({}), lowest for {} ({})",
            extremes.feature,
            extremes.riskiest.label,
            percent(extremes.riskiest.churn_rate),
            extremes.safest.label,
            percent(extremes.safest.churn_rate)
        ));
    }

    let tenure = &findings.tenure;
    lines.push(format!(
        "Tenure: customers under {} months churn at {}, the rest at {}",
        tenure.threshold_months,
        optional_percent(tenure.early_rate),
        optional_percent(tenure.established_rate)
    ));

    if !findings.top_correlates.is_empty() {
        let correlates: Vec<String> = findings
            .top_correlates
            .iter()
            .map(|(field, r)| format!("{} ({:.3})", field, r))
            .collect();
        lines.push(format!(
            "Strongest positive correlates of churn: {}",
            correlates.join(", ")
        ));
    }

    lines
}

/// Render the plain-text summary file
pub fn render_summary(
    overview: &ChurnOverview,
    findings: &Findings,
    generated_at: DateTime<Local>,
) -> String {
    let mut output = String::new();

    output.push_str("Telecom Customer Churn Analysis\n");
    output.push_str(&format!(
        "Generated: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    output.push_str("Key metrics:\n");
    output.push_str(&format!("- Total customers: {}\n", overview.total));
    output.push_str(&format!("- Churned customers: {}\n", overview.churned));
    output.push_str(&format!("- Overall churn rate: {}\n\n", percent(overview.churn_rate)));

    output.push_str("Findings:\n");
    for (i, line) in finding_lines(findings).iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, line));
    }
    output.push('\n');

    output.push_str("Recommendations:\n");
    let mut recommendations = Vec::new();
    if let Some(contract) = &findings.contract {
        recommendations.push(format!(
            "Offer incentives to move {} customers onto {} contracts",
            contract.riskiest.label, contract.safest.label
        ));
    }
    if let Some(payment) = &findings.payment_method {
        recommendations.push(format!(
            "Encourage customers paying by {} to switch to {}",
            payment.riskiest.label, payment.safest.label
        ));
    }
    if let Some(internet) = &findings.internet_service {
        recommendations.push(format!(
            "Review the service experience of {} internet customers",
            internet.riskiest.label
        ));
    }
    recommendations.push(format!(
        "Strengthen onboarding during the first {} months of tenure",
        findings.tenure.threshold_months
    ));
    for (i, rec) in recommendations.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, rec));
    }

    output
}

/// Write the summary text to `path`
pub fn write_summary(path: &Path, text: &str) -> crate::Result<()> {
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write summary: {}", path.display()))?;
    info!(path = %path.display(), "Wrote analysis summary");
    Ok(())
}
