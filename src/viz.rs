//! Chart rendering with Plotters
//!
//! Every chart is one PNG made of several panels on a single bitmap. Panel
//! size comes from `ChartConfig`; the bitmap is sized to fit the grid.

use crate::analysis::ChurnAnalysis;
use crate::config::ChartConfig;
use crate::dataset::{Dataset, Field};
use crate::stats::{AggregateSummary, Binning, GroupKey, DEMOGRAPHIC_FEATURES, SERVICE_FEATURES};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub const OVERVIEW_CHART: &str = "churn_overview.png";
pub const DEMOGRAPHIC_CHART: &str = "demographic_analysis.png";
pub const SERVICE_CHART: &str = "service_analysis.png";
pub const CONTRACT_PAYMENT_CHART: &str = "contract_payment_analysis.png";
pub const FINANCIAL_CHART: &str = "financial_analysis.png";
pub const CORRELATION_CHART: &str = "correlation_analysis.png";

const STAYED_COLOR: RGBColor = RGBColor(0x2E, 0x86, 0xAB);
const CHURNED_COLOR: RGBColor = RGBColor(0xA2, 0x3B, 0x72);
const NEGATIVE_COLOR: RGBColor = RGBColor(0x4B, 0x8B, 0xBE);
const MISSING_CELL_COLOR: RGBColor = RGBColor(0xDD, 0xDD, 0xDD);

/// One color per demographic panel
const DEMOGRAPHIC_COLORS: [RGBColor; 4] = [
    RGBColor(0x4B, 0x8B, 0xBE),
    RGBColor(0xFF, 0xD4, 0x3B),
    RGBColor(0x30, 0x69, 0x98),
    RGBColor(0x64, 0x64, 0x64),
];

const CAPTION_SIZE: i32 = 20;
const LABEL_SIZE: i32 = 12;

/// Render every chart into `images_dir`
///
/// # Returns
/// * Paths of the written PNG files, empty when charts are disabled
pub fn generate_charts(
    dataset: &Dataset,
    analysis: &ChurnAnalysis,
    histogram_bins: usize,
    config: &ChartConfig,
    images_dir: &Path,
) -> crate::Result<Vec<PathBuf>> {
    if config.disabled {
        debug!("Chart rendering disabled");
        return Ok(Vec::new());
    }

    let panel = (config.panel_width, config.panel_height);
    let mut written = Vec::with_capacity(6);

    let path = images_dir.join(OVERVIEW_CHART);
    create_overview_chart(analysis, &path, panel)?;
    written.push(path);

    let path = images_dir.join(DEMOGRAPHIC_CHART);
    create_demographic_chart(analysis, &path, panel)?;
    written.push(path);

    let path = images_dir.join(SERVICE_CHART);
    create_service_chart(analysis, &path, panel)?;
    written.push(path);

    let path = images_dir.join(CONTRACT_PAYMENT_CHART);
    create_contract_payment_chart(analysis, &path, panel)?;
    written.push(path);

    let path = images_dir.join(FINANCIAL_CHART);
    create_financial_chart(dataset, analysis, histogram_bins, &path, panel)?;
    written.push(path);

    let path = images_dir.join(CORRELATION_CHART);
    create_correlation_chart(analysis, &path, panel)?;
    written.push(path);

    for path in &written {
        info!(path = %path.display(), "Saved chart");
    }
    Ok(written)
}

/// Stayed/churned shares and counts, and the churn curve over tenure
fn create_overview_chart(
    analysis: &ChurnAnalysis,
    path: &Path,
    panel: (u32, u32),
) -> crate::Result<()> {
    let root = BitMapBackend::new(path, (panel.0 * 3, panel.1)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 3));

    let overview = &analysis.overview;
    draw_churn_pie(
        &panels[0],
        "Customer Churn Distribution",
        overview.retained(),
        overview.churned,
    )?;
    draw_count_bars(
        &panels[1],
        "Customer Churn Count Comparison",
        &["Stayed".to_string(), "Churned".to_string()],
        &[overview.retained(), overview.churned],
        &[STAYED_COLOR, CHURNED_COLOR],
    )?;

    let curve: Vec<(f64, f64)> = analysis
        .tenure
        .iter()
        .filter_map(|g| match g.key {
            GroupKey::Count(months) => Some((f64::from(months), g.churn_rate * 100.0)),
            _ => None,
        })
        .collect();
    draw_rate_curve(&panels[2], "Tenure vs Churn Rate", "Tenure (Months)", &curve)?;

    root.present()?;
    Ok(())
}

/// Customers and churn rate per demographic flag plus a rate heatmap
fn create_demographic_chart(
    analysis: &ChurnAnalysis,
    path: &Path,
    panel: (u32, u32),
) -> crate::Result<()> {
    let root = BitMapBackend::new(path, (panel.0 * 3, panel.1 * 2)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 3));

    for (i, summary) in analysis.demographics.iter().enumerate() {
        draw_counts_with_rate(
            &panels[i],
            &format!("{} Distribution and Churn Rate", summary.feature()),
            &group_bars(summary),
            DEMOGRAPHIC_COLORS[i % DEMOGRAPHIC_COLORS.len()],
        )?;
    }

    let row_labels: Vec<String> = DEMOGRAPHIC_FEATURES
        .iter()
        .map(|f| match f {
            Field::Gender => format!("{} (Yes = Male)", f),
            other => other.to_string(),
        })
        .collect();
    let cells: Vec<Vec<Option<f64>>> = analysis
        .demographics
        .iter()
        .map(|summary| {
            [false, true]
                .iter()
                .map(|&flag| {
                    summary
                        .get(&GroupKey::Flag(flag))
                        .map(|g| g.churn_rate * 100.0)
                })
                .collect()
        })
        .collect();
    draw_heatmap(
        &panels[4],
        "Demographic Churn Rate (%)",
        &row_labels,
        &["No".to_string(), "Yes".to_string()],
        &cells,
        |v| sequential_color(v / 100.0),
        |v| format!("{:.1}", v),
    )?;

    root.present()?;
    Ok(())
}

/// Churn rate per value of each service column, 3x3 grid
fn create_service_chart(
    analysis: &ChurnAnalysis,
    path: &Path,
    panel: (u32, u32),
) -> crate::Result<()> {
    let root = BitMapBackend::new(path, (panel.0 * 3, panel.1 * 3)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((3, 3));

    for (area, field) in panels.iter().zip(SERVICE_FEATURES) {
        let Some(summary) = analysis.service(field) else {
            continue;
        };
        let (labels, rates) = rate_bars(summary, false);
        draw_rate_bars(
            area,
            &format!("{} Churn Rate", field),
            &labels,
            &rates,
            STAYED_COLOR,
        )?;
    }

    root.present()?;
    Ok(())
}

/// Contract type and payment method, ascending churn rate
fn create_contract_payment_chart(
    analysis: &ChurnAnalysis,
    path: &Path,
    panel: (u32, u32),
) -> crate::Result<()> {
    let root = BitMapBackend::new(path, (panel.0 * 2, panel.1)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));

    let (labels, rates) = rate_bars(&analysis.contract, true);
    draw_rate_bars(&panels[0], "Contract Type Churn Rate", &labels, &rates, STAYED_COLOR)?;

    let (labels, rates) = rate_bars(&analysis.payment_method, true);
    draw_rate_bars(&panels[1], "Payment Method Churn Rate", &labels, &rates, CHURNED_COLOR)?;

    root.present()?;
    Ok(())
}

/// Charge histograms by churn status, binned monthly charges curve and
/// the tenure/total charges scatter
fn create_financial_chart(
    dataset: &Dataset,
    analysis: &ChurnAnalysis,
    histogram_bins: usize,
    path: &Path,
    panel: (u32, u32),
) -> crate::Result<()> {
    let root = BitMapBackend::new(path, (panel.0 * 2, panel.1 * 2)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 2));

    for (area, field) in panels.iter().zip([Field::MonthlyCharges, Field::TotalCharges]) {
        let (churned, stayed): (Vec<_>, Vec<_>) = dataset.iter().partition(|r| r.churned);
        let stayed: Vec<f64> = stayed.iter().filter_map(|r| r.numeric(field)).collect();
        let churned: Vec<f64> = churned.iter().filter_map(|r| r.numeric(field)).collect();
        draw_histogram(
            area,
            &format!("{} Distribution", field),
            &format!("{} ($)", field),
            &[
                ("Stayed", stayed.as_slice(), NEGATIVE_COLOR),
                ("Churned", churned.as_slice(), CHURNED_COLOR),
            ],
            histogram_bins,
        )?;
    }

    let curve: Vec<(f64, f64)> = analysis
        .monthly_charges
        .iter()
        .filter_map(|g| match g.key {
            GroupKey::Interval(interval) => Some((interval.midpoint(), g.churn_rate * 100.0)),
            _ => None,
        })
        .collect();
    draw_rate_curve(
        &panels[2],
        "Monthly Charges Range vs Churn Rate",
        "Monthly Charges ($, bin midpoint)",
        &curve,
    )?;

    draw_tenure_scatter(&panels[3], dataset)?;

    root.present()?;
    Ok(())
}

/// Correlation heatmap and the ranking of features against churn
fn create_correlation_chart(
    analysis: &ChurnAnalysis,
    path: &Path,
    panel: (u32, u32),
) -> crate::Result<()> {
    let root = BitMapBackend::new(path, (panel.0 * 2, panel.1)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));

    let matrix = &analysis.correlation;
    let labels: Vec<String> = matrix.fields().iter().map(|f| f.to_string()).collect();
    let cells: Vec<Vec<Option<f64>>> = matrix
        .values()
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|&v| Some(v)).collect())
        .collect();
    draw_heatmap(
        &panels[0],
        "Feature Correlation Heatmap",
        &labels,
        &labels,
        &cells,
        diverging_color,
        |v| format!("{:.2}", v),
    )?;

    let ranked: Vec<(String, f64)> = matrix
        .ranked_against(Field::Churn)
        .into_iter()
        .map(|(field, r)| (field.to_string(), r))
        .collect();
    draw_ranking(&panels[1], "Feature Correlation with Churn", &ranked)?;

    root.present()?;
    Ok(())
}

fn draw_count_bars(
    area: &Panel<'_>,
    title: &str,
    labels: &[String],
    counts: &[usize],
    colors: &[RGBColor],
) -> crate::Result<()> {
    let max = counts.iter().copied().max().unwrap_or(0).max(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", CAPTION_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(category_range(labels.len()), 0f64..max * 1.15)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| category_label(labels, *x))
        .y_desc("Number of Customers")
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        let color = colors[i % colors.len()];
        let x = i as f64;
        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, count as f64)], color.filled())
    }))?;

    let value_style = ("sans-serif", LABEL_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
        Text::new(
            count.to_string(),
            (i as f64, count as f64),
            value_style.clone(),
        )
    }))?;

    Ok(())
}

/// Pie of stayed and churned customers with percentage labels
fn draw_churn_pie(
    area: &Panel<'_>,
    title: &str,
    retained: usize,
    churned: usize,
) -> crate::Result<()> {
    let area = area.titled(title, ("sans-serif", CAPTION_SIZE))?;
    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;
    let sizes = [retained as f64, churned as f64];
    let colors = [STAYED_COLOR, CHURNED_COLOR];
    let labels = ["Stayed", "Churned"];

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style(("sans-serif", LABEL_SIZE + 2).into_font().color(&BLACK));
    pie.percentages(("sans-serif", LABEL_SIZE + 2).into_font().color(&WHITE));
    area.draw(&pie)?;

    Ok(())
}

/// Customer counts as bars, churn rate as a line on the right-hand axis
fn draw_counts_with_rate(
    area: &Panel<'_>,
    title: &str,
    groups: &[GroupBar],
    color: RGBColor,
) -> crate::Result<()> {
    let labels: Vec<String> = groups.iter().map(|g| g.label.clone()).collect();
    let max = groups.iter().map(|g| g.count).max().unwrap_or(0).max(1) as f64;
    let percents: Vec<f64> = groups.iter().map(|g| g.churn_rate * 100.0).collect();
    let top = (percents.iter().copied().fold(0.0, f64::max) * 1.2).clamp(1.0, 100.0);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", CAPTION_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(50)
        .build_cartesian_2d(category_range(labels.len()), 0f64..max * 1.15)?
        .set_secondary_coord(category_range(labels.len()), 0f64..top);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| category_label(&labels, *x))
        .y_desc("Number of Customers")
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_label_formatter(&|y| format!("{:.0}%", y))
        .y_desc("Churn Rate")
        .draw()?;

    chart
        .draw_series(groups.iter().enumerate().map(|(i, g)| {
            let x = i as f64;
            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, g.count as f64)], color.mix(0.7).filled())
        }))?
        .label("Customers")
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.mix(0.7).filled()));

    let points: Vec<(f64, f64)> = percents.iter().enumerate().map(|(i, &p)| (i as f64, p)).collect();
    chart
        .draw_secondary_series(LineSeries::new(
            points.iter().copied(),
            CHURNED_COLOR.stroke_width(2),
        ))?
        .label("Churn rate")
        .legend(|(x, y)| PathElement::new([(x, y), (x + 10, y)], CHURNED_COLOR.stroke_width(2)));
    chart.draw_secondary_series(
        points
            .iter()
            .map(|&point| Circle::new(point, 4, CHURNED_COLOR.filled())),
    )?;

    let value_style = ("sans-serif", LABEL_SIZE)
        .into_font()
        .color(&CHURNED_COLOR)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_secondary_series(
        points
            .iter()
            .map(|&(x, p)| Text::new(format!("{:.1}%", p), (x, p), value_style.clone())),
    )?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// Vertical bars of churn rates (fractions), annotated in percent
fn draw_rate_bars(
    area: &Panel<'_>,
    title: &str,
    labels: &[String],
    rates: &[f64],
    color: RGBColor,
) -> crate::Result<()> {
    let percents: Vec<f64> = rates.iter().map(|r| r * 100.0).collect();
    let top = percents.iter().copied().fold(0.0, f64::max);
    let top = (top * 1.2).clamp(1.0, 100.0);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", CAPTION_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(category_range(labels.len()), 0f64..top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| category_label(labels, *x))
        .x_label_style(("sans-serif", LABEL_SIZE))
        .y_label_formatter(&|y| format!("{:.0}%", y))
        .y_desc("Churn Rate")
        .draw()?;

    chart.draw_series(percents.iter().enumerate().map(|(i, &p)| {
        let x = i as f64;
        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, p)], color.mix(0.8).filled())
    }))?;

    let value_style = ("sans-serif", LABEL_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(percents.iter().enumerate().map(|(i, &p)| {
        Text::new(format!("{:.1}%", p), (i as f64, p), value_style.clone())
    }))?;

    Ok(())
}

/// Filled line of churn rate in percent over a numeric axis
fn draw_rate_curve(
    area: &Panel<'_>,
    title: &str,
    x_desc: &str,
    points: &[(f64, f64)],
) -> crate::Result<()> {
    let x_range = padded_range(points.iter().map(|p| p.0));
    let top = points.iter().map(|p| p.1).fold(0.0, f64::max);
    let top = (top * 1.1).clamp(1.0, 100.0);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", CAPTION_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, 0f64..top)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Churn Rate (%)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(
        AreaSeries::new(points.iter().copied(), 0.0, CHURNED_COLOR.mix(0.3))
            .border_style(CHURNED_COLOR.stroke_width(2)),
    )?;
    chart.draw_series(
        points
            .iter()
            .map(|&point| Circle::new(point, 3, CHURNED_COLOR.filled())),
    )?;

    Ok(())
}

/// Overlaid histograms sharing one binning across all series
fn draw_histogram(
    area: &Panel<'_>,
    title: &str,
    x_desc: &str,
    series: &[(&str, &[f64], RGBColor)],
    bins: usize,
) -> crate::Result<()> {
    let x_range = padded_range(series.iter().flat_map(|s| s.1.iter().copied()));
    let binning = Binning::equal_width(x_range.start, x_range.end, bins)?;
    let counts: Vec<Vec<usize>> = series
        .iter()
        .map(|(_, values, _)| histogram_counts(&binning, values))
        .collect();
    let top = counts.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", CAPTION_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, 0f64..top * 1.1)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Customer Count")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for ((name, _, color), counts) in series.iter().zip(&counts) {
        let fill = color.mix(0.6);
        chart
            .draw_series(counts.iter().enumerate().filter(|(_, c)| **c > 0).map(
                |(i, &count)| {
                    let bin = binning.interval(i);
                    Rectangle::new([(bin.lower, 0.0), (bin.upper, count as f64)], fill.filled())
                },
            ))?
            .label(*name)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], fill.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_tenure_scatter(area: &Panel<'_>, dataset: &Dataset) -> crate::Result<()> {
    let x_range = padded_range(dataset.iter().map(|r| f64::from(r.tenure_months)));
    let y_range = padded_range(dataset.iter().map(|r| r.total_charges));

    let mut chart = ChartBuilder::on(area)
        .caption("Tenure vs Total Charges", ("sans-serif", CAPTION_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Tenure (Months)")
        .y_desc("Total Charges ($)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (churned, color, name) in [(false, NEGATIVE_COLOR, "Stayed"), (true, CHURNED_COLOR, "Churned")] {
        let style = color.mix(0.5).filled();
        chart
            .draw_series(
                dataset
                    .iter()
                    .filter(|r| r.churned == churned)
                    .map(|r| Circle::new((f64::from(r.tenure_months), r.total_charges), 2, style)),
            )?
            .label(name)
            .legend(move |(x, y)| Circle::new((x + 5, y), 3, style));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// Grid of colored cells with their values written in, first row on top.
/// `None` cells are drawn gray and left blank.
fn draw_heatmap(
    area: &Panel<'_>,
    title: &str,
    row_labels: &[String],
    col_labels: &[String],
    cells: &[Vec<Option<f64>>],
    color_of: impl Fn(f64) -> RGBColor,
    format_cell: impl Fn(f64) -> String,
) -> crate::Result<()> {
    let rows = row_labels.len();
    // y grows upwards, so the labels are looked up bottom to top
    let y_labels: Vec<String> = row_labels.iter().rev().cloned().collect();

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", CAPTION_SIZE))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(110)
        .build_cartesian_2d(category_range(col_labels.len()), category_range(rows))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(col_labels.len())
        .y_labels(rows)
        .x_label_formatter(&|x| category_label(col_labels, *x))
        .y_label_formatter(&|y| category_label(&y_labels, *y))
        .label_style(("sans-serif", LABEL_SIZE))
        .draw()?;

    let cols = col_labels.len();
    let cell_at = |i: usize, j: usize| cells.get(i).and_then(|row| row.get(j)).copied().flatten();
    let positions = move || (0..rows).flat_map(move |i| (0..cols).map(move |j| (i, j)));

    chart.draw_series(positions().map(|(i, j)| {
        let (x, y) = (j as f64, (rows - 1 - i) as f64);
        let color = cell_at(i, j).map_or(MISSING_CELL_COLOR, &color_of);
        Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
    }))?;

    let value_style = ("sans-serif", LABEL_SIZE)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    chart.draw_series(positions().filter_map(|(i, j)| {
        let value = cell_at(i, j)?;
        let (x, y) = (j as f64, (rows - 1 - i) as f64);
        Some(Text::new(format_cell(value), (x, y), value_style.clone()))
    }))?;

    Ok(())
}

/// Horizontal bars of signed values, first item on top
fn draw_ranking(area: &Panel<'_>, title: &str, items: &[(String, f64)]) -> crate::Result<()> {
    let n = items.len();
    let reach = items.iter().map(|(_, v)| v.abs()).fold(0.0, f64::max).max(0.1) * 1.3;
    let labels: Vec<String> = items.iter().rev().map(|(name, _)| name.clone()).collect();

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", CAPTION_SIZE))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(110)
        .build_cartesian_2d(-reach..reach, category_range(n))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&|y| category_label(&labels, *y))
        .x_desc("Correlation Coefficient")
        .draw()?;

    chart.draw_series(items.iter().enumerate().map(|(i, (_, value))| {
        let y = (n - 1 - i) as f64;
        let color = if *value > 0.0 { CHURNED_COLOR } else { NEGATIVE_COLOR };
        Rectangle::new([(0.0, y - 0.35), (*value, y + 0.35)], color.filled())
    }))?;

    chart.draw_series(LineSeries::new(
        [(0.0, -0.5), (0.0, n as f64 - 0.5)],
        BLACK.stroke_width(1),
    ))?;

    let value_style = ("sans-serif", LABEL_SIZE).into_font().color(&BLACK);
    chart.draw_series(items.iter().enumerate().map(|(i, (_, value))| {
        let y = (n - 1 - i) as f64;
        let (anchor, offset) = if *value >= 0.0 {
            (HPos::Left, 0.01)
        } else {
            (HPos::Right, -0.01)
        };
        Text::new(
            format!("{:.3}", value),
            (value + offset, y),
            value_style.clone().pos(Pos::new(anchor, VPos::Center)),
        )
    }))?;

    Ok(())
}

/// One group of a summary as drawn by `draw_counts_with_rate`
#[derive(Debug, Clone, PartialEq)]
struct GroupBar {
    label: String,
    count: usize,
    churn_rate: f64,
}

fn group_bars(summary: &AggregateSummary) -> Vec<GroupBar> {
    summary
        .iter()
        .map(|g| GroupBar {
            label: summary.label(&g.key),
            count: g.count,
            churn_rate: g.churn_rate,
        })
        .collect()
}

/// Labels and churn rates of a summary, optionally ascending by rate
fn rate_bars(summary: &AggregateSummary, ascending: bool) -> (Vec<String>, Vec<f64>) {
    let groups = if ascending {
        summary.sorted_by_rate(false)
    } else {
        summary.iter().collect()
    };
    groups
        .into_iter()
        .map(|g| (summary.label(&g.key), g.churn_rate))
        .unzip()
}

/// Axis range placing `n` categories at the integers `0..n`
fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Label of the category at tick `x`; ticks between categories stay blank
fn category_label(labels: &[String], x: f64) -> String {
    let index = x.round();
    if (x - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Range spanning the values with 5% padding; `0..1` when there are none
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return 0.0..1.0;
    }
    if lo == hi {
        return (lo - 1.0)..(hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

/// Records per bin; values outside the binning are skipped
fn histogram_counts(binning: &Binning, values: &[f64]) -> Vec<usize> {
    let mut counts = vec![0; binning.bins()];
    for &value in values {
        if let Some(index) = binning.locate(value) {
            counts[index] += 1;
        }
    }
    counts
}

fn lerp_color(from: RGBColor, to: RGBColor, t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let channel = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    RGBColor(
        channel(from.0, to.0),
        channel(from.1, to.1),
        channel(from.2, to.2),
    )
}

/// Pale yellow at 0 to dark red at 1
fn sequential_color(t: f64) -> RGBColor {
    lerp_color(RGBColor(255, 255, 204), RGBColor(189, 0, 38), t)
}

/// Blue for -1, white for 0, red for 1
fn diverging_color(r: f64) -> RGBColor {
    const COLD: RGBColor = RGBColor(59, 76, 192);
    const HOT: RGBColor = RGBColor(180, 4, 38);
    if r < 0.0 {
        lerp_color(WHITE, COLD, -r)
    } else {
        lerp_color(WHITE, HOT, r)
    }
}
