//! Per-asset summary statistics of closing prices and the distribution charts.

use crate::domain::market::{CryptoSymbol, MarketDataset, PriceTable};
use crate::domain::ports::{AnalysisContext, ChartKind, ChartRequest, DatedSeries, Panel};
use crate::domain::stats::DescriptiveSummary;
use crate::domain::stats::descriptive::{mode, rolling_mean, rolling_median};
use crate::infrastructure::reporting::write_records;
use anyhow::{Result, bail};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{info, info_span};

pub const SUMMARY_FILE: &str = "descriptive_summary.csv";
const ROLLING_WINDOW: usize = 7;
const HISTOGRAM_BINS: usize = 50;
const GRID_COLUMNS: usize = 2;

/// Flat summary row, one per asset (CSV friendly)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub symbol: CryptoSymbol,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub coef_var: f64,
}

impl SummaryRow {
    fn new(symbol: CryptoSymbol, s: &DescriptiveSummary) -> Self {
        Self {
            symbol,
            mean: s.mean,
            median: s.median,
            std_dev: s.std_dev,
            variance: s.variance,
            min: s.min,
            max: s.max,
            range: s.range,
            coef_var: s.coef_var,
        }
    }
}

pub fn summarize(dataset: &MarketDataset) -> Vec<SummaryRow> {
    dataset
        .iter()
        .filter_map(|(symbol, table)| table.close_summary().map(|s| SummaryRow::new(*symbol, &s)))
        .collect()
}

/// The `n` rows with the largest `key`, NaN keys last
pub fn top_by(rows: &[SummaryRow], n: usize, key: impl Fn(&SummaryRow) -> f64) -> Vec<&SummaryRow> {
    let mut sorted: Vec<&SummaryRow> = rows.iter().collect();
    sorted.sort_by(|a, b| match (key(a).is_nan(), key(b).is_nan()) {
        (false, false) => key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    });
    sorted.truncate(n);
    sorted
}

pub fn run(ctx: &mut AnalysisContext<'_>, dataset: &MarketDataset) -> Result<Vec<SummaryRow>> {
    let _span = info_span!("descriptive", assets = dataset.len()).entered();
    if dataset.is_empty() {
        bail!("No price data loaded from {}", ctx.config.data.data_dir.display());
    }

    let rows = summarize(dataset);
    info!("Computed close summaries for {} assets", rows.len());

    let csv_path = ctx.config.data.figures_dir.join(SUMMARY_FILE);
    write_records(&csv_path, &rows)?;

    ctx.report.heading("Closing price summary per asset");
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.symbol.to_string(),
                format!("{:.4}", r.mean),
                format!("{:.4}", r.median),
                format!("{:.4}", r.std_dev),
                format!("{:.4}", r.variance),
                format!("{:.4}", r.range),
                format!("{:.4}", r.coef_var),
            ]
        })
        .collect();
    ctx.report.table(
        &["Asset", "Mean", "Median", "Std", "Variance", "Range", "CV"],
        &table,
    );

    let rankings: [(&str, fn(&SummaryRow) -> f64); 3] = [
        ("standard deviation", |r| r.std_dev),
        ("range", |r| r.range),
        ("coefficient of variation", |r| r.coef_var),
    ];
    for (label, key) in rankings {
        ctx.report.heading(&format!("Top 3 assets by {}", label));
        let top: Vec<Vec<String>> = top_by(&rows, 3, key)
            .into_iter()
            .map(|r| vec![r.symbol.to_string(), format!("{:.4}", key(r))])
            .collect();
        ctx.report.table(&["Asset", label], &top);
    }
    ctx.report.line(&format!("Summary written to {}", csv_path.display()));

    for chart in distribution_charts(dataset, &rows) {
        ctx.charts.render(&chart);
    }
    Ok(rows)
}

fn close_groups(dataset: &MarketDataset) -> Vec<(String, Vec<f64>)> {
    dataset
        .iter()
        .map(|(symbol, table)| (symbol.to_string(), table.closes()))
        .collect()
}

/// Close with 7-day rolling mean/median and the mode as a flat line, over dates
fn trend_series(table: &PriceTable) -> Vec<DatedSeries> {
    let closes = table.closes();
    let dates = table.dates();

    let mut series = vec![
        DatedSeries::aligned("Close", &dates, closes.iter().copied().map(Some)),
        DatedSeries::aligned("7d mean", &dates, rolling_mean(&closes, ROLLING_WINDOW)),
        DatedSeries::aligned("7d median", &dates, rolling_median(&closes, ROLLING_WINDOW)),
    ];
    if let (Some(m), Some(first), Some(last)) = (mode(&closes), dates.first(), dates.last()) {
        series.push(DatedSeries {
            label: format!("Mode: {:.2}", m),
            points: vec![(*first, m), (*last, m)],
        });
    }
    series
}

pub fn trend_chart(table: &PriceTable) -> ChartRequest {
    let ticker = table.symbol().ticker();
    ChartRequest {
        file_stem: format!("cryptos/{}_trend", ticker),
        title: format!("{} - Close with mean, median and mode", ticker),
        x_label: "Date".to_string(),
        y_label: "Price".to_string(),
        kind: ChartKind::TimeSeries {
            series: trend_series(table),
        },
    }
}

/// Every asset's trend chart as one panel of a single figure
pub fn trend_grid(dataset: &MarketDataset) -> ChartRequest {
    ChartRequest {
        file_stem: "close_trends_all".to_string(),
        title: "Close with mean, median and mode per asset".to_string(),
        x_label: "Date".to_string(),
        y_label: "Price".to_string(),
        kind: ChartKind::Grid {
            panels: dataset
                .iter()
                .map(|(symbol, table)| Panel {
                    title: symbol.to_string(),
                    series: trend_series(table),
                })
                .collect(),
            columns: GRID_COLUMNS,
        },
    }
}

fn distribution_charts(dataset: &MarketDataset, rows: &[SummaryRow]) -> Vec<ChartRequest> {
    let mut charts = vec![
        ChartRequest {
            file_stem: "close_boxplot".to_string(),
            title: "Closing price per asset".to_string(),
            x_label: "Asset".to_string(),
            y_label: "Close".to_string(),
            kind: ChartKind::BoxPlot {
                groups: close_groups(dataset),
            },
        },
        ChartRequest {
            file_stem: "close_histogram".to_string(),
            title: "Distribution of closing prices".to_string(),
            x_label: "Close".to_string(),
            y_label: "Frequency".to_string(),
            kind: ChartKind::Histogram {
                groups: close_groups(dataset),
                bins: HISTOGRAM_BINS,
            },
        },
        ChartRequest {
            file_stem: "close_variability".to_string(),
            title: "Standard deviation per asset (log scale)".to_string(),
            x_label: "Asset".to_string(),
            y_label: "Std".to_string(),
            kind: ChartKind::Bars {
                values: rows.iter().map(|r| (r.symbol.to_string(), r.std_dev)).collect(),
                log_scale: true,
            },
        },
    ];
    charts.extend(dataset.iter().map(|(_, table)| trend_chart(table)));
    charts.push(trend_grid(dataset));
    charts
}
