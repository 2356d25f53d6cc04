//! Console rendering and JSON export of comparison results.

use super::harness::ComparisonReport;
use crate::domain::ports::{ChartKind, ChartRequest, NamedSeries, ReportSink};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

/// Writes the ranking table and the MLP standard-error gap
pub fn render_comparison(report: &ComparisonReport, sink: &mut dyn ReportSink) {
    sink.heading(&format!("Model comparison for {}", report.symbol));

    let rows: Vec<Vec<String>> = report
        .records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.model.clone(),
                format!("{:.4}", r.mse),
                format!("{:.4}", r.r2),
                fmt_optional(r.correlation),
                format!("{:.4}", r.std_error),
                format!("{:.2}", r.final_balance),
                r.equation.clone(),
            ]
        })
        .collect();
    sink.table(
        &["#", "Model", "MSE", "R2", "Corr", "StdErr", "Balance", "Equation"],
        &rows,
    );

    if let Some(hold) = report.buy_and_hold.last() {
        sink.line(&format!("Buy-and-hold reference (not ranked): {:.2}", hold));
    }
    match &report.std_error_gap {
        Some(gap) => sink.line(&format!(
            "MLP standard error minus {} standard error: {:+.4}",
            gap.reference_model,
            gap.difference()
        )),
        None => sink.line("No reference model to compare the MLP against"),
    }
}

/// Balance trajectories (buy-and-hold included) and the true-vs-predicted scatter
pub fn comparison_charts(report: &ComparisonReport) -> Vec<ChartRequest> {
    let ticker = report.symbol.ticker();

    let mut balances: Vec<NamedSeries> = report
        .traces
        .iter()
        .map(|t| NamedSeries::indexed(t.model.clone(), &t.balances))
        .collect();
    balances.push(NamedSeries::indexed("Buy & Hold", &report.buy_and_hold));

    let scatter = report
        .traces
        .iter()
        .map(|t| NamedSeries {
            label: t.model.clone(),
            points: report.actual.iter().copied().zip(t.predictions.iter().copied()).collect(),
        })
        .collect();

    vec![
        ChartRequest {
            file_stem: format!("{}_balance_evolution", ticker),
            title: format!("{} - Balance evolution per model", ticker),
            x_label: "Day".to_string(),
            y_label: "Balance ($)".to_string(),
            kind: ChartKind::Lines { series: balances },
        },
        ChartRequest {
            file_stem: format!("{}_models_scatter", ticker),
            title: format!("{} - Actual vs predicted, all models", ticker),
            x_label: "Actual".to_string(),
            y_label: "Predicted".to_string(),
            kind: ChartKind::Scatter { series: scatter },
        },
    ]
}

/// Serialises the report as pretty JSON under `output_dir`; returns the file path
pub fn write_comparison_json(report: &ComparisonReport, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let path = output_dir.join(format!("comparison_{}.json", report.symbol.ticker()));
    let json = serde_json::to_string_pretty(report).context("Failed to serialize comparison report")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
