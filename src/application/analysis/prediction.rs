//! Single-asset next-close prediction with a cross-validated MLP, followed
//! by a profit simulation on the test split and, optionally, the
//! multi-model comparison.

use crate::application::comparison::{
    ComparisonHarness, ComparisonReport, ComparisonSettings, comparison_charts, render_comparison,
    write_comparison_json,
};
use crate::application::ml::{evaluate_model, train_with_cross_validation};
use crate::domain::errors::AnalysisError;
use crate::domain::market::{CryptoSymbol, MarketDataset};
use crate::domain::ml::LaggedFeatures;
use crate::domain::performance::EvaluationMetrics;
use crate::domain::ports::{AnalysisContext, ChartKind, ChartRequest, NamedSeries};
use crate::domain::simulation::{SimulationSummary, simulate_profit};
use crate::domain::stats::DescriptiveSummary;
use anyhow::{Context, Result};
use tracing::{info, info_span};

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub symbol: CryptoSymbol,
    pub folds: usize,
    pub window: usize,
    pub compare: bool,
}

impl PredictionRequest {
    pub fn new(symbol: CryptoSymbol) -> Self {
        Self {
            symbol,
            folds: 5,
            window: 7,
            compare: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredictionOutcome {
    pub symbol: CryptoSymbol,
    pub close: DescriptiveSummary,
    pub metrics: EvaluationMetrics,
    pub fold_mse: Vec<f64>,
    /// Scalar simulation result, rounded to cents
    pub final_balance: f64,
    pub simulation: SimulationSummary,
    pub comparison: Option<ComparisonReport>,
}

pub fn run(
    ctx: &mut AnalysisContext<'_>,
    dataset: &MarketDataset,
    request: &PredictionRequest,
) -> Result<PredictionOutcome> {
    let _span = info_span!("predict", symbol = %request.symbol).entered();
    let table = dataset
        .get(request.symbol)
        .ok_or_else(|| AnalysisError::AssetUnavailable {
            symbol: request.symbol.to_string(),
        })?;
    let close = table
        .close_summary()
        .ok_or_else(|| AnalysisError::insufficient("close summary", 1, 0))?;

    ctx.report.heading(&format!("Close summary for {}", request.symbol));
    ctx.report.line(&format!("Mean: ${:.2}", close.mean));
    ctx.report.line(&format!("Std:  ${:.2}", close.std_dev));
    ctx.report.line(&format!("Min:  ${:.2}", close.min));
    ctx.report.line(&format!("Max:  ${:.2}", close.max));

    let model_config = &ctx.config.model;
    let features = LaggedFeatures::build(&table.closes(), request.window)?;
    let (train, test) = features
        .shuffled_split(model_config.test_fraction, model_config.random_seed)
        .context("Failed to split features into train and test sets")?;
    info!("Training on {} rows, testing on {} rows", train.len(), test.len());

    let cv = train_with_cross_validation(&train, request.folds, &model_config.mlp_params())
        .with_context(|| format!("MLP training failed for {}", request.symbol))?;
    let (metrics, predictions) = evaluate_model(&cv.model, &test)?;

    ctx.report.heading(&format!("MLP evaluation for {}", request.symbol));
    ctx.report.line(&format!(
        "Best fold: {} (validation MSE {:.4})",
        cv.best_fold + 1,
        cv.best_mse()
    ));
    ctx.report.line(&format!("MSE: {:.4}", metrics.mse));
    ctx.report.line(&format!("R2 : {:.4}", metrics.r2));
    ctx.charts.render(&real_vs_predicted_chart(request.symbol, &test.targets, &predictions));

    let params = ctx.config.simulation.params();
    let final_balance = simulate_profit(&test.targets, &predictions, &params);
    let simulation = SimulationSummary::from_run(&test.targets, &predictions, &params);
    ctx.report.line(&format!(
        "Profit simulation: final balance = ${:.2} ({} trades, {} holds, {} anomalies rejected)",
        final_balance, simulation.trades, simulation.holds, simulation.rejected_anomalies
    ));

    let comparison = if request.compare {
        let harness = ComparisonHarness::new(ComparisonSettings::from_config(ctx.config));
        let report = harness
            .run(table)
            .with_context(|| format!("Model comparison failed for {}", request.symbol))?;
        render_comparison(&report, ctx.report);
        for chart in comparison_charts(&report) {
            ctx.charts.render(&chart);
        }
        let path = write_comparison_json(&report, &ctx.config.data.figures_dir)?;
        ctx.report.line(&format!("Comparison written to {}", path.display()));
        Some(report)
    } else {
        None
    };

    Ok(PredictionOutcome {
        symbol: request.symbol,
        close,
        metrics,
        fold_mse: cv.fold_mse,
        final_balance,
        simulation,
        comparison,
    })
}

fn real_vs_predicted_chart(symbol: CryptoSymbol, actual: &[f64], predicted: &[f64]) -> ChartRequest {
    ChartRequest {
        file_stem: format!("{}_real_vs_predicted", symbol.ticker()),
        title: format!("{} - Real vs predicted", symbol),
        x_label: "Test sample".to_string(),
        y_label: "Close".to_string(),
        kind: ChartKind::Lines {
            series: vec![
                NamedSeries::indexed("Real", actual),
                NamedSeries::indexed("Predicted", predicted),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::market::PriceTable;
    use crate::infrastructure::reporting::{BufferedReport, NoCharts};
    use chrono::NaiveDate;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.model.hidden_layers = vec![8];
        config.model.max_epochs = 40;
        config.model.learning_rate = 0.01;
        config.model.holdout_days = 10;
        config.model.comparison_window = 3;
        config.model.comparison_folds = 3;
        config.model.poly_degrees = vec![2];
        config
    }

    fn dataset() -> MarketDataset {
        let closes: Vec<f64> = (0..90)
            .map(|i| 50.0 + i as f64 * 0.3 + (i as f64 * 0.7).sin() * 2.0)
            .collect();
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        std::iter::once(PriceTable::from_closes(CryptoSymbol::Sol, start, &closes).unwrap()).collect()
    }

    #[test]
    fn test_missing_asset_is_reported() {
        let config = small_config();
        let mut report = BufferedReport::new();
        let mut ctx = AnalysisContext::new(&config, &mut report, &NoCharts);

        let err = run(&mut ctx, &dataset(), &PredictionRequest::new(CryptoSymbol::Btc)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::AssetUnavailable { .. })
        ));
    }

    #[test]
    fn test_prediction_with_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config().with_figures_dir(Some(dir.path().to_path_buf()));
        let mut report = BufferedReport::new();
        let mut ctx = AnalysisContext::new(&config, &mut report, &NoCharts);

        let request = PredictionRequest {
            folds: 3,
            window: 5,
            compare: true,
            ..PredictionRequest::new(CryptoSymbol::Sol)
        };
        let outcome = run(&mut ctx, &dataset(), &request).unwrap();

        assert_eq!(outcome.fold_mse.len(), 3);
        assert!(outcome.metrics.mse >= 0.0);
        assert!(outcome.final_balance > 0.0);
        let comparison = outcome.comparison.unwrap();
        assert_eq!(comparison.records.len(), 3);
        assert!(dir.path().join("comparison_SOL.json").exists());
        assert!(report.contains("Profit simulation: final balance"));
        assert!(report.contains("Model comparison for SOL"));
    }
}
