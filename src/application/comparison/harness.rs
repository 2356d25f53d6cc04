use crate::application::ml::{
    LinearBaseline, MlpParams, POLY_EXPANSION, PolynomialBaseline, Regressor, train_with_cross_validation,
};
use crate::config::Config;
use crate::domain::errors::AnalysisError;
use crate::domain::market::{CryptoSymbol, PriceTable};
use crate::domain::ml::LaggedFeatures;
use crate::domain::performance::{EvaluationMetrics, Stats};
use crate::domain::simulation::{SimulationParams, buy_and_hold, simulate_profit_series};
use serde::Serialize;
use tracing::info;

const MLP_NAME: &str = "MLP";

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSettings {
    pub window: usize,
    pub holdout: usize,
    pub folds: usize,
    pub poly_degrees: Vec<u32>,
    pub mlp: MlpParams,
    pub simulation: SimulationParams,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            window: 7,
            holdout: 30,
            folds: 5,
            poly_degrees: (2..=10).collect(),
            mlp: MlpParams::default(),
            simulation: SimulationParams::default(),
        }
    }
}

impl ComparisonSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            window: config.model.comparison_window,
            holdout: config.model.holdout_days,
            folds: config.model.comparison_folds,
            poly_degrees: config.model.poly_degrees.clone(),
            mlp: config.model.mlp_params(),
            simulation: config.simulation.params(),
        }
    }
}

/// One model's scores on the hold-out window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRecord {
    pub model: String,
    pub mse: f64,
    pub r2: f64,
    /// Pearson correlation of actual and predicted closes
    pub correlation: Option<f64>,
    /// Population standard deviation of the residuals
    pub std_error: f64,
    /// Least-squares line of predicted against actual, or a model description
    pub equation: String,
    pub final_balance: f64,
}

/// Named series aligned with the hold-out window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelTrace {
    pub model: String,
    pub predictions: Vec<f64>,
    pub balances: Vec<f64>,
}

/// Residual spread of the MLP relative to the best-ranked other model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StdErrorGap {
    pub reference_model: String,
    pub mlp_std_error: f64,
    pub reference_std_error: f64,
}

impl StdErrorGap {
    /// Positive when the MLP residuals are wider
    pub fn difference(&self) -> f64 {
        self.mlp_std_error - self.reference_std_error
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub symbol: CryptoSymbol,
    /// Sorted by ascending MSE
    pub records: Vec<ComparisonRecord>,
    pub actual: Vec<f64>,
    pub traces: Vec<ModelTrace>,
    /// Illustrative reference trajectory; not part of the ranking
    pub buy_and_hold: Vec<f64>,
    pub std_error_gap: Option<StdErrorGap>,
}

impl ComparisonReport {
    pub fn best(&self) -> Option<&ComparisonRecord> {
        self.records.first()
    }

    pub fn record(&self, model: &str) -> Option<&ComparisonRecord> {
        self.records.iter().find(|r| r.model == model)
    }
}

/// Trains the MLP and the least-squares baselines on one asset and scores
/// them on the trailing hold-out window.
pub struct ComparisonHarness {
    settings: ComparisonSettings,
}

impl ComparisonHarness {
    pub fn new(settings: ComparisonSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ComparisonSettings {
        &self.settings
    }

    pub fn run(&self, table: &PriceTable) -> Result<ComparisonReport, AnalysisError> {
        let features = LaggedFeatures::build(&table.closes(), self.settings.window)?;
        let (train, test) = features.split_tail(self.settings.holdout)?;
        info!(
            "Comparing models on {}: {} training rows, {} hold-out rows",
            table.symbol(),
            train.len(),
            test.len()
        );

        let mut models: Vec<Box<dyn Regressor>> = Vec::new();
        let cv = train_with_cross_validation(&train, self.settings.folds, &self.settings.mlp)?;
        models.push(Box::new(cv.model));
        models.push(Box::new(LinearBaseline::fit(&train)?));
        for &degree in &self.settings.poly_degrees {
            models.push(Box::new(PolynomialBaseline::fit(&train, degree)?));
        }

        let actual = test.targets.clone();
        let mut records = Vec::with_capacity(models.len());
        let mut traces = Vec::with_capacity(models.len());
        for model in &models {
            let predictions = model.predict(&test.rows)?;
            let balances = simulate_profit_series(&actual, &predictions, &self.settings.simulation);
            let record = score(model.name(), &actual, &predictions, &balances);
            info!(
                "{}: MSE {:.4}, R2 {:.4}, final balance {:.2}",
                record.model, record.mse, record.r2, record.final_balance
            );
            records.push(record);
            traces.push(ModelTrace {
                model: model.name().to_string(),
                predictions,
                balances,
            });
        }

        records.sort_by(|a, b| a.mse.total_cmp(&b.mse));
        let std_error_gap = std_error_gap(&records);

        Ok(ComparisonReport {
            symbol: table.symbol(),
            buy_and_hold: buy_and_hold(&actual, self.settings.simulation.initial_balance),
            records,
            actual,
            traces,
            std_error_gap,
        })
    }
}

fn score(model: &str, actual: &[f64], predictions: &[f64], balances: &[f64]) -> ComparisonRecord {
    let metrics = EvaluationMetrics::calculate(actual, predictions);
    let equation = if model.starts_with("Polynomial") {
        format!("{} ({})", model, POLY_EXPANSION)
    } else {
        Stats::linear_fit(actual, predictions)
            .map(|fit| fit.equation())
            .unwrap_or_else(|| "n/a".to_string())
    };

    ComparisonRecord {
        model: model.to_string(),
        mse: metrics.mse,
        r2: metrics.r2,
        correlation: Stats::correlation(actual, predictions),
        std_error: Stats::residual_std_error(actual, predictions),
        equation,
        final_balance: balances.last().copied().unwrap_or(f64::NAN),
    }
}

fn std_error_gap(sorted: &[ComparisonRecord]) -> Option<StdErrorGap> {
    let mlp = sorted.iter().find(|r| r.model == MLP_NAME)?;
    let reference = sorted.iter().find(|r| r.model != MLP_NAME)?;
    Some(StdErrorGap {
        reference_model: reference.model.clone(),
        mlp_std_error: mlp.std_error,
        reference_std_error: reference.std_error,
    })
}
