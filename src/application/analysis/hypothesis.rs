//! One-sided test of H0: mean return >= threshold against H1: mean return < threshold.
//!
//! Returns and the threshold are both in percent. The t-test is only applied
//! when Shapiro-Wilk does not reject normality of the sample.

use crate::domain::market::{CryptoSymbol, MarketDataset, Period, PriceTable};
use crate::domain::ports::AnalysisContext;
use crate::domain::stats::descriptive::mean;
use crate::domain::stats::{OneSampleTTest, one_sample_lower_tail, shapiro_wilk};
use anyhow::{Result, bail};
use serde::Serialize;
use tracing::{info_span, warn};

/// Smallest sample the test is attempted on
pub const MIN_SAMPLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HypothesisRequest {
    /// Threshold mean return, in percent (0.2 means 0.2 %)
    pub expected_return: f64,
    /// Test daily returns over the whole history instead of recent monthly returns
    pub daily: bool,
}

impl Default for HypothesisRequest {
    fn default() -> Self {
        Self {
            expected_return: 0.2,
            daily: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MeanReturnOutcome {
    Insufficient {
        n: usize,
    },
    NonNormal {
        mean: f64,
        shapiro_p: f64,
    },
    Tested {
        test: OneSampleTTest,
        shapiro_p: f64,
        rejects_null: bool,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetHypothesis {
    pub symbol: CryptoSymbol,
    pub outcome: MeanReturnOutcome,
}

/// Percent returns between consecutive month-end closes, last `months` kept
pub fn monthly_returns_pct(table: &PriceTable, months: usize) -> Vec<f64> {
    let closes: Vec<f64> = table
        .last_close_per_period(Period::MonthEnd)
        .into_iter()
        .map(|(_, close)| close)
        .collect();
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] / w[0] - 1.0) * 100.0)
        .collect();
    returns[returns.len().saturating_sub(months)..].to_vec()
}

pub fn daily_returns_pct(table: &PriceTable) -> Vec<f64> {
    table.daily_returns().into_iter().map(|(_, r)| r * 100.0).collect()
}

pub fn test_mean_return(returns: &[f64], threshold_pct: f64, alpha: f64) -> MeanReturnOutcome {
    if returns.len() < MIN_SAMPLE {
        return MeanReturnOutcome::Insufficient { n: returns.len() };
    }

    let shapiro = match shapiro_wilk(returns) {
        Ok(s) => s,
        Err(e) => return MeanReturnOutcome::Failed { reason: e.to_string() },
    };
    if !shapiro.is_normal_inclusive(alpha) {
        return MeanReturnOutcome::NonNormal {
            mean: mean(returns).unwrap_or(f64::NAN),
            shapiro_p: shapiro.p_value,
        };
    }

    match one_sample_lower_tail(returns, threshold_pct) {
        Ok(test) => MeanReturnOutcome::Tested {
            rejects_null: test.rejects_null(alpha),
            test,
            shapiro_p: shapiro.p_value,
        },
        Err(e) => MeanReturnOutcome::Failed { reason: e.to_string() },
    }
}

pub fn run(
    ctx: &mut AnalysisContext<'_>,
    dataset: &MarketDataset,
    request: &HypothesisRequest,
) -> Result<Vec<AssetHypothesis>> {
    let _span = info_span!("hypothesis", expected = request.expected_return, daily = request.daily).entered();
    if dataset.is_empty() {
        bail!("No price data loaded from {}", ctx.config.data.data_dir.display());
    }
    let alpha = ctx.config.stats.significance_level;
    let months = ctx.config.stats.hypothesis_months;

    let scope = if request.daily {
        "daily returns".to_string()
    } else {
        format!("monthly returns, last {} months", months)
    };
    ctx.report.heading(&format!(
        "H0: mean return >= {:.2}% vs H1: mean return < {:.2}% ({})",
        request.expected_return, request.expected_return, scope
    ));

    let mut results = Vec::with_capacity(dataset.len());
    for (symbol, table) in dataset.iter() {
        let returns = if request.daily {
            daily_returns_pct(table)
        } else {
            monthly_returns_pct(table, months)
        };
        let outcome = test_mean_return(&returns, request.expected_return, alpha);

        let line = match &outcome {
            MeanReturnOutcome::Insufficient { n } => {
                warn!("{}: insufficient data for the test (n={})", symbol, n);
                format!("{:5}: insufficient data (n = {})", symbol, n)
            }
            MeanReturnOutcome::NonNormal { mean, shapiro_p } => {
                warn!("{}: returns are not normal (p = {:.4})", symbol, shapiro_p);
                format!(
                    "{:5}: mean = {:.4}%, not normal (Shapiro p = {:.4}), test not applied",
                    symbol, mean, shapiro_p
                )
            }
            MeanReturnOutcome::Tested { test, rejects_null, .. } => format!(
                "{:5}: mean = {:.4}%, t = {:.4}, p = {:.4}, {}",
                symbol,
                test.mean,
                test.t_statistic,
                test.p_value,
                if *rejects_null { "reject H0" } else { "do not reject H0" }
            ),
            MeanReturnOutcome::Failed { reason } => {
                warn!("{}: test failed: {}", symbol, reason);
                format!("{:5}: test failed ({})", symbol, reason)
            }
        };
        ctx.report.line(&line);
        results.push(AssetHypothesis {
            symbol: *symbol,
            outcome,
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::market::DailyBar;
    use crate::infrastructure::reporting::{BufferedReport, NoCharts};
    use chrono::NaiveDate;

    fn month_end_table(symbol: CryptoSymbol, closes: &[f64]) -> PriceTable {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let date = NaiveDate::from_ymd_opt(2023, i as u32 + 1, 28).unwrap();
                DailyBar::from_close(date, *c)
            })
            .collect();
        PriceTable::new(symbol, bars).unwrap()
    }

    #[test]
    fn test_monthly_returns_keep_recent_months() {
        let table = month_end_table(CryptoSymbol::Btc, &[100.0, 110.0, 99.0, 99.0, 198.0]);
        let returns = monthly_returns_pct(&table, 3);
        assert_eq!(returns.len(), 3);
        assert!((returns[0] + 10.0).abs() < 1e-9);
        assert!(returns[1].abs() < 1e-9);
        assert!((returns[2] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_sample() {
        assert_eq!(
            test_mean_return(&[1.0, 2.0], 0.2, 0.05),
            MeanReturnOutcome::Insufficient { n: 2 }
        );
    }

    #[test]
    fn test_normal_sample_is_tested() {
        // mean 3, s = sqrt(2.5), threshold 5: t = -2.8284, p = 0.0237
        match test_mean_return(&[1.0, 2.0, 3.0, 4.0, 5.0], 5.0, 0.05) {
            MeanReturnOutcome::Tested { test, rejects_null, shapiro_p } => {
                assert!((test.p_value - 0.0237103).abs() < 1e-6);
                assert!(rejects_null);
                assert!(shapiro_p > 0.05);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_shapiro_p_equal_to_alpha_is_tested() {
        let sample = [1.0, 2.0, 3.0, 4.0, 5.0];
        let alpha = shapiro_wilk(&sample).unwrap().p_value;
        assert!(matches!(
            test_mean_return(&sample, 5.0, alpha),
            MeanReturnOutcome::Tested { .. }
        ));
    }

    #[test]
    fn test_outlier_sample_is_non_normal() {
        let sample = [0.0, 0.1, 0.0, 0.2, 0.1, 0.0, 0.1, 50.0];
        assert!(matches!(
            test_mean_return(&sample, 0.2, 0.05),
            MeanReturnOutcome::NonNormal { .. }
        ));
    }

    #[test]
    fn test_constant_sample_fails() {
        assert!(matches!(
            test_mean_return(&[1.0, 1.0, 1.0, 1.0], 0.2, 0.05),
            MeanReturnOutcome::Failed { .. }
        ));
    }

    #[test]
    fn test_run_reports_every_asset() {
        let dataset: MarketDataset = [
            month_end_table(CryptoSymbol::Eth, &[100.0, 101.0, 103.0, 102.0, 104.0, 105.0, 103.0]),
            month_end_table(CryptoSymbol::Ada, &[1.0, 1.1]),
        ]
        .into_iter()
        .collect();
        let config = Config::default();
        let mut report = BufferedReport::new();
        let mut ctx = AnalysisContext::new(&config, &mut report, &NoCharts);

        let results = run(&mut ctx, &dataset, &HypothesisRequest::default()).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].symbol, CryptoSymbol::Ada);
        assert_eq!(results[0].outcome, MeanReturnOutcome::Insufficient { n: 1 });
        assert!(report.contains("insufficient data (n = 1)"));
        assert!(report.contains("ETH"));
    }
}
