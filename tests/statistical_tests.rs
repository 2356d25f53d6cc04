use chrono::{Days, NaiveDate};
use cryptostat::application::analysis::anova::{self, AnovaOutcome, AnovaRequest};
use cryptostat::application::analysis::hypothesis::{self, HypothesisRequest, MeanReturnOutcome};
use cryptostat::config::Config;
use cryptostat::domain::market::{CryptoSymbol, DailyBar, MarketDataset, Period, PriceTable};
use cryptostat::domain::ports::AnalysisContext;
use cryptostat::domain::stats::{levene, one_sample_lower_tail, one_way_anova, shapiro_wilk};
use cryptostat::infrastructure::reporting::{BufferedReport, NoCharts};

/// Deterministic wiggly daily series with a per-asset drift and trade count
fn synthetic(symbol: CryptoSymbol, drift: f64, phase: f64, trades: f64, days: usize) -> PriceTable {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let mut close = 100.0;
    let bars = (0..days)
        .map(|i| {
            let step = drift + 0.02 * ((i as f64 * 1.7 + phase).sin() + 0.5 * (i as f64 * 0.37 + phase).cos());
            close *= 1.0 + step;
            DailyBar {
                trade_count: Some(trades),
                ..DailyBar::from_close(start.checked_add_days(Days::new(i as u64)).unwrap(), close)
            }
        })
        .collect();
    PriceTable::new(symbol, bars).unwrap()
}

fn dataset() -> MarketDataset {
    [
        synthetic(CryptoSymbol::Btc, 0.001, 0.0, 900.0, 400),
        synthetic(CryptoSymbol::Eth, 0.002, 1.0, 700.0, 400),
        synthetic(CryptoSymbol::Sol, -0.001, 2.0, 300.0, 400),
        synthetic(CryptoSymbol::Ada, 0.0, 3.0, 100.0, 400),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_reference_values() {
    let sw = shapiro_wilk(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]).unwrap();
    assert!((sw.w - 0.97016).abs() < 1e-4);

    let anova = one_way_anova(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]]).unwrap();
    assert!((anova.f_statistic - 27.0).abs() < 1e-9);
    assert!((anova.p_value - 0.001).abs() < 1e-6);

    let lev = levene(&[vec![1.0, 2.0, 3.0], vec![1.0, 5.0, 9.0]]).unwrap();
    assert!(lev.statistic > 0.0);

    let t = one_sample_lower_tail(&[1.0, 2.0, 3.0, 4.0, 5.0], 5.0).unwrap();
    assert!((t.p_value - 0.0237103).abs() < 1e-6);
}

#[test]
fn test_anova_pipeline_reports_every_group() {
    let config = Config::default();
    let mut report = BufferedReport::new();
    let mut ctx = AnalysisContext::new(&config, &mut report, &NoCharts);

    let request = AnovaRequest {
        period: Period::Week,
        window_size: 12,
    };
    let result = anova::run(&mut ctx, &dataset(), &request).unwrap();

    assert_eq!(result.buckets.len(), 12);
    assert_eq!(result.overall.normality.len(), 4);
    for check in &result.overall.normality {
        assert_eq!(check.is_normal, result.overall.retained.contains(&check.symbol));
    }

    let low = result.low_trade.as_ref().unwrap();
    let high = result.high_trade.as_ref().unwrap();
    let low_symbols: Vec<CryptoSymbol> = low.normality.iter().map(|c| c.symbol).collect();
    let high_symbols: Vec<CryptoSymbol> = high.normality.iter().map(|c| c.symbol).collect();
    assert_eq!(low_symbols, vec![CryptoSymbol::Ada, CryptoSymbol::Sol]);
    assert_eq!(high_symbols, vec![CryptoSymbol::Btc, CryptoSymbol::Eth]);

    match &result.overall.outcome {
        AnovaOutcome::Computed { anova, .. } => {
            assert!(anova.p_value >= 0.0 && anova.p_value <= 1.0);
            assert!(report.contains("Source"));
        }
        AnovaOutcome::Undefined { reason } => assert!(report.contains(reason)),
    }
    assert!(report.contains("ANOVA grouped by trade count"));
}

#[test]
fn test_single_asset_anova_is_rejected() {
    let config = Config::default();
    let mut report = BufferedReport::new();
    let mut ctx = AnalysisContext::new(&config, &mut report, &NoCharts);
    let single: MarketDataset = std::iter::once(synthetic(CryptoSymbol::Btc, 0.0, 0.0, 1.0, 60)).collect();

    assert!(anova::run(&mut ctx, &single, &AnovaRequest::default()).is_err());
}

#[test]
fn test_hypothesis_pipeline_outcomes() {
    let config = Config::default();
    let mut report = BufferedReport::new();
    let mut ctx = AnalysisContext::new(&config, &mut report, &NoCharts);

    let monthly = hypothesis::run(&mut ctx, &dataset(), &HypothesisRequest::default()).unwrap();
    assert_eq!(monthly.len(), 4);
    for result in &monthly {
        match &result.outcome {
            MeanReturnOutcome::Tested { test, .. } => {
                assert_eq!(test.n, 6);
                assert!(test.p_value >= 0.0 && test.p_value <= 1.0);
            }
            MeanReturnOutcome::NonNormal { mean, .. } => assert!(mean.is_finite()),
            other => panic!("unexpected outcome for {}: {:?}", result.symbol, other),
        }
    }

    let daily = hypothesis::run(
        &mut ctx,
        &dataset(),
        &HypothesisRequest {
            expected_return: 0.0,
            daily: true,
        },
    )
    .unwrap();
    assert!(daily.iter().all(|r| !matches!(r.outcome, MeanReturnOutcome::Insufficient { .. })));
}
