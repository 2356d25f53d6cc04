use chrono::NaiveDate;
use cryptostat::application::comparison::{
    ComparisonHarness, ComparisonSettings, comparison_charts, write_comparison_json,
};
use cryptostat::application::ml::MlpParams;
use cryptostat::domain::errors::AnalysisError;
use cryptostat::domain::market::{CryptoSymbol, PriceTable};
use cryptostat::domain::ports::ChartKind;
use cryptostat::domain::simulation::{SimulationParams, simulate_profit_series};

fn settings() -> ComparisonSettings {
    ComparisonSettings {
        window: 4,
        holdout: 15,
        folds: 3,
        poly_degrees: vec![2, 3, 4],
        mlp: MlpParams {
            hidden_layers: vec![8],
            max_epochs: 40,
            learning_rate: 0.01,
            ..MlpParams::default()
        },
        simulation: SimulationParams::default(),
    }
}

fn table(n: usize) -> PriceTable {
    let closes: Vec<f64> = (0..n)
        .map(|i| 30.0 + i as f64 * 0.2 + (i as f64 * 0.5).cos() * 1.5)
        .collect();
    let start = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
    PriceTable::from_closes(CryptoSymbol::Dot, start, &closes).unwrap()
}

#[test]
fn test_every_model_is_ranked_by_mse() {
    let report = ComparisonHarness::new(settings()).run(&table(100)).unwrap();

    let names: Vec<&str> = report.records.iter().map(|r| r.model.as_str()).collect();
    assert_eq!(names.len(), 5);
    for expected in [
        "MLP",
        "Linear Regression",
        "Polynomial Regression (degree 2)",
        "Polynomial Regression (degree 3)",
        "Polynomial Regression (degree 4)",
    ] {
        assert!(names.contains(&expected), "missing {}", expected);
    }
    assert!(report.records.windows(2).all(|w| w[0].mse <= w[1].mse));
    assert_eq!(report.best().unwrap().model, report.records[0].model);
    assert!(report.record("Polynomial Regression (degree 3)").unwrap().equation.contains("powers"));
}

#[test]
fn test_balances_follow_the_simulation() {
    let settings = settings();
    let report = ComparisonHarness::new(settings.clone()).run(&table(100)).unwrap();

    for trace in &report.traces {
        let expected = simulate_profit_series(&report.actual, &trace.predictions, &settings.simulation);
        assert_eq!(trace.balances, expected);
        let record = report.record(&trace.model).unwrap();
        assert_eq!(record.final_balance, *trace.balances.last().unwrap());
    }
    // buy-and-hold is carried along but never ranked
    assert_eq!(report.buy_and_hold.len(), report.actual.len());
    assert!(report.record("Buy & Hold").is_none());
}

#[test]
fn test_charts_and_json_export() {
    let report = ComparisonHarness::new(settings()).run(&table(80)).unwrap();

    let charts = comparison_charts(&report);
    assert!(matches!(&charts[0].kind, ChartKind::Lines { series } if series.len() == 6));
    assert!(matches!(&charts[1].kind, ChartKind::Scatter { series } if series.len() == 5));

    let dir = tempfile::tempdir().unwrap();
    let path = write_comparison_json(&report, dir.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 5);
    assert_eq!(json["symbol"], "DOT");
}

#[test]
fn test_short_history_is_insufficient() {
    // 4 lags over 18 closes leave 14 rows, fewer than the 15-row hold-out
    assert!(matches!(
        ComparisonHarness::new(settings()).run(&table(18)),
        Err(AnalysisError::InsufficientData { .. })
    ));
}
