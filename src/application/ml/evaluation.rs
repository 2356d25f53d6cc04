use super::predictor::Regressor;
use crate::domain::errors::AnalysisError;
use crate::domain::ml::LaggedFeatures;
use crate::domain::performance::EvaluationMetrics;

/// Scores `model` on a held-out set without mutating it
pub fn evaluate_model(
    model: &dyn Regressor,
    data: &LaggedFeatures,
) -> Result<(EvaluationMetrics, Vec<f64>), AnalysisError> {
    let predictions = model.predict(&data.rows)?;
    Ok((EvaluationMetrics::calculate(&data.targets, &predictions), predictions))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Regressor for Echo {
        fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, AnalysisError> {
            Ok(rows.iter().map(|r| r[0]).collect())
        }
        fn name(&self) -> &str {
            "last close"
        }
    }

    #[test]
    fn test_last_close_model_on_linear_series() {
        let closes: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).collect();
        let data = LaggedFeatures::build(&closes, 2).unwrap();
        let (metrics, predictions) = evaluate_model(&Echo, &data).unwrap();

        // Every prediction lags the target by exactly one
        assert_eq!(predictions.len(), 8);
        assert!((metrics.mse - 1.0).abs() < 1e-12);
        assert!(metrics.r2 < 1.0);
    }
}
