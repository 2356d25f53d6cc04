use serde::Serialize;

/// Error and explained-variance metrics of a fitted model on held-out data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    pub mse: f64,
    pub r2: f64,
}

impl EvaluationMetrics {
    /// Computes metrics for paired observations and predictions.
    ///
    /// Extra elements on the longer side are ignored; an empty pair set
    /// yields `mse = 0` and `r2 = 0`.
    pub fn calculate(y_true: &[f64], y_pred: &[f64]) -> Self {
        Self {
            mse: mean_squared_error(y_true, y_pred),
            r2: r2_score(y_true, y_pred),
        }
    }
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n as f64
}

/// Coefficient of determination, at most 1 and unbounded below.
///
/// Constant targets give 1 for an exact fit and 0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return 0.0;
    }
    let truth = &y_true[..n];
    let mean = truth.iter().sum::<f64>() / n as f64;

    let ss_res: f64 = truth
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot <= f64::EPSILON {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
