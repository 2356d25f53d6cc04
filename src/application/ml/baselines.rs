//! Least-squares baselines the MLP is compared against.

use super::predictor::{Regressor, check_rows};
use crate::domain::errors::AnalysisError;
use crate::domain::ml::LaggedFeatures;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};

type SmartLinear = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

fn fit_linear(model: &str, rows: &[Vec<f64>], targets: &[f64]) -> Result<SmartLinear, AnalysisError> {
    let x = DenseMatrix::from_2d_vec(&rows.to_vec())
        .map_err(|e| AnalysisError::training_failed(model, format!("matrix error: {}", e)))?;
    let params = LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::SVD);
    LinearRegression::fit(&x, &targets.to_vec(), params)
        .map_err(|e| AnalysisError::training_failed(model, e))
}

fn predict_linear(model: &str, fitted: &SmartLinear, rows: &[Vec<f64>]) -> Result<Vec<f64>, AnalysisError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let x = DenseMatrix::from_2d_vec(&rows.to_vec()).map_err(|e| AnalysisError::numerical(model, e))?;
    fitted.predict(&x).map_err(|e| AnalysisError::numerical(model, e))
}

fn check_training_set(model: &str, rows: &[Vec<f64>], targets: &[f64]) -> Result<usize, AnalysisError> {
    if rows.is_empty() || rows.len() != targets.len() {
        return Err(AnalysisError::training_failed(
            model,
            format!("{} rows for {} targets", rows.len(), targets.len()),
        ));
    }
    let width = rows[0].len();
    check_rows(model, rows, width)?;
    Ok(width)
}

/// Ordinary least squares on the raw lag features
pub struct LinearBaseline {
    model: SmartLinear,
    width: usize,
}

impl LinearBaseline {
    pub const NAME: &'static str = "Linear Regression";

    pub fn fit(data: &LaggedFeatures) -> Result<Self, AnalysisError> {
        let width = check_training_set(Self::NAME, &data.rows, &data.targets)?;
        Ok(Self {
            model: fit_linear(Self::NAME, &data.rows, &data.targets)?,
            width,
        })
    }
}

impl Regressor for LinearBaseline {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, AnalysisError> {
        check_rows(Self::NAME, rows, self.width)?;
        predict_linear(Self::NAME, &self.model, rows)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Feature expansion used by [`PolynomialBaseline`], shown next to its results
pub const POLY_EXPANSION: &str = "per-lag powers, no interaction terms";

/// Least squares on per-lag powers `z_j, z_j^2, .., z_j^d` of the standardised lags.
///
/// Interaction terms are left out so high degrees stay tractable.
pub struct PolynomialBaseline {
    degree: u32,
    name: String,
    mean: Vec<f64>,
    scale: Vec<f64>,
    model: SmartLinear,
}

impl PolynomialBaseline {
    pub fn fit(data: &LaggedFeatures, degree: u32) -> Result<Self, AnalysisError> {
        let name = format!("Polynomial Regression (degree {})", degree);
        if degree == 0 {
            return Err(AnalysisError::training_failed(&name, "degree must be at least 1"));
        }
        let width = check_training_set(&name, &data.rows, &data.targets)?;

        let n = data.len() as f64;
        let mean: Vec<f64> = (0..width)
            .map(|j| data.rows.iter().map(|r| r[j]).sum::<f64>() / n)
            .collect();
        let scale: Vec<f64> = (0..width)
            .map(|j| {
                let var = data.rows.iter().map(|r| (r[j] - mean[j]).powi(2)).sum::<f64>() / n;
                if var.sqrt() > 1e-12 { var.sqrt() } else { 1.0 }
            })
            .collect();

        let expanded = expand_powers(&data.rows, &mean, &scale, degree);
        let model = fit_linear(&name, &expanded, &data.targets)?;
        Ok(Self {
            degree,
            name,
            mean,
            scale,
            model,
        })
    }

    pub fn degree(&self) -> u32 {
        self.degree
    }

    fn expand(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        expand_powers(rows, &self.mean, &self.scale, self.degree)
    }
}

fn expand_powers(rows: &[Vec<f64>], mean: &[f64], scale: &[f64], degree: u32) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .flat_map(|(j, v)| {
                    let z = (v - mean[j]) / scale[j];
                    (1..=degree).map(move |p| z.powi(p as i32))
                })
                .collect()
        })
        .collect()
}

impl Regressor for PolynomialBaseline {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, AnalysisError> {
        check_rows(&self.name, rows, self.mean.len())?;
        predict_linear(&self.name, &self.model, &self.expand(rows))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
