/// Shared regression statistics for comparing predictions with observations.
pub struct Stats;

/// Least-squares line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn equation(&self) -> String {
        format!("y = {:.4} * x + {:.4}", self.slope, self.intercept)
    }
}

impl Stats {
    /// Fit `ys` against `xs` by ordinary least squares.
    ///
    /// Returns None with fewer than two points or constant `xs`.
    pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return None;
        }
        let (x, y) = (&xs[..n], &ys[..n]);

        let mean_x = x.iter().sum::<f64>() / n as f64;
        let mean_y = y.iter().sum::<f64>() / n as f64;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        for i in 0..n {
            let dx = x[i] - mean_x;
            cov += dx * (y[i] - mean_y);
            var_x += dx * dx;
        }

        if var_x <= 1e-12 {
            return None;
        }
        let slope = cov / var_x;
        Some(LinearFit {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    /// Pearson correlation; None when either side has zero variance
    pub fn correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return None;
        }
        let (x, y) = (&xs[..n], &ys[..n]);

        let mean_x = x.iter().sum::<f64>() / n as f64;
        let mean_y = y.iter().sum::<f64>() / n as f64;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for i in 0..n {
            let dx = x[i] - mean_x;
            let dy = y[i] - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        if var_x <= 1e-12 || var_y <= 1e-12 {
            return None;
        }
        Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
    }

    /// Population standard deviation of the residuals `y_true - y_pred`
    pub fn residual_std_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
        let residuals: Vec<f64> = y_true.iter().zip(y_pred).map(|(t, p)| t - p).collect();
        if residuals.is_empty() {
            return 0.0;
        }
        let n = residuals.len() as f64;
        let mean = residuals.iter().sum::<f64>() / n;
        (residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_fit() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![3.0, 5.0, 7.0, 9.0];
        let fit = Stats::linear_fit(&x, &y).unwrap();

        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert_eq!(fit.equation(), "y = 2.0000 * x + 1.0000");
    }

    #[test]
    fn test_linear_fit_degenerate() {
        assert!(Stats::linear_fit(&[1.0], &[2.0]).is_none());
        assert!(Stats::linear_fit(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn test_correlation() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let up = vec![2.0, 4.0, 6.0, 8.0];
        let down = vec![8.0, 6.0, 4.0, 2.0];

        assert!((Stats::correlation(&x, &up).unwrap() - 1.0).abs() < 1e-9);
        assert!((Stats::correlation(&x, &down).unwrap() + 1.0).abs() < 1e-9);
        assert!(Stats::correlation(&x, &[5.0, 5.0, 5.0, 5.0]).is_none());
    }

    #[test]
    fn test_residual_std_error() {
        // Residuals: 1, -1, 1, -1 -> mean 0, population std 1
        let truth = vec![11.0, 9.0, 11.0, 9.0];
        let pred = vec![10.0, 10.0, 10.0, 10.0];
        assert!((Stats::residual_std_error(&truth, &pred) - 1.0).abs() < 1e-12);

        // A constant offset has zero spread
        let shifted = vec![12.0, 10.0, 12.0, 10.0];
        assert!(Stats::residual_std_error(&truth, &shifted).abs() < 1e-12);
    }
}
