//! Shapiro-Wilk normality test (Royston 1992/1995 approximation).

use crate::domain::errors::AnalysisError;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;

const MIN_SAMPLES: usize = 3;
const MAX_SAMPLES: usize = 5000;

// Polynomial coefficients of the coefficient and p-value approximations
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const GAMMA: [f64; 2] = [-2.273, 0.459];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
}

impl ShapiroWilk {
    /// Normality is not rejected at level `alpha`
    pub fn is_normal(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }

    /// Like [`ShapiroWilk::is_normal`] but a p-value equal to `alpha` still passes
    pub fn is_normal_inclusive(&self, alpha: f64) -> bool {
        self.p_value >= alpha
    }
}

/// Shapiro-Wilk W statistic and p-value of `sample`.
///
/// Requires 3..=5000 finite values that are not all equal.
pub fn shapiro_wilk(sample: &[f64]) -> Result<ShapiroWilk, AnalysisError> {
    let mut x: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
    let n = x.len();
    if n < MIN_SAMPLES {
        return Err(AnalysisError::insufficient("shapiro-wilk", MIN_SAMPLES, n));
    }
    if n > MAX_SAMPLES {
        return Err(AnalysisError::numerical(
            "shapiro-wilk",
            format!("sample size {} exceeds {}", n, MAX_SAMPLES),
        ));
    }
    x.sort_by(f64::total_cmp);
    if x[n - 1] - x[0] < 1e-19 {
        return Err(AnalysisError::numerical("shapiro-wilk", "all values are identical"));
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| AnalysisError::numerical("shapiro-wilk", e))?;
    let coefficients = coefficients(n, &normal);

    let mean = x.iter().sum::<f64>() / n as f64;
    let ssq: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let numerator: f64 = coefficients
        .iter()
        .enumerate()
        .map(|(i, a)| a * (x[n - 1 - i] - x[i]))
        .sum();
    let w = (numerator * numerator / ssq).min(1.0);

    Ok(ShapiroWilk {
        w,
        p_value: p_value(w, n, &normal),
    })
}

/// Upper-half coefficients `a_n, a_{n-1}, ..`; the lower half is antisymmetric
fn coefficients(n: usize, normal: &Normal) -> Vec<f64> {
    let half = n / 2;
    if n == 3 {
        return vec![0.5f64.sqrt()];
    }

    let m: Vec<f64> = (1..=n)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
        .collect();
    let summ2: f64 = m.iter().map(|v| v * v).sum();
    let ssumm2 = summ2.sqrt();
    let u = 1.0 / (n as f64).sqrt();

    let m_n = m[n - 1];
    let m_n1 = m[n - 2];
    let a_n = m_n / ssumm2 + poly(&C1, u);

    let mut a = vec![0.0; half];
    a[0] = a_n;
    let (start, fac) = if n > 5 {
        let a_n1 = m_n1 / ssumm2 + poly(&C2, u);
        a[1] = a_n1;
        let fac = ((summ2 - 2.0 * m_n * m_n - 2.0 * m_n1 * m_n1)
            / (1.0 - 2.0 * a_n * a_n - 2.0 * a_n1 * a_n1))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m_n * m_n) / (1.0 - 2.0 * a_n * a_n)).sqrt();
        (1, fac)
    };
    for (i, coefficient) in a.iter_mut().enumerate().skip(start) {
        *coefficient = m[n - 1 - i] / fac;
    }
    a
}

fn p_value(w: f64, n: usize, normal: &Normal) -> f64 {
    if n == 3 {
        let p = 6.0 / PI * ((w.sqrt()).asin() - PI / 3.0);
        return p.clamp(0.0, 1.0);
    }

    let mut w1 = (1.0 - w).ln();
    let nf = n as f64;
    let (mu, sigma) = if n <= 11 {
        let gamma = poly(&GAMMA, nf);
        if w1 >= gamma {
            return 0.0;
        }
        w1 = -(gamma - w1).ln();
        (poly(&C3, nf), poly(&C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    // Perfectly normal-looking samples give w = 1 and ln(0)
    if !w1.is_finite() {
        return 1.0;
    }
    (1.0 - normal.cdf((w1 - mu) / sigma)).clamp(0.0, 1.0)
}

fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}
