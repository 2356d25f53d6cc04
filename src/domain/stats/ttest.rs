use super::descriptive::sample_std;
use crate::domain::errors::AnalysisError;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// One-sample t-test of H0: mean >= mu0 against H1: mean < mu0
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OneSampleTTest {
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub t_statistic: f64,
    pub df: usize,
    pub p_value: f64,
}

impl OneSampleTTest {
    pub fn rejects_null(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

pub fn one_sample_lower_tail(sample: &[f64], mu0: f64) -> Result<OneSampleTTest, AnalysisError> {
    let n = sample.len();
    if n < 2 {
        return Err(AnalysisError::insufficient("t-test", 2, n));
    }
    let mean = sample.iter().sum::<f64>() / n as f64;
    let std_dev = sample_std(sample).unwrap_or(0.0);
    if std_dev <= f64::EPSILON {
        return Err(AnalysisError::numerical("t-test", "zero sample variance"));
    }

    let t_statistic = (mean - mu0) / (std_dev / (n as f64).sqrt());
    let df = n - 1;
    let dist = StudentsT::new(0.0, 1.0, df as f64).map_err(|e| AnalysisError::numerical("t-test", e))?;

    Ok(OneSampleTTest {
        n,
        mean,
        std_dev,
        t_statistic,
        df,
        p_value: dist.cdf(t_statistic),
    })
}
