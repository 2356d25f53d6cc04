use super::descriptive::median;
use crate::domain::errors::AnalysisError;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeveneTest {
    pub statistic: f64,
    pub p_value: f64,
}

impl LeveneTest {
    /// Equal variances are not rejected at level `alpha`
    pub fn is_homoscedastic(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Brown-Forsythe variant of Levene's test (deviations from group medians)
pub fn levene(groups: &[Vec<f64>]) -> Result<LeveneTest, AnalysisError> {
    let k = groups.len();
    if k < 2 {
        return Err(AnalysisError::insufficient("levene groups", 2, k));
    }
    if let Some(short) = groups.iter().find(|g| g.is_empty()) {
        return Err(AnalysisError::insufficient("levene group size", 1, short.len()));
    }
    let total: usize = groups.iter().map(Vec::len).sum();
    if total <= k {
        return Err(AnalysisError::insufficient("levene observations", k + 1, total));
    }

    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let center = median(g).unwrap_or(0.0);
            g.iter().map(|v| (v - center).abs()).collect()
        })
        .collect();

    let group_means: Vec<f64> = deviations
        .iter()
        .map(|z| z.iter().sum::<f64>() / z.len() as f64)
        .collect();
    let grand_mean = deviations.iter().flatten().sum::<f64>() / total as f64;

    let between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.len() as f64 * (m - grand_mean).powi(2))
        .sum();
    let within: f64 = deviations
        .iter()
        .zip(&group_means)
        .flat_map(|(z, m)| z.iter().map(move |v| (v - m).powi(2)))
        .sum();
    if within <= f64::EPSILON {
        return Err(AnalysisError::numerical("levene", "zero within-group spread"));
    }

    let df_between = (k - 1) as f64;
    let df_within = (total - k) as f64;
    let statistic = (df_within / df_between) * between / within;

    let dist = FisherSnedecor::new(df_between, df_within)
        .map_err(|e| AnalysisError::numerical("levene", e))?;

    Ok(LeveneTest {
        statistic,
        p_value: dist.sf(statistic),
    })
}
