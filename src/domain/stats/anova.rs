use crate::domain::errors::AnalysisError;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// One line of an ANOVA table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnovaRow {
    pub sum_sq: f64,
    pub df: usize,
    pub mean_sq: f64,
}

/// One-way ANOVA of a single group factor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneWayAnova {
    pub between: AnovaRow,
    pub within: AnovaRow,
    pub f_statistic: f64,
    pub p_value: f64,
    /// Observation minus its group mean, in input order
    pub residuals: Vec<f64>,
}

impl OneWayAnova {
    /// Equal group means are rejected at level `alpha`
    pub fn rejects_equal_means(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

pub fn one_way_anova(groups: &[Vec<f64>]) -> Result<OneWayAnova, AnalysisError> {
    let k = groups.len();
    if k < 2 {
        return Err(AnalysisError::insufficient("anova groups", 2, k));
    }
    if let Some(short) = groups.iter().find(|g| g.is_empty()) {
        return Err(AnalysisError::insufficient("anova group size", 1, short.len()));
    }
    let total: usize = groups.iter().map(Vec::len).sum();
    if total <= k {
        return Err(AnalysisError::insufficient("anova observations", k + 1, total));
    }

    let grand_mean = groups.iter().flatten().sum::<f64>() / total as f64;
    let group_means: Vec<f64> = groups
        .iter()
        .map(|g| g.iter().sum::<f64>() / g.len() as f64)
        .collect();

    let ss_between: f64 = groups
        .iter()
        .zip(&group_means)
        .map(|(g, m)| g.len() as f64 * (m - grand_mean).powi(2))
        .sum();
    let residuals: Vec<f64> = groups
        .iter()
        .zip(&group_means)
        .flat_map(|(g, m)| g.iter().map(move |v| v - m))
        .collect();
    let ss_within: f64 = residuals.iter().map(|r| r * r).sum();

    let df_between = k - 1;
    let df_within = total - k;
    let between = AnovaRow {
        sum_sq: ss_between,
        df: df_between,
        mean_sq: ss_between / df_between as f64,
    };
    let within = AnovaRow {
        sum_sq: ss_within,
        df: df_within,
        mean_sq: ss_within / df_within as f64,
    };

    if within.mean_sq <= f64::EPSILON {
        return Err(AnalysisError::numerical("anova", "zero residual variance"));
    }
    let f_statistic = between.mean_sq / within.mean_sq;
    let dist = FisherSnedecor::new(df_between as f64, df_within as f64)
        .map_err(|e| AnalysisError::numerical("anova", e))?;

    Ok(OneWayAnova {
        between,
        within,
        f_statistic,
        p_value: dist.sf(f_statistic),
        residuals,
    })
}
