use serde::Serialize;
use statrs::statistics::{Data, Distribution};

/// Location and dispersion of one numeric series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescriptiveSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1)
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    /// Amplitude `max - min`
    pub range: f64,
    /// `std_dev / mean`; NaN when the mean is zero
    pub coef_var: f64,
}

impl DescriptiveSummary {
    /// Summarise the finite values of `values`; None when none remain
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }

        let data = Data::new(finite.clone());
        let mean = data.mean()?;
        // A single observation has no sample dispersion
        let variance = if finite.len() > 1 {
            data.variance().unwrap_or(0.0)
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let coef_var = if mean != 0.0 { std_dev / mean } else { f64::NAN };

        Some(Self {
            count: finite.len(),
            mean,
            median: median(&finite)?,
            std_dev,
            variance,
            min,
            max,
            range: max - min,
            coef_var,
        })
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation; None below two observations
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Data::new(values.to_vec()).std_dev()
}

/// Most frequent value, ties broken towards the smallest
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let value = sorted[i];
        let run = sorted[i..].iter().take_while(|v| **v == value).count();
        if best.is_none_or(|(_, count)| run > count) {
            best = Some((value, run));
        }
        i += run;
    }
    best.map(|(value, _)| value)
}

/// Trailing rolling mean; the first `window - 1` positions are None
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, mean)
}

/// Trailing rolling median; the first `window - 1` positions are None
pub fn rolling_median(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, median)
}

fn rolling(values: &[f64], window: usize, f: fn(&[f64]) -> Option<f64>) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                f(&values[i + 1 - window..=i])
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let summary = DescriptiveSummary::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();

        assert_eq!(summary.count, 8);
        assert!((summary.mean - 5.0).abs() < 1e-12);
        assert!((summary.median - 4.5).abs() < 1e-12);
        // Sample variance: 32 / 7
        assert!((summary.variance - 32.0 / 7.0).abs() < 1e-9);
        assert!((summary.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-9);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        assert_eq!(summary.range, 7.0);
        assert!((summary.coef_var - summary.std_dev / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_summary_ignores_nan_and_handles_single_value() {
        let summary = DescriptiveSummary::from_values(&[f64::NAN, 3.0]).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.std_dev, 0.0);
        assert!(DescriptiveSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_mode_prefers_smallest_on_tie() {
        assert_eq!(mode(&[3.0, 1.0, 3.0, 1.0, 2.0]), Some(1.0));
        assert_eq!(mode(&[5.0, 5.0, 1.0]), Some(5.0));
        assert_eq!(mode(&[]), None);
    }

    #[test]
    fn test_rolling_windows() {
        let values = vec![1.0, 2.0, 3.0, 10.0];
        let means = rolling_mean(&values, 3);
        assert_eq!(means[0], None);
        assert_eq!(means[1], None);
        assert_eq!(means[2], Some(2.0));
        assert_eq!(means[3], Some(5.0));

        let medians = rolling_median(&values, 3);
        assert_eq!(medians[3], Some(3.0));
    }
}
