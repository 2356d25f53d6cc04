use crate::domain::errors::AnalysisError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Lag-feature matrix paired 1:1 with next-close targets.
///
/// Row `i` holds the `window` closes preceding `targets[i]`, most recent first.
#[derive(Debug, Clone, PartialEq)]
pub struct LaggedFeatures {
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    pub window: usize,
}

impl LaggedFeatures {
    /// Builds lag features over a closing-price series.
    ///
    /// Yields `closes.len() - window` rows; a window that consumes the whole
    /// series yields an empty dataset. Rows touching a non-finite value are
    /// dropped so the matrix never carries a missing value.
    pub fn build(closes: &[f64], window: usize) -> Result<Self, AnalysisError> {
        if window == 0 {
            return Err(AnalysisError::InvalidWindow { window });
        }

        let mut rows = Vec::with_capacity(closes.len().saturating_sub(window));
        let mut targets = Vec::with_capacity(rows.capacity());

        for t in window..closes.len() {
            let lags: Vec<f64> = (1..=window).map(|lag| closes[t - lag]).collect();
            let target = closes[t];
            if !target.is_finite() || lags.iter().any(|v| !v.is_finite()) {
                continue;
            }
            rows.push(lags);
            targets.push(target);
        }

        Ok(Self {
            rows,
            targets,
            window,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Holds out the last `holdout` rows, preserving time order on both sides
    pub fn split_tail(&self, holdout: usize) -> Result<(Self, Self), AnalysisError> {
        if holdout == 0 || holdout >= self.len() {
            return Err(AnalysisError::insufficient(
                "tail hold-out split",
                holdout + 1,
                self.len(),
            ));
        }
        let cut = self.len() - holdout;
        Ok((self.slice(0..cut), self.slice(cut..self.len())))
    }

    /// Shuffled train/test split with a fixed seed.
    ///
    /// The test side gets `ceil(test_fraction * n)` rows; both sides must be non-empty.
    pub fn shuffled_split(&self, test_fraction: f64, seed: u64) -> Result<(Self, Self), AnalysisError> {
        let n = self.len();
        let n_test = ((test_fraction * n as f64) - 1e-9).ceil().max(0.0) as usize;
        if n_test == 0 || n_test >= n {
            return Err(AnalysisError::insufficient("train/test split", 2, n));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));
        let (test_idx, train_idx) = indices.split_at(n_test);

        Ok((self.select(train_idx), self.select(test_idx)))
    }

    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
            window: self.window,
        }
    }

    fn slice(&self, range: std::ops::Range<usize>) -> Self {
        Self {
            rows: self.rows[range.clone()].to_vec(),
            targets: self.targets[range].to_vec(),
            window: self.window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_closes() -> Vec<f64> {
        // 100, 103, 106, 106, 109, ...
        (0..20).map(|i| 100.0 + i as f64 * 2.0 + (i % 3) as f64).collect()
    }

    #[test]
    fn test_first_row_lags_most_recent_first() {
        let features = LaggedFeatures::build(&fixture_closes(), 3).unwrap();

        assert_eq!(features.rows[0], vec![106.0, 103.0, 100.0]);
        assert_eq!(features.targets[0], 106.0);
    }

    #[test]
    fn test_row_count_per_window() {
        let closes = fixture_closes();
        for (window, expected) in [(1, 19), (3, 17), (5, 15), (10, 10)] {
            let features = LaggedFeatures::build(&closes, window).unwrap();
            assert_eq!(features.len(), expected);
            assert_eq!(features.targets.len(), expected);
            assert!(features.rows.iter().all(|r| r.len() == window));
        }
    }

    #[test]
    fn test_window_covering_series_is_empty() {
        let features = LaggedFeatures::build(&[1.0, 2.0, 3.0], 3).unwrap();
        assert!(features.is_empty());

        let features = LaggedFeatures::build(&[1.0, 2.0], 5).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            LaggedFeatures::build(&[1.0, 2.0], 0),
            Err(AnalysisError::InvalidWindow { window: 0 })
        ));
    }

    #[test]
    fn test_split_tail() {
        let features = LaggedFeatures::build(&fixture_closes(), 3).unwrap();
        let (train, test) = features.split_tail(5).unwrap();

        assert_eq!(train.len(), 12);
        assert_eq!(test.len(), 5);
        assert_eq!(test.targets, features.targets[12..].to_vec());
        assert!(features.split_tail(17).is_err());
    }

    #[test]
    fn test_shuffled_split_sizes() {
        let features = LaggedFeatures {
            rows: (0..5).map(|i| vec![i as f64]).collect(),
            targets: (0..5).map(|i| i as f64).collect(),
            window: 1,
        };

        for (fraction, n_train, n_test) in [(0.2, 4, 1), (0.4, 3, 2), (0.6, 2, 3)] {
            let (train, test) = features.shuffled_split(fraction, 42).unwrap();
            assert_eq!(train.len(), n_train);
            assert_eq!(test.len(), n_test);
        }
    }

    #[test]
    fn test_shuffled_split_is_reproducible() {
        let features = LaggedFeatures::build(&fixture_closes(), 2).unwrap();
        let (a_train, _) = features.shuffled_split(0.25, 7).unwrap();
        let (b_train, _) = features.shuffled_split(0.25, 7).unwrap();
        assert_eq!(a_train, b_train);
    }
}
