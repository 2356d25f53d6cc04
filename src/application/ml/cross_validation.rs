use super::mlp::{MlpParams, MlpRegressor};
use super::predictor::Regressor;
use crate::domain::errors::AnalysisError;
use crate::domain::ml::LaggedFeatures;
use crate::domain::performance::metrics::mean_squared_error;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

/// Shuffled k-fold partition with a fixed seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    pub k: usize,
    pub seed: u64,
}

/// Row indices of one fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

impl KFold {
    pub fn new(k: usize, seed: u64) -> Result<Self, AnalysisError> {
        if k < 2 {
            return Err(AnalysisError::InvalidFoldCount { k });
        }
        Ok(Self { k, seed })
    }

    /// Partitions `0..n` into `k` disjoint validation folds.
    ///
    /// The first `n % k` folds carry one extra sample. `k > n` is rejected
    /// so that no fold validates on an empty set.
    pub fn split(&self, n: usize) -> Result<Vec<FoldSplit>, AnalysisError> {
        if self.k > n {
            return Err(AnalysisError::insufficient("k-fold split", self.k, n));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(self.seed));

        let base = n / self.k;
        let extra = n % self.k;
        let mut start = 0;
        let mut folds = Vec::with_capacity(self.k);
        for fold in 0..self.k {
            let size = base + usize::from(fold < extra);
            let end = start + size;
            let validation = indices[start..end].to_vec();
            let train = indices[..start]
                .iter()
                .chain(&indices[end..])
                .copied()
                .collect();
            folds.push(FoldSplit { train, validation });
            start = end;
        }
        Ok(folds)
    }
}

/// Best model of a cross-validated training run
#[derive(Debug, Clone)]
pub struct CrossValidated<M> {
    pub model: M,
    /// Validation MSE per fold, in fold order
    pub fold_mse: Vec<f64>,
    pub best_fold: usize,
}

impl<M> CrossValidated<M> {
    pub fn best_mse(&self) -> f64 {
        self.fold_mse[self.best_fold]
    }
}

/// Fits one candidate per fold with `fit` and keeps the lowest validation MSE.
///
/// A failing fold aborts the whole run.
pub fn select_by_cross_validation<M, F>(
    data: &LaggedFeatures,
    kfold: &KFold,
    fit: F,
) -> Result<CrossValidated<M>, AnalysisError>
where
    M: Regressor,
    F: Fn(&LaggedFeatures) -> Result<M, AnalysisError>,
{
    let folds = kfold.split(data.len())?;
    let mut best: Option<(usize, M)> = None;
    let mut fold_mse = Vec::with_capacity(folds.len());

    for (i, fold) in folds.iter().enumerate() {
        let train = data.select(&fold.train);
        let validation = data.select(&fold.validation);

        let model = fit(&train).map_err(|e| {
            AnalysisError::training_failed("cross-validation", format!("fold {}: {}", i + 1, e))
        })?;
        let predictions = model.predict(&validation.rows)?;
        let mse = mean_squared_error(&validation.targets, &predictions);
        info!("Fold {}: MSE = {:.4}", i + 1, mse);

        let improves = best.as_ref().is_none_or(|(b, _)| mse < fold_mse[*b]);
        fold_mse.push(mse);
        if improves {
            best = Some((i, model));
        }
    }

    let (best_fold, model) = best.ok_or_else(|| AnalysisError::insufficient("k-fold split", 2, 0))?;
    info!("Best fold: {} (MSE = {:.4})", best_fold + 1, fold_mse[best_fold]);
    Ok(CrossValidated {
        model,
        fold_mse,
        best_fold,
    })
}

/// Cross-validated MLP training; the fold split reuses the network seed
pub fn train_with_cross_validation(
    data: &LaggedFeatures,
    k: usize,
    params: &MlpParams,
) -> Result<CrossValidated<MlpRegressor>, AnalysisError> {
    let kfold = KFold::new(k, params.seed)?;
    select_by_cross_validation(data, &kfold, |train| MlpRegressor::fit(train, params))
}
