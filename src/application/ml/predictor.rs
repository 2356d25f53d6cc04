use crate::domain::errors::AnalysisError;

/// A fitted next-close regressor. Immutable once trained.
pub trait Regressor: Send + Sync {
    /// Predict one target per feature row
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, AnalysisError>;

    /// Display name used in comparison tables and logs
    fn name(&self) -> &str;
}

impl<R: Regressor + ?Sized> Regressor for Box<R> {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, AnalysisError> {
        (**self).predict(rows)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Rejects ragged input and rows of the wrong width
pub(crate) fn check_rows(model: &str, rows: &[Vec<f64>], width: usize) -> Result<(), AnalysisError> {
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(AnalysisError::numerical(
            model,
            format!("row {} has {} features, expected {}", i, row.len(), width),
        ));
    }
    Ok(())
}
