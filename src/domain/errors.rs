use thiserror::Error;

/// Errors raised by the analysis core (features, training, simulation inputs)
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid lag window: {window} (must be >= 1)")]
    InvalidWindow { window: usize },

    #[error("Invalid fold count: {k} (must be >= 2)")]
    InvalidFoldCount { k: usize },

    #[error("Insufficient data for {operation}: need {required}, have {available}")]
    InsufficientData {
        operation: String,
        required: usize,
        available: usize,
    },

    #[error("Training failed for {model}: {reason}")]
    TrainingFailed { model: String, reason: String },

    #[error("Asset {symbol} is not available in the dataset")]
    AssetUnavailable { symbol: String },

    #[error("Invalid series: {reason}")]
    InvalidSeries { reason: String },

    #[error("Numerical error in {operation}: {reason}")]
    Numerical { operation: String, reason: String },
}

impl AnalysisError {
    pub fn insufficient(operation: &str, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            operation: operation.to_string(),
            required,
            available,
        }
    }

    pub fn training_failed(model: &str, reason: impl std::fmt::Display) -> Self {
        Self::TrainingFailed {
            model: model.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn numerical(operation: &str, reason: impl std::fmt::Display) -> Self {
        Self::Numerical {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors related to reading one asset's price file
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { path: String, column: String },

    #[error("Invalid row {row} in {path}: {reason}")]
    InvalidRow {
        path: String,
        row: usize,
        reason: String,
    },

    #[error("Invalid price series in {path}: {reason}")]
    InvalidSeries { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_formatting() {
        let err = AnalysisError::insufficient("k-fold cross-validation", 5, 3);

        let msg = err.to_string();
        assert!(msg.contains("k-fold cross-validation"));
        assert!(msg.contains("need 5"));
        assert!(msg.contains("have 3"));
    }

    #[test]
    fn test_missing_column_formatting() {
        let err = DataLoadError::MissingColumn {
            path: "data/BTC.csv".to_string(),
            column: "close".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("close"));
        assert!(msg.contains("data/BTC.csv"));
    }
}
