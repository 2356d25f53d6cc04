// Command pipelines (stats, predict, anova, hypothesis)
pub mod analysis;

// Multi-model comparison on a hold-out window
pub mod comparison;

// Regressors, cross-validation and evaluation
pub mod ml;
