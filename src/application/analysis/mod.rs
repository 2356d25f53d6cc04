//! Pipelines behind the four commands. Each takes the loaded dataset and an
//! `AnalysisContext` and writes its findings to the injected sinks.

pub mod anova;
pub mod descriptive;
pub mod hypothesis;
pub mod prediction;

pub use anova::{AnovaOutcome, AnovaReport, AnovaRequest, GroupAnalysis};
pub use descriptive::SummaryRow;
pub use hypothesis::{AssetHypothesis, HypothesisRequest, MeanReturnOutcome};
pub use prediction::{PredictionOutcome, PredictionRequest};
