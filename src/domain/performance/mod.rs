// Model quality metrics
pub mod metrics;
pub mod stats;

pub use metrics::EvaluationMetrics;
pub use stats::{LinearFit, Stats};
