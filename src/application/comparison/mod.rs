// Multi-model comparison on a trailing hold-out window
pub mod harness;

// Ranking table and JSON export
pub mod report;

pub use harness::{
    ComparisonHarness, ComparisonRecord, ComparisonReport, ComparisonSettings, ModelTrace,
    StdErrorGap,
};
pub use report::{comparison_charts, render_comparison, write_comparison_json};
