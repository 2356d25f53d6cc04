//! Descriptive statistics and the hypothesis tests used by the analysis pipelines.

pub mod anova;
pub mod descriptive;
pub mod normality;
pub mod ttest;
pub mod variance;

pub use anova::{AnovaRow, OneWayAnova, one_way_anova};
pub use descriptive::DescriptiveSummary;
pub use normality::{ShapiroWilk, shapiro_wilk};
pub use ttest::{OneSampleTTest, one_sample_lower_tail};
pub use variance::{LeveneTest, levene};
