use std::env;

/// Significance and sampling settings of the statistical tests
#[derive(Debug, Clone, PartialEq)]
pub struct StatsEnvConfig {
    pub significance_level: f64,
    /// Trailing months used by the monthly mean-return test
    pub hypothesis_months: usize,
    /// Trailing months used to rank assets by trade count
    pub trade_count_months: usize,
}

impl Default for StatsEnvConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            hypothesis_months: 6,
            trade_count_months: 12,
        }
    }
}

impl StatsEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            significance_level: env::var("SIGNIFICANCE_LEVEL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|a: &f64| *a > 0.0 && *a < 1.0)
                .unwrap_or(defaults.significance_level),
            hypothesis_months: env::var("HYPOTHESIS_MONTHS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.hypothesis_months),
            trade_count_months: env::var("TRADE_COUNT_MONTHS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.trade_count_months),
        }
    }
}
