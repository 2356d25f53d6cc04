//! Configuration module for cryptostat.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Data locations, Simulation, Model training and Statistics.

mod data_config;
mod model_config;
mod simulation_config;
mod stats_config;

pub use data_config::DataEnvConfig;
pub use model_config::ModelEnvConfig;
pub use simulation_config::SimulationEnvConfig;
pub use stats_config::StatsEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Main application configuration.
///
/// Aggregates every section; CLI flags override individual fields after loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub data: DataEnvConfig,
    pub simulation: SimulationEnvConfig,
    pub model: ModelEnvConfig,
    pub stats: StatsEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Malformed scalars fall back to their defaults; malformed lists are errors.
    pub fn from_env() -> Result<Self> {
        let data = DataEnvConfig::from_env();
        let simulation = SimulationEnvConfig::from_env();
        let model = ModelEnvConfig::from_env().context("Failed to load model config")?;
        let stats = StatsEnvConfig::from_env();

        Ok(Self {
            data,
            simulation,
            model,
            stats,
        })
    }

    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.data.data_dir = dir;
        }
        self
    }

    pub fn with_figures_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.data.figures_dir = dir;
        }
        self
    }
}

/// Comma-separated list from `key`, or `default` when unset
pub(crate) fn parse_list<T>(key: &str, default: Vec<T>) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    let values = raw
        .split(',')
        .map(|s| s.trim().parse::<T>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse {}", key))?;
    if values.is_empty() {
        anyhow::bail!("{} must list at least one value", key);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data.data_dir, PathBuf::from("data"));
        assert_eq!(config.data.dpi, 250);
        assert_eq!(config.simulation.initial_balance, 1000.0);
        assert_eq!(config.model.hidden_layers, vec![100, 50]);
        assert_eq!(config.model.poly_degrees, (2..=10).collect::<Vec<u32>>());
        assert_eq!(config.stats.hypothesis_months, 6);
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default()
            .with_data_dir(Some(PathBuf::from("/tmp/prices")))
            .with_figures_dir(None);
        assert_eq!(config.data.data_dir, PathBuf::from("/tmp/prices"));
        assert_eq!(config.data.figures_dir, PathBuf::from("figures"));
    }

    #[test]
    fn test_mlp_params_follow_model_section() {
        let config = Config::default();
        let params = config.model.mlp_params();
        assert_eq!(params.seed, 42);
        assert_eq!(params.max_epochs, 500);
        assert_eq!(params.batch_size, 200);
    }
}
