//! Model training and comparison settings.

use super::parse_list;
use crate::application::ml::MlpParams;
use anyhow::Result;
use std::env;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelEnvConfig {
    pub random_seed: u64,
    pub hidden_layers: Vec<usize>,
    pub max_epochs: usize,
    pub learning_rate: f64,
    /// Share of rows held out by the shuffled prediction split
    pub test_fraction: f64,
    /// Trailing rows held out by the comparison harness
    pub holdout_days: usize,
    pub comparison_window: usize,
    pub comparison_folds: usize,
    pub poly_degrees: Vec<u32>,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        let mlp = MlpParams::default();
        Self {
            random_seed: mlp.seed,
            hidden_layers: mlp.hidden_layers,
            max_epochs: mlp.max_epochs,
            learning_rate: mlp.learning_rate,
            test_fraction: 0.2,
            holdout_days: 30,
            comparison_window: 7,
            comparison_folds: 5,
            poly_degrees: (2..=10).collect(),
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let hidden_layers = parse_list("MLP_HIDDEN_LAYERS", defaults.hidden_layers)?;
        let poly_degrees = parse_list("POLY_DEGREES", defaults.poly_degrees)?;

        Ok(Self {
            random_seed: env::var("RANDOM_SEED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.random_seed),
            hidden_layers,
            max_epochs: env::var("MLP_MAX_EPOCHS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_epochs),
            learning_rate: env::var("MLP_LEARNING_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.learning_rate),
            test_fraction: env::var("TEST_FRACTION")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|f: &f64| *f > 0.0 && *f < 1.0)
                .unwrap_or(defaults.test_fraction),
            holdout_days: env::var("HOLDOUT_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.holdout_days),
            comparison_window: env::var("COMPARISON_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.comparison_window),
            comparison_folds: env::var("COMPARISON_FOLDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.comparison_folds),
            poly_degrees,
        })
    }

    pub fn mlp_params(&self) -> MlpParams {
        MlpParams {
            hidden_layers: self.hidden_layers.clone(),
            learning_rate: self.learning_rate,
            max_epochs: self.max_epochs,
            seed: self.random_seed,
            ..MlpParams::default()
        }
    }
}
