use crate::domain::simulation::SimulationParams;
use serde::Deserialize;
use std::env;

/// Profit simulation policy loaded from the environment
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SimulationEnvConfig {
    pub initial_balance: f64,
    pub min_tradable_price: f64,
    pub anomaly_multiple: f64,
}

impl Default for SimulationEnvConfig {
    fn default() -> Self {
        let params = SimulationParams::default();
        Self {
            initial_balance: params.initial_balance,
            min_tradable_price: params.min_price,
            anomaly_multiple: params.anomaly_multiple,
        }
    }
}

impl SimulationEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let initial_balance = env::var("INITIAL_BALANCE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.initial_balance);

        let min_tradable_price = env::var("MIN_TRADABLE_PRICE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.min_tradable_price);

        let anomaly_multiple = env::var("ANOMALY_MULTIPLE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.anomaly_multiple);

        Self {
            initial_balance,
            min_tradable_price,
            anomaly_multiple,
        }
    }

    pub fn params(&self) -> SimulationParams {
        SimulationParams {
            initial_balance: self.initial_balance,
            min_price: self.min_tradable_price,
            anomaly_multiple: self.anomaly_multiple,
        }
    }
}
