//! Input and output locations.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct DataEnvConfig {
    /// Directory holding one `<SYMBOL>.csv` per asset
    pub data_dir: PathBuf,
    pub figures_dir: PathBuf,
    pub log_dir: PathBuf,
    pub dpi: u32,
}

impl Default for DataEnvConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            figures_dir: PathBuf::from("figures"),
            log_dir: PathBuf::from("logs"),
            dpi: 250,
        }
    }
}

impl DataEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: env::var("CRYPTOSTAT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            figures_dir: env::var("CRYPTOSTAT_FIGURES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.figures_dir),
            log_dir: env::var("CRYPTOSTAT_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            dpi: env::var("CRYPTOSTAT_DPI")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.dpi),
        }
    }
}
