// Price files
pub mod data_loader;

// Logging setup
pub mod observability;

// Console, SVG and CSV outputs
pub mod reporting;

pub use data_loader::CsvPriceLoader;
