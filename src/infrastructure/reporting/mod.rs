// Figure rendering (SVG)
pub mod charts;

// Text output
pub mod console;

// Tabular exports
pub mod csv_export;

pub use charts::{NoCharts, SvgCharts};
pub use console::{BufferedReport, ConsoleReport};
pub use csv_export::write_records;
