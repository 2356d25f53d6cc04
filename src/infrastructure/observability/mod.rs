//! Structured logging for the analysis runs.
//!
//! Two sinks are installed: a plain-text log file that records every run at
//! INFO and a stderr layer that stays quiet (WARN) unless `RUST_LOG` says otherwise.

pub mod logging;

pub use logging::{LOG_FILE_NAME, init_logging, log_file_path};
