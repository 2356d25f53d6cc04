// Market data domain (symbols, price tables, aggregation periods)
pub mod market;

// Lag-feature construction for next-close regression
pub mod ml;

// Model quality metrics
pub mod performance;

// Port interfaces (reporting, charts)
pub mod ports;

// Return-driven trading simulation
pub mod simulation;

// Statistical tests and descriptive statistics
pub mod stats;

// Domain-specific error types
pub mod errors;
