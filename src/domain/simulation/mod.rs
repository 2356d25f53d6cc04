//! Next-day reactive long-only profit simulation.
//!
//! On day `i` the full balance is committed when the model expects
//! `true[i+1]` to close above `true[i]`; the position is closed the next day.

pub mod buy_and_hold;
pub mod profit;

pub use buy_and_hold::buy_and_hold;
pub use profit::{
    HoldReason, SimulationParams, SimulationSummary, StepOutcome, decide_step, final_balance,
    simulate_profit, simulate_profit_series, step_outcomes,
};
