use serde::{Deserialize, Serialize};
use tracing::warn;

/// Policy knobs of the next-day reactive, long-only simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub initial_balance: f64,
    /// Prices at or below this floor are not traded (near-zero valuations blow up ratios)
    pub min_price: f64,
    /// Single-day moves above this multiple are treated as data glitches
    pub anomaly_multiple: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            initial_balance: 1000.0,
            min_price: 1.0,
            anomaly_multiple: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    /// One of today's real, tomorrow's real or tomorrow's predicted price is NaN
    MissingValue,
    /// Today's or tomorrow's real price is at or below the floor
    BelowFloor,
    /// The model does not expect tomorrow to close above today
    NoSignal,
}

/// Decision taken for one adjacent day pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Hold(HoldReason),
    /// Full balance rides the real move `tomorrow / today`
    Trade { change: f64 },
    /// Entry signal fired but the move exceeded the anomaly multiple
    RejectAnomaly { change: f64 },
}

impl StepOutcome {
    /// Balance multiplier implied by this outcome
    pub fn factor(&self) -> f64 {
        match self {
            StepOutcome::Trade { change } => *change,
            StepOutcome::Hold(_) | StepOutcome::RejectAnomaly { .. } => 1.0,
        }
    }
}

/// Decide the outcome for day `i` given `true[i]`, `true[i+1]` and `pred[i+1]`
pub fn decide_step(
    today_real: f64,
    tomorrow_real: f64,
    tomorrow_pred: f64,
    params: &SimulationParams,
) -> StepOutcome {
    if today_real.is_nan() || tomorrow_real.is_nan() || tomorrow_pred.is_nan() {
        return StepOutcome::Hold(HoldReason::MissingValue);
    }
    if today_real <= params.min_price || tomorrow_real <= params.min_price {
        return StepOutcome::Hold(HoldReason::BelowFloor);
    }
    if tomorrow_pred <= today_real {
        return StepOutcome::Hold(HoldReason::NoSignal);
    }

    let change = tomorrow_real / today_real;
    if change > params.anomaly_multiple {
        StepOutcome::RejectAnomaly { change }
    } else {
        StepOutcome::Trade { change }
    }
}

/// Step decisions for every adjacent pair of `y_true`.
///
/// Pairs without a matching prediction are treated as missing values.
pub fn step_outcomes(y_true: &[f64], y_pred: &[f64], params: &SimulationParams) -> Vec<StepOutcome> {
    (0..y_true.len().saturating_sub(1))
        .map(|i| {
            let tomorrow_pred = y_pred.get(i + 1).copied().unwrap_or(f64::NAN);
            let outcome = decide_step(y_true[i], y_true[i + 1], tomorrow_pred, params);
            if let StepOutcome::RejectAnomaly { change } = outcome {
                warn!("Abnormal move ignored: {:.2}x on day {}", change, i);
            }
            outcome
        })
        .collect()
}

/// Final balance after compounding every traded step, rounded to cents
pub fn simulate_profit(y_true: &[f64], y_pred: &[f64], params: &SimulationParams) -> f64 {
    round_cents(final_balance(y_true, y_pred, params))
}

/// Unrounded final balance; equals the last entry of [`simulate_profit_series`]
pub fn final_balance(y_true: &[f64], y_pred: &[f64], params: &SimulationParams) -> f64 {
    step_outcomes(y_true, y_pred, params)
        .iter()
        .fold(params.initial_balance, |balance, step| balance * step.factor())
}

/// Day-by-day balance: the initial balance followed by one entry per step
pub fn simulate_profit_series(y_true: &[f64], y_pred: &[f64], params: &SimulationParams) -> Vec<f64> {
    let steps = step_outcomes(y_true, y_pred, params);
    let mut balances = Vec::with_capacity(steps.len() + 1);
    let mut balance = params.initial_balance;
    balances.push(balance);
    for step in &steps {
        balance *= step.factor();
        balances.push(balance);
    }
    balances
}

/// Aggregate view of one simulation run, for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub return_pct: f64,
    pub trades: usize,
    pub holds: usize,
    pub rejected_anomalies: usize,
}

impl SimulationSummary {
    pub fn from_run(y_true: &[f64], y_pred: &[f64], params: &SimulationParams) -> Self {
        let steps = step_outcomes(y_true, y_pred, params);
        let final_balance = steps
            .iter()
            .fold(params.initial_balance, |balance, step| balance * step.factor());

        let trades = steps
            .iter()
            .filter(|s| matches!(s, StepOutcome::Trade { .. }))
            .count();
        let rejected_anomalies = steps
            .iter()
            .filter(|s| matches!(s, StepOutcome::RejectAnomaly { .. }))
            .count();

        let return_pct = if params.initial_balance != 0.0 {
            (final_balance / params.initial_balance - 1.0) * 100.0
        } else {
            0.0
        };

        Self {
            initial_balance: params.initial_balance,
            final_balance,
            return_pct,
            trades,
            holds: steps.len() - trades - rejected_anomalies,
            rejected_anomalies,
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
