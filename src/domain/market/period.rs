use anyhow::{Result, anyhow};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aggregation period used to resample daily observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Calendar weeks ending on Sunday
    Week,
    /// Calendar months, labelled by their last day
    MonthEnd,
    /// Calendar quarters, labelled by their last day
    QuarterEnd,
}

impl Period {
    /// Short code used on the command line
    pub fn code(&self) -> &'static str {
        match self {
            Period::Week => "W",
            Period::MonthEnd => "ME",
            Period::QuarterEnd => "QE",
        }
    }

    pub fn all() -> Vec<Period> {
        vec![Period::Week, Period::MonthEnd, Period::QuarterEnd]
    }

    /// Returns the label (period-end date) of the bucket containing `date`
    pub fn bucket(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Week => {
                let to_sunday = 6 - date.weekday().num_days_from_monday();
                date.checked_add_days(Days::new(to_sunday as u64))
                    .unwrap_or(date)
            }
            Period::MonthEnd => month_end(date.year(), date.month()).unwrap_or(date),
            Period::QuarterEnd => {
                let last_month = ((date.month() - 1) / 3 + 1) * 3;
                month_end(date.year(), last_month).unwrap_or(date)
            }
        }
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "W" | "WEEK" => Ok(Period::Week),
            "ME" | "M" | "MONTH" => Ok(Period::MonthEnd),
            "QE" | "Q" | "QUARTER" => Ok(Period::QuarterEnd),
            _ => Err(anyhow!(
                "Invalid period: '{}'. Valid options: W, ME, QE",
                s
            )),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
