use super::period::Period;
use super::symbol::CryptoSymbol;
use crate::domain::errors::AnalysisError;
use crate::domain::stats::DescriptiveSummary;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One daily OHLCV observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trade_count: Option<f64>,
}

impl DailyBar {
    /// Bar where every price field equals `close` (fixtures and synthetic series)
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            trade_count: None,
        }
    }
}

/// Chronologically sorted daily history of one asset.
///
/// Invariants enforced at construction: at least one bar, strictly
/// increasing dates, finite close prices.
#[derive(Debug, Clone)]
pub struct PriceTable {
    symbol: CryptoSymbol,
    bars: Vec<DailyBar>,
}

impl PriceTable {
    pub fn new(symbol: CryptoSymbol, bars: Vec<DailyBar>) -> Result<Self, AnalysisError> {
        if bars.is_empty() {
            return Err(AnalysisError::InvalidSeries {
                reason: format!("{} has no observations", symbol),
            });
        }
        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(AnalysisError::InvalidSeries {
                reason: format!(
                    "{} dates are not strictly increasing ({} followed by {})",
                    symbol, pair[0].date, pair[1].date
                ),
            });
        }
        if let Some(bar) = bars.iter().find(|b| !b.close.is_finite()) {
            return Err(AnalysisError::InvalidSeries {
                reason: format!("{} has a non-finite close on {}", symbol, bar.date),
            });
        }
        Ok(Self { symbol, bars })
    }

    /// Convenience constructor from consecutive daily closes starting at `start`
    pub fn from_closes(
        symbol: CryptoSymbol,
        start: NaiveDate,
        closes: &[f64],
    ) -> Result<Self, AnalysisError> {
        let bars = closes
            .iter()
            .zip(start.iter_days())
            .map(|(close, date)| DailyBar::from_close(date, *close))
            .collect();
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> CryptoSymbol {
        self.symbol
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn close_summary(&self) -> Option<DescriptiveSummary> {
        DescriptiveSummary::from_values(&self.closes())
    }

    /// Simple returns `close[t] / close[t-1] - 1`, dated at `t`.
    /// Steps whose previous close is zero are skipped.
    pub fn daily_returns(&self) -> Vec<(NaiveDate, f64)> {
        self.bars
            .windows(2)
            .filter(|w| w[0].close != 0.0)
            .map(|w| (w[1].date, w[1].close / w[0].close - 1.0))
            .collect()
    }

    /// Last close of every period bucket, in chronological order
    pub fn last_close_per_period(&self, period: Period) -> Vec<(NaiveDate, f64)> {
        let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for bar in &self.bars {
            // Bars are sorted, so the final insert per bucket is its last close
            buckets.insert(period.bucket(bar.date), bar.close);
        }
        buckets.into_iter().collect()
    }

    /// Mean trade count per period bucket; bars without a trade count are ignored
    pub fn mean_trade_count_per_period(&self, period: Period) -> Vec<(NaiveDate, f64)> {
        let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for bar in &self.bars {
            if let Some(count) = bar.trade_count {
                let entry = buckets.entry(period.bucket(bar.date)).or_insert((0.0, 0));
                entry.0 += count;
                entry.1 += 1;
            }
        }
        buckets
            .into_iter()
            .map(|(date, (sum, n))| (date, sum / n as f64))
            .collect()
    }
}

/// Mapping from whitelisted symbol to its price table.
///
/// This is the only shape the analysis core accepts from the data loader.
#[derive(Debug, Clone, Default)]
pub struct MarketDataset {
    tables: BTreeMap<CryptoSymbol, PriceTable>,
}

impl MarketDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: PriceTable) {
        self.tables.insert(table.symbol(), table);
    }

    pub fn get(&self, symbol: CryptoSymbol) -> Option<&PriceTable> {
        self.tables.get(&symbol)
    }

    pub fn symbols(&self) -> Vec<CryptoSymbol> {
        self.tables.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CryptoSymbol, &PriceTable)> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<PriceTable> for MarketDataset {
    fn from_iter<I: IntoIterator<Item = PriceTable>>(iter: I) -> Self {
        let mut dataset = MarketDataset::new();
        for table in iter {
            dataset.insert(table);
        }
        dataset
    }
}
