//! CSV price files, one per whitelisted symbol.
//!
//! Files come newest-first, optionally preceded by a one-line banner
//! (e.g. a data-vendor URL) before the header row.

use crate::domain::errors::DataLoadError;
use crate::domain::market::{CryptoSymbol, DailyBar, MarketDataset, PriceTable};
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

const REQUIRED_COLUMNS: [&str; 5] = ["date", "open", "high", "low", "close"];

/// Column positions resolved from a lower-cased header row
struct ColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
    trade_count: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord, path: &str) -> Result<Self, DataLoadError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |column: &str| names.iter().position(|n| n == column);

        let mut required = [0usize; 5];
        for (slot, column) in required.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = find(column).ok_or_else(|| DataLoadError::MissingColumn {
                path: path.to_string(),
                column: column.to_string(),
            })?;
        }

        Ok(Self {
            date: required[0],
            open: required[1],
            high: required[2],
            low: required[3],
            close: required[4],
            volume: names.iter().position(|n| n.starts_with("volume")),
            trade_count: find("tradecount"),
        })
    }
}

pub struct CsvPriceLoader {
    data_dir: PathBuf,
}

impl CsvPriceLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, symbol: CryptoSymbol) -> PathBuf {
        self.data_dir.join(symbol.file_name())
    }

    /// Loads every symbol in `symbols`; failures are logged and the asset omitted
    pub fn load_all(&self, symbols: &[CryptoSymbol]) -> MarketDataset {
        let mut dataset = MarketDataset::new();
        for &symbol in symbols {
            match self.load_symbol(symbol) {
                Ok(table) => {
                    info!("Loaded {} ({} rows)", symbol, table.len());
                    dataset.insert(table);
                }
                Err(e) => error!("Skipping {}: {}", symbol, e),
            }
        }
        dataset
    }

    pub fn load_symbol(&self, symbol: CryptoSymbol) -> Result<PriceTable, DataLoadError> {
        let path = self.path_for(symbol);
        let bars = read_bars(&path)?;
        PriceTable::new(symbol, bars).map_err(|e| DataLoadError::InvalidSeries {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Parses one price file into ascending daily bars
pub fn read_bars(path: &Path) -> Result<Vec<DailyBar>, DataLoadError> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path_str.clone(),
        source,
    })?;

    let body = skip_banner(&content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv {
            path: path_str.clone(),
            source,
        })?
        .clone();
    let columns = ColumnMap::resolve(&headers, &path_str)?;

    let mut bars = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|source| DataLoadError::Csv {
            path: path_str.clone(),
            source,
        })?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let bar = parse_bar(&record, &columns).map_err(|reason| DataLoadError::InvalidRow {
            path: path_str.clone(),
            row: i + 1,
            reason,
        })?;
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.date);
    if bars.is_empty() {
        warn!("{} has a header but no rows", path_str);
    }
    Ok(bars)
}

/// Drops a leading line that is not the header row
fn skip_banner(content: &str) -> &str {
    let first_line = content.lines().next().unwrap_or_default();
    if first_line.to_lowercase().contains("close") {
        content
    } else {
        content
            .split_once('\n')
            .map_or("", |(_, rest)| rest)
    }
}

fn parse_bar(record: &StringRecord, columns: &ColumnMap) -> Result<DailyBar, String> {
    let field = |idx: usize| record.get(idx).unwrap_or_default();
    let number = |idx: usize, name: &str| -> Result<f64, String> {
        field(idx)
            .parse::<f64>()
            .map_err(|_| format!("{} '{}' is not a number", name, field(idx)))
    };

    let trade_count = match columns.trade_count.map(field) {
        Some(raw) if !raw.is_empty() => Some(
            raw.parse::<f64>()
                .map_err(|_| format!("tradecount '{}' is not a number", raw))?,
        ),
        _ => None,
    };
    let volume = match columns.volume {
        Some(idx) if !field(idx).is_empty() => number(idx, "volume")?,
        _ => 0.0,
    };

    Ok(DailyBar {
        date: parse_date(field(columns.date))?,
        open: number(columns.open, "open")?,
        high: number(columns.high, "high")?,
        low: number(columns.low, "low")?,
        close: number(columns.close, "close")?,
        volume,
        trade_count,
    })
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .map_err(|_| format!("unrecognised date '{}'", raw))
}
