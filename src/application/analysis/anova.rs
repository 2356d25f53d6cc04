//! One-way ANOVA of period-averaged daily returns across assets.
//!
//! Daily returns are aligned on the dates every asset trades, averaged per
//! period bucket and truncated to the most recent buckets. Assets whose
//! bucket means fail Shapiro-Wilk are dropped before the test; the survivors'
//! variances are checked with Levene. The analysis is then repeated on the
//! low and high trade-count halves of the assets.

use crate::domain::market::{CryptoSymbol, MarketDataset, Period};
use crate::domain::ports::{AnalysisContext, ReportSink};
use crate::domain::stats::descriptive::{mean, median};
use crate::domain::stats::{LeveneTest, OneWayAnova, ShapiroWilk, levene, one_way_anova, shapiro_wilk};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, info_span, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnovaRequest {
    pub period: Period,
    pub window_size: usize,
}

impl Default for AnovaRequest {
    fn default() -> Self {
        Self {
            period: Period::MonthEnd,
            window_size: 6,
        }
    }
}

/// Per-asset bucket means over a common set of period labels
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReturns {
    pub buckets: Vec<NaiveDate>,
    pub columns: BTreeMap<CryptoSymbol, Vec<f64>>,
}

impl PeriodReturns {
    /// Keeps only the given assets (in their original order)
    pub fn subset(&self, symbols: &[CryptoSymbol]) -> Self {
        Self {
            buckets: self.buckets.clone(),
            columns: self
                .columns
                .iter()
                .filter(|(s, _)| symbols.contains(s))
                .map(|(s, v)| (*s, v.clone()))
                .collect(),
        }
    }
}

/// Daily returns restricted to dates present for every asset, averaged per
/// bucket; only the last `window_size` buckets are kept.
pub fn aggregate_returns(dataset: &MarketDataset, period: Period, window_size: usize) -> PeriodReturns {
    let per_asset: Vec<(CryptoSymbol, BTreeMap<NaiveDate, f64>)> = dataset
        .iter()
        .map(|(symbol, table)| (*symbol, table.daily_returns().into_iter().collect()))
        .collect();

    let mut common: Option<BTreeSet<NaiveDate>> = None;
    for (_, returns) in &per_asset {
        let dates: BTreeSet<NaiveDate> = returns.keys().copied().collect();
        common = Some(match common {
            Some(acc) => acc.intersection(&dates).copied().collect(),
            None => dates,
        });
    }
    let common = common.unwrap_or_default();

    let mut bucket_labels: BTreeSet<NaiveDate> = common.iter().map(|d| period.bucket(*d)).collect();
    while bucket_labels.len() > window_size {
        bucket_labels.pop_first();
    }

    let columns = per_asset
        .iter()
        .map(|(symbol, returns)| {
            let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
            for date in &common {
                let bucket = period.bucket(*date);
                if bucket_labels.contains(&bucket) {
                    let entry = sums.entry(bucket).or_insert((0.0, 0));
                    entry.0 += returns[date];
                    entry.1 += 1;
                }
            }
            let means = sums.values().map(|(sum, n)| sum / *n as f64).collect();
            (*symbol, means)
        })
        .collect();

    PeriodReturns {
        buckets: bucket_labels.into_iter().collect(),
        columns,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityCheck {
    pub symbol: CryptoSymbol,
    /// None when the test could not be computed (too few or constant values)
    pub shapiro: Option<ShapiroWilk>,
    pub is_normal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnovaOutcome {
    Computed {
        anova: OneWayAnova,
        group_means: Vec<(CryptoSymbol, f64)>,
        residual_normality: Option<ShapiroWilk>,
    },
    Undefined {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAnalysis {
    pub label: String,
    pub normality: Vec<NormalityCheck>,
    pub retained: Vec<CryptoSymbol>,
    pub levene: Option<LeveneTest>,
    pub outcome: AnovaOutcome,
}

/// Premise checks followed by the ANOVA on the assets that pass them
pub fn analyze_group(label: &str, returns: &PeriodReturns, alpha: f64) -> GroupAnalysis {
    let normality: Vec<NormalityCheck> = returns
        .columns
        .iter()
        .map(|(symbol, values)| {
            let shapiro = match shapiro_wilk(values) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!("Normality test unavailable for {}: {}", symbol, e);
                    None
                }
            };
            NormalityCheck {
                symbol: *symbol,
                shapiro,
                is_normal: shapiro.is_some_and(|s| s.is_normal(alpha)),
            }
        })
        .collect();

    let retained: Vec<CryptoSymbol> = normality.iter().filter(|c| c.is_normal).map(|c| c.symbol).collect();
    let groups: Vec<Vec<f64>> = retained
        .iter()
        .filter_map(|s| returns.columns.get(s).cloned())
        .collect();

    let levene = if groups.len() >= 2 {
        levene(&groups)
            .inspect_err(|e| warn!("Levene test unavailable for {}: {}", label, e))
            .ok()
    } else {
        None
    };

    let outcome = if groups.len() < 2 {
        AnovaOutcome::Undefined {
            reason: format!("{} normally distributed asset(s), need at least 2", groups.len()),
        }
    } else {
        match one_way_anova(&groups) {
            Ok(anova) => {
                let residual_normality = shapiro_wilk(&anova.residuals).ok();
                let group_means = retained
                    .iter()
                    .zip(&groups)
                    .filter_map(|(s, g)| mean(g).map(|m| (*s, m)))
                    .collect();
                AnovaOutcome::Computed {
                    anova,
                    group_means,
                    residual_normality,
                }
            }
            Err(e) => AnovaOutcome::Undefined { reason: e.to_string() },
        }
    };

    GroupAnalysis {
        label: label.to_string(),
        normality,
        retained,
        levene,
        outcome,
    }
}

/// Average monthly trade count over the last `months` months, per asset
/// with trade-count data
pub fn average_trade_counts(dataset: &MarketDataset, months: usize) -> BTreeMap<CryptoSymbol, f64> {
    dataset
        .iter()
        .filter_map(|(symbol, table)| {
            let monthly = table.mean_trade_count_per_period(Period::MonthEnd);
            let recent: Vec<f64> = monthly
                .iter()
                .skip(monthly.len().saturating_sub(months))
                .map(|(_, v)| *v)
                .collect();
            mean(&recent).map(|m| (*symbol, m))
        })
        .collect()
}

/// `(low, high)` split around the median; ties go to the high side
pub fn split_by_trade_count(counts: &BTreeMap<CryptoSymbol, f64>) -> (Vec<CryptoSymbol>, Vec<CryptoSymbol>) {
    let values: Vec<f64> = counts.values().copied().collect();
    let Some(mid) = median(&values) else {
        return (Vec::new(), Vec::new());
    };
    let mut low = Vec::new();
    let mut high = Vec::new();
    for (symbol, count) in counts {
        if *count < mid {
            low.push(*symbol);
        } else {
            high.push(*symbol);
        }
    }
    (low, high)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnovaReport {
    pub period: String,
    pub window_size: usize,
    pub buckets: Vec<NaiveDate>,
    pub overall: GroupAnalysis,
    pub low_trade: Option<GroupAnalysis>,
    pub high_trade: Option<GroupAnalysis>,
}

pub fn run(ctx: &mut AnalysisContext<'_>, dataset: &MarketDataset, request: &AnovaRequest) -> Result<AnovaReport> {
    let _span = info_span!("anova", period = %request.period, window = request.window_size).entered();
    if dataset.len() < 2 {
        bail!("ANOVA needs at least two assets, {} loaded", dataset.len());
    }
    let alpha = ctx.config.stats.significance_level;

    let returns = aggregate_returns(dataset, request.period, request.window_size);
    info!("Aggregated returns into {} {} buckets", returns.buckets.len(), request.period);
    ctx.report.heading(&format!(
        "ANOVA of mean daily returns per {} (last {} buckets)",
        request.period, request.window_size
    ));

    let overall = analyze_group("all assets", &returns, alpha);
    render_group(ctx.report, &overall, alpha);

    let counts = average_trade_counts(dataset, ctx.config.stats.trade_count_months);
    let (low, high) = split_by_trade_count(&counts);
    let (low_trade, high_trade) = if low.is_empty() && high.is_empty() {
        ctx.report.line("No trade-count data; skipping the trade-count split");
        (None, None)
    } else {
        ctx.report.heading("ANOVA grouped by trade count");
        let low_group = analyze_group("low trade count", &returns.subset(&low), alpha);
        render_group(ctx.report, &low_group, alpha);
        let high_group = analyze_group("high trade count", &returns.subset(&high), alpha);
        render_group(ctx.report, &high_group, alpha);
        (Some(low_group), Some(high_group))
    };

    Ok(AnovaReport {
        period: request.period.code().to_string(),
        window_size: request.window_size,
        buckets: returns.buckets,
        overall,
        low_trade,
        high_trade,
    })
}

fn fmt_p(shapiro: Option<ShapiroWilk>) -> String {
    shapiro.map_or_else(|| "n/a".to_string(), |s| format!("{:.4}", s.p_value))
}

fn render_group(report: &mut dyn ReportSink, group: &GroupAnalysis, alpha: f64) {
    report.line("");
    report.line(&format!("Group: {}", group.label));

    let rows: Vec<Vec<String>> = group
        .normality
        .iter()
        .map(|c| vec![c.symbol.to_string(), fmt_p(c.shapiro), c.is_normal.to_string()])
        .collect();
    report.table(&["Asset", "Shapiro p", "Normal"], &rows);

    let dropped: Vec<String> = group
        .normality
        .iter()
        .filter(|c| !c.is_normal)
        .map(|c| c.symbol.to_string())
        .collect();
    report.line(&format!(
        "Retained: [{}]  Dropped: [{}]",
        group.retained.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", "),
        dropped.join(", ")
    ));
    if let Some(lev) = group.levene {
        report.line(&format!(
            "Levene: p-value {:.4}, equal variances? {}",
            lev.p_value,
            lev.is_homoscedastic(alpha)
        ));
    }

    match &group.outcome {
        AnovaOutcome::Undefined { reason } => report.line(&format!("ANOVA undefined: {}", reason)),
        AnovaOutcome::Computed {
            anova,
            group_means,
            residual_normality,
        } => {
            let means: Vec<Vec<String>> = group_means
                .iter()
                .map(|(s, m)| vec![s.to_string(), format!("{:.6}", m)])
                .collect();
            report.table(&["Asset", "Mean return"], &means);

            let table = vec![
                vec![
                    "asset".to_string(),
                    format!("{:.6}", anova.between.sum_sq),
                    anova.between.df.to_string(),
                    format!("{:.4}", anova.f_statistic),
                    format!("{:.4}", anova.p_value),
                ],
                vec![
                    "residual".to_string(),
                    format!("{:.6}", anova.within.sum_sq),
                    anova.within.df.to_string(),
                    String::new(),
                    String::new(),
                ],
            ];
            report.table(&["Source", "Sum sq", "df", "F", "p"], &table);
            report.line(&format!(
                "Equal means rejected at {}: {}",
                alpha,
                anova.rejects_equal_means(alpha)
            ));
            report.line(&format!(
                "Residual normality: p-value {}, normal? {}",
                fmt_p(*residual_normality),
                residual_normality.is_some_and(|s| s.is_normal(alpha))
            ));
        }
    }
}
