use crate::config::Config;
use chrono::NaiveDate;

/// User-facing textual output of one pipeline invocation
pub trait ReportSink {
    fn heading(&mut self, title: &str);
    fn line(&mut self, text: &str);

    /// Left-aligned text table; each column is as wide as its longest cell
    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.len());
                }
            }
        }

        let render = |cells: Vec<&str>| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        self.line(&render(headers.to_vec()));
        self.line(&render(rule.iter().map(String::as_str).collect()));
        for row in rows {
            self.line(&render(row.iter().map(String::as_str).collect()));
        }
    }
}

/// Named `(x, y)` polyline
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

impl NamedSeries {
    /// Series indexed by position (x = 0, 1, 2, ..)
    pub fn indexed(label: impl Into<String>, values: &[f64]) -> Self {
        Self {
            label: label.into(),
            points: values.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect(),
        }
    }
}

/// Named polyline over calendar dates
#[derive(Debug, Clone, PartialEq)]
pub struct DatedSeries {
    pub label: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl DatedSeries {
    /// Pairs `values` with `dates`, skipping missing values
    pub fn aligned(
        label: impl Into<String>,
        dates: &[NaiveDate],
        values: impl IntoIterator<Item = Option<f64>>,
    ) -> Self {
        Self {
            label: label.into(),
            points: dates
                .iter()
                .zip(values)
                .filter_map(|(d, v)| v.map(|v| (*d, v)))
                .collect(),
        }
    }
}

/// One titled sub-plot of a [`ChartKind::Grid`]
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub series: Vec<DatedSeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    BoxPlot { groups: Vec<(String, Vec<f64>)> },
    Histogram { groups: Vec<(String, Vec<f64>)>, bins: usize },
    Lines { series: Vec<NamedSeries> },
    Scatter { series: Vec<NamedSeries> },
    TimeSeries { series: Vec<DatedSeries> },
    /// Time-series panels laid out `columns` wide, sharing the axis labels
    Grid { panels: Vec<Panel>, columns: usize },
    Bars { values: Vec<(String, f64)>, log_scale: bool },
}

/// One figure to render; `file_stem` names the output file
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub file_stem: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
}

/// Plotting collaborator. Rendering failures are logged by the
/// implementation and never interrupt the analysis.
pub trait ChartSink {
    fn render(&self, chart: &ChartRequest);
}

/// Capabilities handed to every analysis pipeline
pub struct AnalysisContext<'a> {
    pub config: &'a Config,
    pub report: &'a mut dyn ReportSink,
    pub charts: &'a dyn ChartSink,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(config: &'a Config, report: &'a mut dyn ReportSink, charts: &'a dyn ChartSink) -> Self {
        Self {
            config,
            report,
            charts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Lines(Vec<String>);

    impl ReportSink for Lines {
        fn heading(&mut self, title: &str) {
            self.0.push(format!("# {}", title));
        }
        fn line(&mut self, text: &str) {
            self.0.push(text.to_string());
        }
    }

    #[test]
    fn test_table_aligns_columns() {
        let mut sink = Lines::default();
        sink.table(
            &["Asset", "Mean"],
            &[
                vec!["BTC".to_string(), "42000.00".to_string()],
                vec!["SHIB".to_string(), "0.00".to_string()],
            ],
        );

        assert_eq!(sink.0[0], "Asset  Mean");
        assert_eq!(sink.0[1], "-----  --------");
        assert_eq!(sink.0[2], "BTC    42000.00");
        assert_eq!(sink.0[3], "SHIB   0.00");
    }

    #[test]
    fn test_indexed_series() {
        let series = NamedSeries::indexed("close", &[3.0, 4.0]);
        assert_eq!(series.points, vec![(0.0, 3.0), (1.0, 4.0)]);
    }

    #[test]
    fn test_aligned_series_skips_gaps() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let series = DatedSeries::aligned("mean", &[d(1), d(2), d(3)], [None, Some(2.0), Some(3.0)]);
        assert_eq!(series.points, vec![(d(2), 2.0), (d(3), 3.0)]);
    }
}
