//! SVG rendering of chart requests with plotters.

use crate::domain::ports::{ChartKind, ChartRequest, ChartSink, DatedSeries, NamedSeries, Panel};
use chrono::{Duration, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

type DrawResult = Result<(), Box<dyn Error>>;

/// Writes each chart to `<output_dir>/<file_stem>.svg`
pub struct SvgCharts {
    output_dir: PathBuf,
    size: (u32, u32),
}

impl SvgCharts {
    /// Pixel size scales with `dpi` (250 gives 1200x700)
    pub fn new(output_dir: impl Into<PathBuf>, dpi: u32) -> Self {
        let dpi = dpi.max(50) as f64;
        Self {
            output_dir: output_dir.into(),
            size: ((dpi * 4.8) as u32, (dpi * 2.8) as u32),
        }
    }

    pub fn path_for(&self, chart: &ChartRequest) -> PathBuf {
        self.output_dir.join(format!("{}.svg", chart.file_stem))
    }

    fn draw(&self, chart: &ChartRequest, path: &Path) -> DrawResult {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let size = match &chart.kind {
            ChartKind::Grid { panels, columns } => grid_size(self.size, panels.len(), *columns),
            _ => self.size,
        };
        let root = SVGBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        match &chart.kind {
            ChartKind::BoxPlot { groups } => draw_boxplot(&root, chart, groups)?,
            ChartKind::Histogram { groups, bins } => draw_histogram(&root, chart, groups, *bins)?,
            ChartKind::Lines { series } => draw_lines(&root, chart, series)?,
            ChartKind::Scatter { series } => draw_scatter(&root, chart, series)?,
            ChartKind::Bars { values, log_scale } => draw_bars(&root, chart, values, *log_scale)?,
            ChartKind::TimeSeries { series } => {
                plot_dated(&root, &chart.title, 24, &chart.x_label, &chart.y_label, series)?
            }
            ChartKind::Grid { panels, columns } => draw_grid(&root, chart, panels, *columns)?,
        }

        root.present()?;
        Ok(())
    }
}

impl ChartSink for SvgCharts {
    fn render(&self, chart: &ChartRequest) {
        let path = self.path_for(chart);
        match self.draw(chart, &path) {
            Ok(()) => info!("Chart saved to {}", path.display()),
            Err(e) => error!("Failed to render chart {}: {}", chart.file_stem, e),
        }
    }
}

/// Discards every chart (tests, headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCharts;

impl ChartSink for NoCharts {
    fn render(&self, chart: &ChartRequest) {
        debug!("Chart {} skipped", chart.file_stem);
    }
}

/// Finite min/max of `values`, widened when degenerate
fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return None;
    }
    if (hi - lo).abs() < 1e-12 {
        return Some((lo - 1.0, hi + 1.0));
    }
    let pad = (hi - lo) * 0.05;
    Some((lo - pad, hi + pad))
}

fn grid_shape(panels: usize, columns: usize) -> (usize, usize) {
    let columns = columns.clamp(1, panels.max(1));
    (panels.div_ceil(columns).max(1), columns)
}

/// Each grid row gets half the height of a single chart
fn grid_size((width, height): (u32, u32), panels: usize, columns: usize) -> (u32, u32) {
    let (rows, _) = grid_shape(panels, columns);
    (width, (height / 2 * rows as u32).max(height))
}

fn segment_label(labels: &[String], value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

fn draw_boxplot(
    root: &DrawingArea<SVGBackend, Shift>,
    chart: &ChartRequest,
    groups: &[(String, Vec<f64>)],
) -> DrawResult {
    let groups: Vec<&(String, Vec<f64>)> = groups.iter().filter(|(_, v)| !v.is_empty()).collect();
    let (lo, hi) = bounds(groups.iter().flat_map(|(_, v)| v.iter().copied())).ok_or("no data to plot")?;
    let labels: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..labels.len() as u32).into_segmented(), lo as f32..hi as f32)?;

    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .x_label_formatter(&|v| segment_label(&labels, v))
        .draw()?;

    ctx.draw_series(groups.iter().enumerate().map(|(i, (_, values))| {
        let quartiles = Quartiles::new(values);
        Boxplot::new_vertical(SegmentValue::CenterOf(i as u32), &quartiles)
    }))?;
    Ok(())
}

fn draw_histogram(
    root: &DrawingArea<SVGBackend, Shift>,
    chart: &ChartRequest,
    groups: &[(String, Vec<f64>)],
    bins: usize,
) -> DrawResult {
    let bins = bins.max(1);
    let (lo, hi) = bounds(groups.iter().flat_map(|(_, v)| v.iter().copied())).ok_or("no data to plot")?;
    let width = (hi - lo) / bins as f64;

    let counts: Vec<Vec<usize>> = groups
        .iter()
        .map(|(_, values)| {
            let mut counts = vec![0usize; bins];
            for v in values.iter().filter(|v| v.is_finite()) {
                let bin = (((v - lo) / width) as usize).min(bins - 1);
                counts[bin] += 1;
            }
            counts
        })
        .collect();
    let max_count = counts.iter().flatten().copied().max().unwrap_or(1).max(1);

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(lo..hi, 0usize..max_count + 1)?;

    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    for (idx, ((name, _), group_counts)) in groups.iter().zip(&counts).enumerate() {
        let color = Palette99::pick(idx);
        ctx.draw_series(group_counts.iter().enumerate().map(|(b, &count)| {
            let x0 = lo + b as f64 * width;
            Rectangle::new([(x0, 0), (x0 + width, count)], color.mix(0.4).filled())
        }))?
        .label(name.as_str())
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], Palette99::pick(idx).filled()));
    }

    ctx.configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;
    Ok(())
}

fn draw_lines(root: &DrawingArea<SVGBackend, Shift>, chart: &ChartRequest, series: &[NamedSeries]) -> DrawResult {
    let points = || series.iter().flat_map(|s| s.points.iter());
    let (x_lo, x_hi) = bounds(points().map(|p| p.0)).ok_or("no data to plot")?;
    let (y_lo, y_hi) = bounds(points().map(|p| p.1)).ok_or("no data to plot")?;

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    for (idx, line) in series.iter().enumerate() {
        let color = Palette99::pick(idx);
        ctx.draw_series(LineSeries::new(
            line.points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()),
            color.stroke_width(2),
        ))?
        .label(line.label.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], Palette99::pick(idx)));
    }

    ctx.configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;
    Ok(())
}

fn draw_scatter(root: &DrawingArea<SVGBackend, Shift>, chart: &ChartRequest, series: &[NamedSeries]) -> DrawResult {
    let points = || series.iter().flat_map(|s| s.points.iter());
    let (x_lo, x_hi) = bounds(points().map(|p| p.0)).ok_or("no data to plot")?;
    let (y_lo, y_hi) = bounds(points().map(|p| p.1)).ok_or("no data to plot")?;

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    ctx.configure_mesh()
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    for (idx, group) in series.iter().enumerate() {
        let color = Palette99::pick(idx).mix(0.6);
        ctx.draw_series(
            group
                .points
                .iter()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .map(move |&(x, y)| Circle::new((x, y), 3, color.filled())),
        )?
        .label(group.label.as_str())
        .legend(move |(x, y)| Circle::new((x + 10, y), 3, Palette99::pick(idx).filled()));
    }

    ctx.configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;
    Ok(())
}

fn plot_dated(
    area: &DrawingArea<SVGBackend, Shift>,
    caption: &str,
    caption_size: u32,
    x_label: &str,
    y_label: &str,
    series: &[DatedSeries],
) -> DrawResult {
    let dates = || series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
    let start = dates().min().ok_or("no data to plot")?;
    let end = dates().max().filter(|end| *end > start).unwrap_or(start + Duration::days(1));
    let (y_lo, y_hi) = bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.1))).ok_or("no data to plot")?;

    let mut ctx = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", caption_size))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(start..end, y_lo..y_hi)?;

    ctx.configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .x_labels(6)
        .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m").to_string())
        .draw()?;

    for (idx, line) in series.iter().enumerate() {
        ctx.draw_series(LineSeries::new(
            line.points.iter().copied().filter(|(_, y)| y.is_finite()),
            Palette99::pick(idx).stroke_width(2),
        ))?
        .label(line.label.as_str())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], Palette99::pick(idx)));
    }

    ctx.configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;
    Ok(())
}

fn draw_grid(
    root: &DrawingArea<SVGBackend, Shift>,
    chart: &ChartRequest,
    panels: &[Panel],
    columns: usize,
) -> DrawResult {
    if panels.is_empty() {
        return Err("no panels to plot".into());
    }
    let body = root.titled(&chart.title, ("sans-serif", 28))?;
    for (area, panel) in body.split_evenly(grid_shape(panels.len(), columns)).iter().zip(panels) {
        // a panel without data is logged and left blank
        if let Err(e) = plot_dated(area, &panel.title, 16, &chart.x_label, &chart.y_label, &panel.series) {
            warn!("Panel {} of {} left empty: {}", panel.title, chart.file_stem, e);
        }
    }
    Ok(())
}

fn draw_bars(
    root: &DrawingArea<SVGBackend, Shift>,
    chart: &ChartRequest,
    values: &[(String, f64)],
    log_scale: bool,
) -> DrawResult {
    let labels: Vec<String> = values.iter().map(|(name, _)| name.clone()).collect();
    let x_range = (0u32..labels.len() as u32).into_segmented();
    let bar = |i: usize, bottom: f64, top: f64| {
        Rectangle::new(
            [(SegmentValue::Exact(i as u32), bottom), (SegmentValue::Exact(i as u32 + 1), top)],
            BLUE.mix(0.6).filled(),
        )
    };

    if log_scale {
        let positive: Vec<f64> = values.iter().map(|(_, v)| *v).filter(|v| *v > 0.0).collect();
        let lo = positive.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = positive.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if positive.is_empty() {
            return Err("no positive values for a log axis".into());
        }
        let (lo, hi) = (lo * 0.5, hi * 2.0);

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, (lo..hi).log_scale())?;
        ctx.configure_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_label_formatter(&|v| segment_label(&labels, v))
            .draw()?;
        ctx.draw_series(
            values
                .iter()
                .enumerate()
                .filter(|(_, (_, v))| *v > 0.0)
                .map(|(i, (_, v))| bar(i, lo, *v)),
        )?;
    } else {
        let (_, hi) = bounds(values.iter().map(|(_, v)| *v)).ok_or("no data to plot")?;
        let lo = values.iter().map(|(_, v)| *v).fold(0.0, f64::min);

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, lo..hi.max(lo + 1.0))?;
        ctx.configure_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_label_formatter(&|v| segment_label(&labels, v))
            .draw()?;
        ctx.draw_series(values.iter().enumerate().map(|(i, (_, v))| bar(i, 0.0, *v)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(stem: &str, kind: ChartKind) -> ChartRequest {
        ChartRequest {
            file_stem: stem.to_string(),
            title: "Test".to_string(),
            x_label: "x".to_string(),
            y_label: "y".to_string(),
            kind,
        }
    }

    #[test]
    fn test_bounds() {
        assert_eq!(bounds([2.0, 2.0].into_iter()), Some((1.0, 3.0)));
        assert_eq!(bounds(std::iter::empty()), None);
        let (lo, hi) = bounds([0.0, 10.0, f64::NAN].into_iter()).unwrap();
        assert!((lo + 0.5).abs() < 1e-12);
        assert!((hi - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_writes_svg_files() {
        let dir = tempfile::tempdir().unwrap();
        let charts = SvgCharts::new(dir.path().join("figures"), 100);

        let lines = request(
            "lines",
            ChartKind::Lines {
                series: vec![NamedSeries::indexed("close", &[1.0, 3.0, 2.0])],
            },
        );
        let bars = request(
            "bars",
            ChartKind::Bars {
                values: vec![("BTC".to_string(), 100.0), ("SHIB".to_string(), 0.001)],
                log_scale: true,
            },
        );
        charts.render(&lines);
        charts.render(&bars);

        assert!(charts.path_for(&lines).exists());
        assert!(charts.path_for(&bars).exists());
    }

    #[test]
    fn test_grid_layout() {
        assert_eq!(grid_shape(10, 2), (5, 2));
        assert_eq!(grid_shape(3, 5), (1, 3));
        assert_eq!(grid_shape(0, 2), (1, 1));
        assert_eq!(grid_size((1200, 700), 10, 2), (1200, 1750));
        assert_eq!(grid_size((1200, 700), 1, 2), (1200, 700));
    }

    #[test]
    fn test_writes_dated_and_grid_charts() {
        let dir = tempfile::tempdir().unwrap();
        let charts = SvgCharts::new(dir.path(), 100);
        let dates: Vec<NaiveDate> = (1..=20)
            .map(|day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap())
            .collect();
        let close = DatedSeries::aligned("Close", &dates, (0..20).map(|i| Some(i as f64)));

        let trend = request("trend", ChartKind::TimeSeries { series: vec![close.clone()] });
        let grid = request(
            "grid",
            ChartKind::Grid {
                panels: vec![
                    Panel {
                        title: "BTC".to_string(),
                        series: vec![close],
                    },
                    Panel {
                        title: "ETH".to_string(),
                        series: vec![],
                    },
                ],
                columns: 2,
            },
        );
        charts.render(&trend);
        charts.render(&grid);

        assert!(charts.path_for(&trend).exists());
        assert!(charts.path_for(&grid).exists());
    }

    #[test]
    fn test_empty_chart_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let charts = SvgCharts::new(dir.path(), 100);
        charts.render(&request("empty", ChartKind::BoxPlot { groups: vec![] }));
        NoCharts.render(&request("ignored", ChartKind::Lines { series: vec![] }));
    }
}
