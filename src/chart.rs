//! Trend charts
//!
//! Turns logged observations for one currency pair into a time series with
//! summary statistics, and renders that series as an SVG line chart. An
//! empty series still renders: the chart then carries a "no data" notice.

use crate::currency::CurrencyCode;
use crate::error::{DashboardError, Result};
use crate::types::{ObservationRecord, Rate, Timestamp};
use chrono::{DateTime, Duration, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, Min};
use std::fs;
use std::path::{Path, PathBuf};

/// One point of a trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: Timestamp,
    pub rate: Rate,
}

/// Summary statistics of a trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendSummary {
    pub count: usize,
    pub first: Rate,
    pub last: Rate,
    pub min: Rate,
    pub max: Rate,
    pub mean: Rate,
    /// Sample standard deviation; `None` below two points
    pub std_dev: Option<Rate>,
    /// Change from first to last, in percent of first
    pub change_pct: Rate,
}

/// Time-ordered rates of one currency pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// Select the pair's observations and order them by time
    ///
    /// Rates that are not finite and positive are dropped. The sort is
    /// stable, so observations sharing a timestamp keep their log order.
    pub fn from_records<'a, I>(records: I, base: &CurrencyCode, target: &CurrencyCode) -> Self
    where
        I: IntoIterator<Item = &'a ObservationRecord>,
    {
        let mut points: Vec<TrendPoint> = records
            .into_iter()
            .filter(|r| r.is_pair(base, target) && r.rate.is_finite() && r.rate > 0.0)
            .map(|r| TrendPoint {
                timestamp: r.timestamp,
                rate: r.rate,
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);

        Self {
            base: base.clone(),
            target: target.clone(),
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Chart title, e.g. `EUR Trend vs USD`
    pub fn title(&self) -> String {
        format!("{} Trend vs {}", self.target, self.base)
    }

    pub fn summary(&self) -> Option<TrendSummary> {
        let first = self.points.first()?.rate;
        let last = self.points.last()?.rate;

        let data = Data::new(self.points.iter().map(|p| p.rate).collect::<Vec<f64>>());
        let std_dev = if self.points.len() >= 2 {
            data.std_dev()
        } else {
            None
        };
        let change_pct = if first != 0.0 {
            (last - first) / first * 100.0
        } else {
            0.0
        };

        Some(TrendSummary {
            count: self.points.len(),
            first,
            last,
            min: data.min(),
            max: data.max(),
            mean: data.mean().unwrap_or(first),
            std_dev,
            change_pct,
        })
    }
}

/// A rendered trend chart
#[derive(Debug, Clone)]
pub struct TrendChart {
    pub series: TrendSeries,
    pub svg: String,
}

impl TrendChart {
    /// File name used when saving: `USD_EUR.svg`
    pub fn file_name(&self) -> String {
        format!("{}_{}.svg", self.series.base, self.series.target)
    }

    /// Write the chart into `dir`, creating it if needed
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, &self.svg)?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

/// Renders trend series to SVG
#[derive(Debug, Clone, Copy)]
pub struct TrendRenderer {
    width: u32,
    height: u32,
}

impl Default for TrendRenderer {
    fn default() -> Self {
        Self::new(1200, 600)
    }
}

impl TrendRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(200),
            height: height.max(150),
        }
    }

    /// Filter `records` to the pair and render its trend
    pub fn render<'a, I>(
        &self,
        records: I,
        base: &CurrencyCode,
        target: &CurrencyCode,
    ) -> Result<TrendChart>
    where
        I: IntoIterator<Item = &'a ObservationRecord>,
    {
        let series = TrendSeries::from_records(records, base, target);
        let svg = self.render_svg(&series)?;
        Ok(TrendChart { series, svg })
    }

    /// Render a series as an SVG document
    pub fn render_svg(&self, series: &TrendSeries) -> Result<String> {
        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(|e| {
                DashboardError::ChartError(format!("Failed to fill background: {}", e))
            })?;

            if series.is_empty() {
                draw_placeholder(&root, series, self.width, self.height)?;
            } else {
                draw_series(&root, series)?;
            }

            root.present().map_err(|e| {
                DashboardError::ChartError(format!("Failed to present chart: {}", e))
            })?;
        }
        Ok(svg)
    }
}

fn draw_placeholder(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    series: &TrendSeries,
    width: u32,
    height: u32,
) -> Result<()> {
    let title = TextStyle::from(("sans-serif", 28).into_font()).color(&BLACK);
    let grey = BLACK.mix(0.6);
    let notice = TextStyle::from(("sans-serif", 18).into_font()).color(&grey);

    root.draw_text(&series.title(), &title, (20, 20))
        .map_err(|e| DashboardError::ChartError(format!("Failed to draw title: {}", e)))?;
    root.draw_text(
        &format!("No data logged yet for {}/{}", series.base, series.target),
        &notice,
        (width as i32 / 4, height as i32 / 2),
    )
    .map_err(|e| DashboardError::ChartError(format!("Failed to draw notice: {}", e)))?;
    Ok(())
}

fn draw_series(root: &DrawingArea<SVGBackend<'_>, Shift>, series: &TrendSeries) -> Result<()> {
    let points: Vec<(DateTime<Utc>, f64)> = series
        .points
        .iter()
        .map(|p| (p.timestamp.and_utc(), p.rate))
        .collect();

    let (x_range, y_range) = padded_ranges(&points);

    let mut chart = ChartBuilder::on(root)
        .caption(series.title(), ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| DashboardError::ChartError(format!("Failed to build chart: {}", e)))?;

    chart
        .configure_mesh()
        .x_desc("Timestamp")
        .y_desc(format!("Rate ({} per {})", series.target, series.base))
        .x_label_formatter(&|x| x.format("%m-%d %H:%M").to_string())
        .draw()
        .map_err(|e| DashboardError::ChartError(format!("Failed to configure mesh: {}", e)))?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
        .map_err(|e| DashboardError::ChartError(format!("Failed to draw line: {}", e)))?
        .label(format!("{}/{}", series.base, series.target))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], BLUE));

    chart
        .draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())))
        .map_err(|e| DashboardError::ChartError(format!("Failed to draw points: {}", e)))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| DashboardError::ChartError(format!("Failed to draw legend: {}", e)))?;

    Ok(())
}

/// Axis ranges around `points`, widened when they would be degenerate
fn padded_ranges(
    points: &[(DateTime<Utc>, f64)],
) -> (std::ops::Range<DateTime<Utc>>, std::ops::Range<f64>) {
    let mut start = points.iter().map(|p| p.0).min().unwrap_or_else(Utc::now);
    let mut end = points.iter().map(|p| p.0).max().unwrap_or(start);
    if end <= start {
        start -= Duration::hours(1);
        end = start + Duration::hours(2);
    }

    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
    if !(min.is_finite() && max.is_finite()) {
        return (start..end, 0.0..1.0);
    }
    let span = max - min;
    let pad = if span > 0.0 { span * 0.1 } else { min.abs().max(1.0) * 0.05 };

    (start..end, (min - pad)..(max + pad))
}
