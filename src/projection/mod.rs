// src/projection/mod.rs

pub mod date;
pub mod equity;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, str::FromStr};

use crate::aggregate::SeriesData;
use crate::schema::{parse_number, pick_column, ColumnStrategy, Density, Fixed};

pub use date::parse_date;
pub use equity::{equity_view, rsi_companions, EquityMode, EquityView};

/// Most points handed to a chart.
pub const DEFAULT_MAX_POINTS: usize = 800;

/// One chart point: the raw date label and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: String,
    pub y: f64,
}

/// Inclusive day range; an open side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start.map_or(true, |s| day >= s) && self.end.map_or(true, |e| day <= e)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resample {
    #[default]
    None,
    Weekly,
    Monthly,
}

impl FromStr for Resample {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "daily" => Ok(Resample::None),
            "weekly" | "week" | "w" => Ok(Resample::Weekly),
            "monthly" | "month" | "m" => Ok(Resample::Monthly),
            other => Err(anyhow::anyhow!("unknown resample mode {:?}", other)),
        }
    }
}

/// How to turn a series into chart points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOptions {
    pub range: DateRange,
    pub resample: Resample,
    pub max_points: usize,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            range: DateRange::default(),
            resample: Resample::None,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

/// Rows whose date falls in `range`. With no bounds every row is kept;
/// otherwise rows with an unreadable date are dropped.
pub fn filter_rows_by_date<'a>(
    rows: &'a [Vec<String>],
    date_col: usize,
    range: &DateRange,
) -> Vec<&'a Vec<String>> {
    if range.is_unbounded() {
        return rows.iter().collect();
    }
    rows.iter()
        .filter(|r| {
            r.get(date_col)
                .and_then(|c| parse_date(c))
                .is_some_and(|d| range.contains(d))
        })
        .collect()
}

/// First listed value column, else column 1.
pub fn default_value_col(series: &SeriesData) -> usize {
    series.value_cols.first().copied().unwrap_or(1)
}

/// Densest numeric column, falling back to [`default_value_col`].
pub fn auto_value_col(series: &SeriesData) -> usize {
    let density = Density {
        date_col: series.date_col,
    };
    let chain: [&dyn ColumnStrategy; 1] = [&density];
    pick_column(&chain, &series.headers, &series.rows, default_value_col(series))
}

/// Points for `value_col` (or the default) inside `range`, skipping cells
/// that are not finite numbers.
pub fn to_points(series: &SeriesData, range: &DateRange, value_col: Option<usize>) -> Vec<Point> {
    let chain: [&dyn ColumnStrategy; 1] = [&Fixed(value_col)];
    let vcol = pick_column(&chain, &series.headers, &[], default_value_col(series));
    let dcol = series.date_col;

    filter_rows_by_date(&series.rows, dcol, range)
        .into_iter()
        .filter_map(|r| {
            let y = r.get(vcol).and_then(|c| parse_number(c))?;
            Some(Point {
                x: r.get(dcol).cloned().unwrap_or_default(),
                y,
            })
        })
        .collect()
}

/// Keep the last point of each week or month. Buckets appear in the order
/// they are first seen; points with unreadable dates are dropped.
pub fn resample(points: Vec<Point>, mode: Resample) -> Vec<Point> {
    let bucket_of = |d: NaiveDate| match mode {
        Resample::Weekly => {
            let w = d.iso_week();
            (w.year(), w.week())
        }
        _ => (d.year(), d.month()),
    };
    if mode == Resample::None {
        return points;
    }

    let mut out: Vec<Point> = Vec::new();
    let mut slots: HashMap<(i32, u32), usize> = HashMap::new();
    for p in points {
        let Some(day) = parse_date(&p.x) else {
            continue;
        };
        match slots.get(&bucket_of(day)) {
            Some(&idx) => out[idx] = p,
            None => {
                slots.insert(bucket_of(day), out.len());
                out.push(p);
            }
        }
    }
    out
}

/// Uniformly thin `points` to roughly `max_points`, always keeping the
/// first and last.
pub fn decimate(points: Vec<Point>, max_points: usize) -> Vec<Point> {
    let max_points = max_points.max(1);
    if points.len() <= max_points {
        return points;
    }
    let step = points.len().div_ceil(max_points);
    let last = points.len() - 1;
    points
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % step == 0 || *i == last)
        .map(|(_, p)| p)
        .collect()
}

/// Filter, resample and decimate in one go.
pub fn project(series: &SeriesData, value_col: Option<usize>, opts: &ProjectionOptions) -> Vec<Point> {
    let points = to_points(series, &opts.range, value_col);
    decimate(resample(points, opts.resample), opts.max_points)
}
