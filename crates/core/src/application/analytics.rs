//! Analytics - pure functions over ascending NAV / index series
//!
//! Every function here expects its input sorted oldest -> newest, which is
//! the invariant `NavHistory` and `BenchmarkSeries` maintain. Percent changes
//! computed on a newest-first series come out with the wrong sign, so callers
//! reverse for display only after computing.

use crate::application::constants::DAYS_PER_YEAR;
use crate::domain::{BenchmarkPoint, NavPoint};
use chrono::{Datelike, Duration, NaiveDate};

/// A value observed on a date
pub trait DatedValue {
    fn date(&self) -> NaiveDate;
    fn value(&self) -> f64;
}

impl DatedValue for NavPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> f64 {
        self.nav
    }
}

impl DatedValue for BenchmarkPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> f64 {
        self.close
    }
}

/// Monthly NAV sample with its change against the previous sample
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySample {
    pub date: NaiveDate,
    pub nav: f64,
    pub change_pct: Option<f64>,
}

/// Period-over-period change in percent; the first element has no predecessor
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut changes = Vec::with_capacity(values.len());
    if values.is_empty() {
        return changes;
    }

    changes.push(None);
    for pair in values.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if prev == 0.0 {
            changes.push(None);
        } else {
            changes.push(Some((curr / prev - 1.0) * 100.0));
        }
    }
    changes
}

/// Compound annual growth rate in percent
///
/// Returns `None` for non-positive inputs.
pub fn calculate_cagr(start_value: f64, end_value: f64, years: f64) -> Option<f64> {
    if start_value <= 0.0 || end_value <= 0.0 || years <= 0.0 {
        return None;
    }
    Some(((end_value / start_value).powf(1.0 / years) - 1.0) * 100.0)
}

/// Lower bound of a trailing window of `years` ending at `today`
///
/// The bound itself lies outside the window: only dates strictly after it
/// count. Windows reaching past the calendar clamp to `NaiveDate::MIN`.
pub fn window_cutoff(today: NaiveDate, years: u32) -> NaiveDate {
    Duration::try_days(i64::from(years) * DAYS_PER_YEAR)
        .and_then(|span| today.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}

/// Slice of an ascending series that falls inside the trailing window
pub fn within_window<T: DatedValue>(series: &[T], today: NaiveDate, years: u32) -> &[T] {
    let cutoff = window_cutoff(today, years);
    let start = series.partition_point(|p| p.date() <= cutoff);
    &series[start..]
}

/// CAGR between the first and last points of the trailing window
///
/// Uses the nominal window length as the period, so a series that starts
/// late inside the window is still annualized over `years`.
pub fn cagr_over_window<T: DatedValue>(series: &[T], today: NaiveDate, years: u32) -> Option<f64> {
    let window = within_window(series, today, years);
    if window.len() < 2 {
        return None;
    }
    let first = window.first()?.value();
    let last = window.last()?.value();
    calculate_cagr(first, last, years as f64)
}

/// NAVs published on `day` of each month inside the trailing window, with
/// month-over-month change (ascending)
pub fn monthly_samples(
    points: &[NavPoint],
    today: NaiveDate,
    years: u32,
    day: u32,
) -> Vec<MonthlySample> {
    let sampled: Vec<&NavPoint> = within_window(points, today, years)
        .iter()
        .filter(|p| p.date.day() == day)
        .collect();

    let navs: Vec<f64> = sampled.iter().map(|p| p.nav).collect();
    let changes = pct_change(&navs);

    sampled
        .into_iter()
        .zip(changes)
        .map(|(p, change_pct)| MonthlySample {
            date: p.date,
            nav: p.nav,
            change_pct,
        })
        .collect()
}

/// Index of the point closest in time to `date`; ties go to the earlier point
pub fn nearest_index<T: DatedValue>(series: &[T], date: NaiveDate) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (idx, point) in series.iter().enumerate() {
        let distance = (point.date() - date).num_days().abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((idx, distance)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Latest point and the first occurrence of the highest NAV
pub fn current_and_all_time_high(points: &[NavPoint]) -> Option<(NavPoint, NavPoint)> {
    let current = *points.last()?;
    let mut high = points[0];
    for point in &points[1..] {
        if point.nav > high.nav {
            high = *point;
        }
    }
    Some((current, high))
}

/// Rebase a series so its first value is 100
///
/// Empty when the series is empty or starts at a non-positive value.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    match values.first() {
        Some(&base) if base > 0.0 => values.iter().map(|v| v / base * 100.0).collect(),
        _ => Vec::new(),
    }
}

/// Fund lagged the benchmark by more than `margin_pct` percentage points
pub fn is_underperforming(
    fund_change: Option<f64>,
    benchmark_change: Option<f64>,
    margin_pct: f64,
) -> bool {
    match (fund_change, benchmark_change) {
        (Some(fund), Some(bench)) => fund < bench - margin_pct,
        _ => false,
    }
}

/// Current NAV is below `ratio` of the all-time high
pub fn is_buy_signal(current_nav: f64, all_time_high: f64, ratio: f64) -> bool {
    current_nav > 0.0 && current_nav < ratio * all_time_high
}
