//! Windowed statistics over a date-sorted observation series.
//!
//! Every function here takes rows already sorted ascending by date (see
//! [`ObservationSeries`]) and treats "adjacent" as adjacent in that order,
//! not as consecutive calendar days.

use chrono::{Datelike, Days, NaiveDate};

use super::types::{Observation, round1};

/// All observations for one unit, stable-sorted ascending by date.
///
/// Rows sharing a date keep their input order; no de-duplication happens.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSeries {
    unit: String,
    rows: Vec<Observation>,
}

impl ObservationSeries {
    /// Builds a series, sorting `rows` by date.
    pub fn new(unit: impl Into<String>, mut rows: Vec<Observation>) -> Self {
        rows.sort_by_key(|o| o.date);
        Self {
            unit: unit.into(),
            rows,
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> &[Observation] {
        let from = self.rows.partition_point(|o| o.date < start);
        &self.rows[from..]
    }

    /// Rows dated in `[start, end)`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> &[Observation] {
        let from = self.rows.partition_point(|o| o.date < start);
        let to = self.rows.partition_point(|o| o.date < end).max(from);
        &self.rows[from..to]
    }

    /// First reading dated exactly `date`, if any.
    pub fn on(&self, date: NaiveDate) -> Option<&Observation> {
        self.since(date).first().filter(|o| o.date == date)
    }
}

/// `anchor` minus `days`, saturating at the earliest representable date.
pub fn days_before(anchor: NaiveDate, days: u32) -> NaiveDate {
    anchor
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Mean power over a window along with the number of readings it used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMean {
    /// Unrounded mean; `None` when no row in the window reported power.
    pub mean: Option<f64>,
    /// Rows with a reported power value.
    pub count: usize,
}

impl WindowMean {
    /// Mean rounded to one decimal, the form reported as a capacity factor.
    pub fn capacity_factor(&self) -> Option<f64> {
        self.mean.map(round1)
    }
}

/// Mean of the reported power values in `rows`, skipping absent readings.
pub fn window_mean(rows: &[Observation]) -> WindowMean {
    let (sum, count) = rows
        .iter()
        .filter_map(|o| o.power_percent)
        .fold((0.0_f64, 0_usize), |(sum, n), p| (sum + p, n + 1));
    WindowMean {
        mean: (count > 0).then(|| sum / count as f64),
        count,
    }
}

/// Outage counters over a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutageSummary {
    /// Outage days whose preceding row was not an outage day.
    pub starts: u32,
    pub days: u32,
    /// Days from the latest outage day to the anchor, or the horizon length
    /// when the window holds no outage day.
    pub days_since: i64,
}

/// Scans `window` for rows below `threshold`.
///
/// Starts are counted per row: the first row of the window counts as a start
/// whenever it is itself below threshold, even if the outage began before the
/// window opened. Outage days are counted per calendar date, so duplicate
/// rows for one date add a single day.
pub fn outage_summary(
    window: &[Observation],
    anchor: NaiveDate,
    threshold: f64,
    horizon_days: u32,
) -> OutageSummary {
    let mut starts = 0_u32;
    let mut days = 0_u32;
    let mut last_outage = None;
    let mut prev_in_outage = false;

    for row in window {
        let in_outage = row.power_percent.is_some_and(|p| p < threshold);
        if in_outage {
            if last_outage != Some(row.date) {
                days += 1;
            }
            if !prev_in_outage {
                starts += 1;
            }
            last_outage = Some(row.date);
        }
        prev_in_outage = in_outage;
    }

    OutageSummary {
        starts,
        days,
        days_since: last_outage.map_or(i64::from(horizon_days), |d| (anchor - d).num_days()),
    }
}

/// Longest run of consecutive rows at or above `threshold`.
pub fn longest_run(rows: &[Observation], threshold: f64) -> u32 {
    let mut best = 0_u32;
    let mut current = 0_u32;
    for row in rows {
        if row.power_percent.is_some_and(|p| p >= threshold) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Mean power per calendar month, oldest first, rounded to one decimal.
///
/// Months in which no row reported power are left out.
pub fn monthly_means(window: &[Observation]) -> Vec<f64> {
    let mut out = Vec::new();
    let mut bucket: Option<MonthBucket> = None;

    for row in window {
        let key = (row.date.year(), row.date.month());
        match bucket.as_mut() {
            Some(b) if b.key == key => b.add(row.power_percent),
            _ => {
                if let Some(mean) = bucket.take().and_then(|b| b.mean()) {
                    out.push(mean);
                }
                let mut fresh = MonthBucket { key, sum: 0.0, n: 0 };
                fresh.add(row.power_percent);
                bucket = Some(fresh);
            }
        }
    }
    if let Some(mean) = bucket.and_then(|b| b.mean()) {
        out.push(mean);
    }
    out
}

struct MonthBucket {
    key: (i32, u32),
    sum: f64,
    n: usize,
}

impl MonthBucket {
    fn add(&mut self, power: Option<f64>) {
        if let Some(p) = power {
            self.sum += p;
            self.n += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.n > 0).then(|| round1(self.sum / self.n as f64))
    }
}
