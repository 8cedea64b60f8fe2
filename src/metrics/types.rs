//! Core metrics types: observations, per-unit performance records, and the
//! thresholds that drive their derivation.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily power reading for a unit, as it appears in the status feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Unit name as spelled by the status feed (the metrics-series key).
    pub unit: String,
    /// Calendar date of the reading.
    pub date: NaiveDate,
    /// Reported power as a percentage of rated output, if reported.
    pub power_percent: Option<f64>,
}

impl Observation {
    pub fn new(unit: impl Into<String>, date: NaiveDate, power_percent: Option<f64>) -> Self {
        Self {
            unit: unit.into(),
            date,
            power_percent,
        }
    }
}

/// Operating status on the anchor date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerStatus {
    FullPower,
    ReducedPower,
    LowPower,
    Offline,
}

impl PowerStatus {
    pub const ALL: [PowerStatus; 4] = [
        PowerStatus::FullPower,
        PowerStatus::ReducedPower,
        PowerStatus::LowPower,
        PowerStatus::Offline,
    ];

    /// Classifies a power reading. Boundary values go to the higher bucket.
    ///
    /// # Examples
    ///
    /// ```
    /// use reactor_perf::metrics::types::{MetricsSettings, PowerStatus};
    ///
    /// let s = MetricsSettings::default();
    /// assert_eq!(PowerStatus::classify(Some(95.0), &s), PowerStatus::FullPower);
    /// assert_eq!(PowerStatus::classify(Some(94.9), &s), PowerStatus::ReducedPower);
    /// assert_eq!(PowerStatus::classify(None, &s), PowerStatus::Offline);
    /// ```
    pub fn classify(power: Option<f64>, settings: &MetricsSettings) -> Self {
        match power {
            Some(p) if p >= settings.full_power_pct => PowerStatus::FullPower,
            Some(p) if p >= settings.reduced_power_pct => PowerStatus::ReducedPower,
            Some(p) if p > 0.0 => PowerStatus::LowPower,
            _ => PowerStatus::Offline,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PowerStatus::FullPower => "full_power",
            PowerStatus::ReducedPower => "reduced_power",
            PowerStatus::LowPower => "low_power",
            PowerStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the recent capacity factor relative to the prior quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performance summary for one unit, anchored at the feed's latest date.
///
/// Built once per run by [`crate::metrics::engine::compute_unit`] and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Power on the anchor date, if the unit reported that day.
    pub current_power: Option<f64>,
    pub status: PowerStatus,
    pub capacity_factor_30d: Option<f64>,
    pub capacity_factor_90d: Option<f64>,
    pub capacity_factor_365d: Option<f64>,
    pub capacity_factor_lifetime: Option<f64>,
    pub trend: Trend,
    /// Outage starts within the trailing year.
    pub outages_last_year: u32,
    /// Days below the outage threshold within the trailing year.
    pub outage_days_last_year: u32,
    /// Days from the last outage day to the anchor; 365 when none was seen.
    pub days_since_outage: i64,
    /// Longest run of consecutive high-power rows over the whole series.
    pub longest_run_days: u32,
    /// Monthly mean power over the trailing year, oldest month first.
    pub monthly_cf: Vec<f64>,
    pub data_as_of: NaiveDate,
}

/// Thresholds and window lengths used by the metrics engine.
///
/// The defaults are the values the dashboard has always used; a `[metrics]`
/// table in the pipeline config can override them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsSettings {
    /// Power at or above this is `full_power`.
    pub full_power_pct: f64,
    /// Power at or above this (and below full) is `reduced_power`.
    pub reduced_power_pct: f64,
    /// Power strictly below this counts as an outage day.
    pub outage_pct: f64,
    /// Power at or above this extends a high-power run.
    pub high_power_pct: f64,
    /// Minimum CF change (percentage points) for an up/down trend.
    pub trend_delta_pct: f64,
    pub short_window_days: u32,
    pub medium_window_days: u32,
    /// Also the horizon for outage tracking and monthly buckets.
    pub long_window_days: u32,
    /// Start of the prior window compared against the medium window.
    pub trend_prior_days: u32,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            full_power_pct: 95.0,
            reduced_power_pct: 50.0,
            outage_pct: 5.0,
            high_power_pct: 95.0,
            trend_delta_pct: 2.0,
            short_window_days: 30,
            medium_window_days: 90,
            long_window_days: 365,
            trend_prior_days: 180,
        }
    }
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_boundaries() {
        let s = MetricsSettings::default();
        assert_eq!(PowerStatus::classify(Some(95.0), &s), PowerStatus::FullPower);
        assert_eq!(PowerStatus::classify(Some(100.0), &s), PowerStatus::FullPower);
        assert_eq!(PowerStatus::classify(Some(94.9), &s), PowerStatus::ReducedPower);
        assert_eq!(PowerStatus::classify(Some(50.0), &s), PowerStatus::ReducedPower);
        assert_eq!(PowerStatus::classify(Some(49.9), &s), PowerStatus::LowPower);
        assert_eq!(PowerStatus::classify(Some(0.1), &s), PowerStatus::LowPower);
        assert_eq!(PowerStatus::classify(Some(0.0), &s), PowerStatus::Offline);
        assert_eq!(PowerStatus::classify(Some(-3.0), &s), PowerStatus::Offline);
        assert_eq!(PowerStatus::classify(None, &s), PowerStatus::Offline);
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::to_string(&PowerStatus::ReducedPower).ok();
        assert_eq!(json.as_deref(), Some("\"reduced_power\""));
        let json = serde_json::to_string(&Trend::Stable).ok();
        assert_eq!(json.as_deref(), Some("\"stable\""));
    }

    #[test]
    fn round1_rounds_to_tenths() {
        assert_eq!(round1(87.25), 87.3);
        assert_eq!(round1(87.24), 87.2);
        assert_eq!(round1(0.0), 0.0);
    }
}
