//! Per-unit metric derivation.
//!
//! The engine groups raw observations by unit, finds the anchor date (the
//! latest date present anywhere in the feed), and derives one
//! [`PerformanceMetrics`] per unit relative to that anchor. Units are
//! independent of each other, so the per-unit work runs on the rayon pool;
//! collecting into the result map is the barrier before reconciliation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::debug;

use super::types::{MetricsSettings, Observation, PerformanceMetrics, PowerStatus, Trend};
use super::window::{
    ObservationSeries, days_before, longest_run, monthly_means, outage_summary, window_mean,
};

/// Latest date present across every unit's observations.
///
/// Rows with an absent power value still count. Returns `None` for an empty
/// feed.
pub fn anchor_date(observations: &[Observation]) -> Option<NaiveDate> {
    observations.iter().map(|o| o.date).max()
}

/// Splits the feed into one date-sorted series per unit, keyed by unit name.
pub fn group_by_unit(observations: &[Observation]) -> BTreeMap<String, ObservationSeries> {
    let mut grouped: BTreeMap<&str, Vec<Observation>> = BTreeMap::new();
    for obs in observations {
        grouped.entry(obs.unit.as_str()).or_default().push(obs.clone());
    }
    grouped
        .into_iter()
        .map(|(unit, rows)| (unit.to_string(), ObservationSeries::new(unit, rows)))
        .collect()
}

/// Derives metrics for every unit in the feed.
///
/// The returned map iterates in lexicographic unit order, which keeps every
/// downstream pass deterministic.
pub fn compute_all(
    observations: &[Observation],
    anchor: NaiveDate,
    settings: &MetricsSettings,
) -> BTreeMap<String, PerformanceMetrics> {
    let groups = group_by_unit(observations);
    debug!(units = groups.len(), %anchor, "computing unit metrics");
    groups
        .par_iter()
        .map(|(unit, series)| (unit.clone(), compute_unit(series, anchor, settings)))
        .collect()
}

/// Derives the metrics record for a single unit's series.
///
/// Sparse data never fails: each figure falls back to absent (or to its
/// documented default) on its own.
pub fn compute_unit(
    series: &ObservationSeries,
    anchor: NaiveDate,
    settings: &MetricsSettings,
) -> PerformanceMetrics {
    let current_power = series.on(anchor).and_then(|o| o.power_percent);
    let status = PowerStatus::classify(current_power, settings);

    let short = window_mean(series.since(days_before(anchor, settings.short_window_days)));
    let medium = window_mean(series.since(days_before(anchor, settings.medium_window_days)));
    let long_window = series.since(days_before(anchor, settings.long_window_days));
    let long = window_mean(long_window);
    let lifetime = window_mean(series.rows());

    // The outage horizon spans exactly `long_window_days` dates, anchor included.
    let outage_window = series.since(days_before(
        anchor,
        settings.long_window_days.saturating_sub(1),
    ));
    let outages = outage_summary(
        outage_window,
        anchor,
        settings.outage_pct,
        settings.long_window_days,
    );

    let cf_90 = medium.capacity_factor();
    let prior = series.between(
        days_before(anchor, settings.trend_prior_days),
        days_before(anchor, settings.medium_window_days),
    );
    let trend = classify_trend(cf_90, window_mean(prior).mean, settings.trend_delta_pct);

    PerformanceMetrics {
        current_power,
        status,
        capacity_factor_30d: short.capacity_factor(),
        capacity_factor_90d: cf_90,
        capacity_factor_365d: long.capacity_factor(),
        capacity_factor_lifetime: lifetime.capacity_factor(),
        trend,
        outages_last_year: outages.starts,
        outage_days_last_year: outages.days,
        days_since_outage: outages.days_since,
        longest_run_days: longest_run(series.rows(), settings.high_power_pct),
        monthly_cf: monthly_means(long_window),
        data_as_of: anchor,
    }
}

/// Compares the recent capacity factor against the prior window's mean.
///
/// Either side missing yields `Stable`.
pub fn classify_trend(recent: Option<f64>, prior: Option<f64>, delta: f64) -> Trend {
    match (recent, prior) {
        (Some(recent), Some(prior)) if recent > prior + delta => Trend::Up,
        (Some(recent), Some(prior)) if recent < prior - delta => Trend::Down,
        _ => Trend::Stable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily(unit: &str, end: NaiveDate, powers: &[Option<f64>]) -> Vec<Observation> {
        let n = powers.len() as u32;
        powers
            .iter()
            .enumerate()
            .map(|(i, p)| Observation::new(unit, days_before(end, n - 1 - i as u32), *p))
            .collect()
    }

    #[test]
    fn three_day_scenario() {
        let obs = vec![
            Observation::new("A", d(2024, 1, 1), Some(96.0)),
            Observation::new("A", d(2024, 1, 2), Some(96.0)),
            Observation::new("A", d(2024, 1, 3), Some(40.0)),
        ];
        let anchor = anchor_date(&obs).unwrap();
        assert_eq!(anchor, d(2024, 1, 3));

        let metrics = compute_all(&obs, anchor, &MetricsSettings::default());
        let a = &metrics["A"];
        assert_eq!(a.current_power, Some(40.0));
        assert_eq!(a.status, PowerStatus::LowPower);
        assert_eq!(a.longest_run_days, 2);
        assert_eq!(a.capacity_factor_30d, Some(77.3));
        assert_eq!(a.capacity_factor_lifetime, Some(77.3));
        assert_eq!(a.data_as_of, anchor);
    }

    #[test]
    fn anchor_is_global_across_units() {
        let obs = vec![
            Observation::new("A", d(2024, 6, 1), Some(100.0)),
            Observation::new("B", d(2024, 6, 5), None),
        ];
        let anchor = anchor_date(&obs).unwrap();
        assert_eq!(anchor, d(2024, 6, 5));

        let metrics = compute_all(&obs, anchor, &MetricsSettings::default());
        // A did not report on the anchor date.
        assert_eq!(metrics["A"].current_power, None);
        assert_eq!(metrics["A"].status, PowerStatus::Offline);
        assert_eq!(metrics["A"].capacity_factor_30d, Some(100.0));
        // B reported with no value: every mean is absent, not zero.
        assert_eq!(metrics["B"].capacity_factor_30d, None);
        assert_eq!(metrics["B"].capacity_factor_lifetime, None);
        assert!(metrics["B"].monthly_cf.is_empty());
    }

    #[test]
    fn stale_unit_has_no_outage_history() {
        let mut obs = daily("Old", d(2022, 1, 10), &[Some(0.0); 10]);
        obs.push(Observation::new("Fresh", d(2024, 1, 10), Some(100.0)));
        let anchor = anchor_date(&obs).unwrap();
        let metrics = compute_all(&obs, anchor, &MetricsSettings::default());
        let old = &metrics["Old"];
        assert_eq!(old.outages_last_year, 0);
        assert_eq!(old.outage_days_last_year, 0);
        assert_eq!(old.days_since_outage, 365);
        assert_eq!(old.capacity_factor_365d, None);
        assert_eq!(old.capacity_factor_lifetime, Some(0.0));
    }

    #[test]
    fn trend_compares_against_prior_quarter() {
        let end = d(2024, 12, 31);
        // 90 days at 80%, then the last 91 days at 100%.
        let mut powers = vec![Some(80.0); 90];
        powers.extend(vec![Some(100.0); 91]);
        let series = ObservationSeries::new("U", daily("U", end, &powers));
        let m = compute_unit(&series, end, &MetricsSettings::default());
        assert_eq!(m.capacity_factor_90d, Some(100.0));
        assert_eq!(m.trend, Trend::Up);

        let mut powers = vec![Some(100.0); 90];
        powers.extend(vec![Some(80.0); 91]);
        let series = ObservationSeries::new("U", daily("U", end, &powers));
        let m = compute_unit(&series, end, &MetricsSettings::default());
        assert_eq!(m.trend, Trend::Down);
    }

    #[test]
    fn trend_is_stable_without_prior_window() {
        let end = d(2024, 12, 31);
        let series = ObservationSeries::new("U", daily("U", end, &[Some(100.0); 30]));
        let m = compute_unit(&series, end, &MetricsSettings::default());
        assert_eq!(m.trend, Trend::Stable);
    }

    #[test]
    fn classify_trend_band() {
        assert_eq!(classify_trend(Some(92.1), Some(90.0), 2.0), Trend::Up);
        assert_eq!(classify_trend(Some(92.0), Some(90.0), 2.0), Trend::Stable);
        assert_eq!(classify_trend(Some(87.9), Some(90.0), 2.0), Trend::Down);
        assert_eq!(classify_trend(None, Some(90.0), 2.0), Trend::Stable);
        assert_eq!(classify_trend(Some(90.0), None, 2.0), Trend::Stable);
    }

    #[test]
    fn outage_days_never_exceed_a_year() {
        let end = d(2024, 12, 31);
        let series = ObservationSeries::new("U", daily("U", end, &[Some(0.0); 800]));
        let m = compute_unit(&series, end, &MetricsSettings::default());
        assert_eq!(m.outage_days_last_year, 365);
        assert_eq!(m.outages_last_year, 1);
        assert_eq!(m.days_since_outage, 0);
        assert_eq!(m.longest_run_days, 0);
    }

    #[test]
    fn window_counts_are_nested() {
        let settings = MetricsSettings::default();
        let mut rng = StdRng::seed_from_u64(11);
        let end = d(2025, 3, 15);
        for _ in 0..50 {
            let len = rng.random_range(1..900);
            let powers: Vec<Option<f64>> = (0..len)
                .map(|_| rng.random_bool(0.9).then(|| rng.random_range(0.0..=100.0)))
                .collect();
            let series = ObservationSeries::new("U", daily("U", end, &powers));
            let count = |days| window_mean(series.since(days_before(end, days))).count;
            let c30 = count(settings.short_window_days);
            let c90 = count(settings.medium_window_days);
            let c365 = count(settings.long_window_days);
            let all = window_mean(series.rows()).count;
            assert!(c30 <= c90 && c90 <= c365 && c365 <= all);

            let m = compute_unit(&series, end, &settings);
            assert!(m.outage_days_last_year <= 365);
            assert!(m.outages_last_year <= m.outage_days_last_year);
            assert!(m.monthly_cf.len() <= 13);
        }
    }
}
