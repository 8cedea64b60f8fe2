//! Fleet-wide statistics computed from the reconciled registry.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::metrics::PowerStatus;
use crate::metrics::types::round1;
use crate::names::plant_base_name;
use crate::reconcile::ReconciledEntry;
use crate::registry::LicenseStatus;

/// Unit count and summed capacity for one reactor technology.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeSummary {
    pub count: usize,
    pub capacity_mwe: u64,
}

/// Units per license category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LicenseCounts {
    pub original: usize,
    pub first_renewal: usize,
    pub subsequent_renewal: usize,
}

/// Aggregate fleet figures, rebuilt from scratch on every run.
///
/// Empty inputs never fail: averages over an empty set report `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetStatistics {
    pub total_reactors: usize,
    /// Distinct plant sites (registry names with unit suffixes removed).
    pub total_sites: usize,
    pub total_capacity_mwe: u64,
    pub total_capacity_gwe: f64,
    pub pwr_count: usize,
    pub bwr_count: usize,
    pub by_type: BTreeMap<String, TypeSummary>,
    pub by_region: BTreeMap<u8, usize>,
    /// Mean age over units with a known age.
    pub average_age: f64,
    pub license_status: LicenseCounts,
    /// Unweighted mean of the 90-day capacity factor over matched units.
    pub fleet_capacity_factor: f64,
    /// Status tally over matched units; unmatched units are not counted.
    pub status_counts: BTreeMap<PowerStatus, usize>,
    pub matched: usize,
    pub unmatched: usize,
    pub data_as_of: NaiveDate,
}

impl FleetStatistics {
    /// Aggregates the reconciled registry.
    ///
    /// # Arguments
    ///
    /// * `entries` - Every registry entry, matched or not
    /// * `data_as_of` - Date stamped on the summary
    pub fn from_entries(entries: &[ReconciledEntry<'_>], data_as_of: NaiveDate) -> Self {
        let mut total_capacity_mwe = 0_u64;
        let mut by_type: BTreeMap<String, TypeSummary> = BTreeMap::new();
        let mut by_region: BTreeMap<u8, usize> = BTreeMap::new();
        let mut license_status = LicenseCounts::default();
        let mut sites = BTreeSet::new();
        let mut ages = Vec::new();
        let mut cf_90 = Vec::new();
        let mut status_counts: BTreeMap<PowerStatus, usize> = BTreeMap::new();
        let mut matched = 0_usize;

        for reconciled in entries {
            let entry = reconciled.entry;
            let capacity = u64::from(entry.capacity_mwe.unwrap_or(0));
            total_capacity_mwe += capacity;

            if !entry.reactor_type.is_empty() {
                let summary = by_type.entry(entry.reactor_type.clone()).or_default();
                summary.count += 1;
                summary.capacity_mwe += capacity;
            }
            if let Some(region) = entry.nrc_region {
                *by_region.entry(region).or_default() += 1;
            }
            match entry.license_status {
                LicenseStatus::Original => license_status.original += 1,
                LicenseStatus::FirstRenewal => license_status.first_renewal += 1,
                LicenseStatus::SubsequentRenewal => license_status.subsequent_renewal += 1,
            }
            sites.insert(plant_base_name(&entry.name));
            ages.extend(entry.current_age.map(|age| age as f64));

            if let Some(perf) = reconciled.performance {
                matched += 1;
                cf_90.extend(perf.capacity_factor_90d);
                *status_counts.entry(perf.status).or_default() += 1;
            }
        }

        let count_type = |t: &str| by_type.get(t).map_or(0, |s| s.count);
        let pwr_count = count_type("PWR");
        let bwr_count = count_type("BWR");

        Self {
            total_reactors: entries.len(),
            total_sites: sites.len(),
            total_capacity_mwe,
            total_capacity_gwe: round1(total_capacity_mwe as f64 / 1000.0),
            pwr_count,
            bwr_count,
            by_type,
            by_region,
            average_age: mean_or_zero(&ages),
            license_status,
            fleet_capacity_factor: mean_or_zero(&cf_90),
            status_counts,
            matched,
            unmatched: entries.len() - matched,
            data_as_of,
        }
    }
}

/// Mean rounded to one decimal; `0.0` for an empty slice.
fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round1(values.iter().sum::<f64>() / values.len() as f64)
}

impl fmt::Display for FleetStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Fleet Summary ({}) ---", self.data_as_of)?;
        writeln!(
            f,
            "Reactors:              {} at {} sites",
            self.total_reactors, self.total_sites
        )?;
        writeln!(
            f,
            "Capacity:              {} MWe ({:.1} GWe)",
            self.total_capacity_mwe, self.total_capacity_gwe
        )?;
        writeln!(f, "PWR / BWR:             {} / {}", self.pwr_count, self.bwr_count)?;
        writeln!(f, "Average age:           {:.1} yrs", self.average_age)?;
        writeln!(
            f,
            "Licenses:              {} original, {} first renewal, {} subsequent renewal",
            self.license_status.original,
            self.license_status.first_renewal,
            self.license_status.subsequent_renewal
        )?;
        writeln!(f, "Fleet capacity factor: {:.1}%", self.fleet_capacity_factor)?;
        for status in PowerStatus::ALL {
            writeln!(
                f,
                "  {:<20} {}",
                status.as_str(),
                self.status_counts.get(&status).copied().unwrap_or(0)
            )?;
        }
        write!(
            f,
            "Matched:               {} ({} without performance data)",
            self.matched, self.unmatched
        )
    }
}
