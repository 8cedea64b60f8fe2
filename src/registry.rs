//! Master registry records and the fields derived from them at load time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::types::round1;

/// License term category derived from the renewal flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    Original,
    FirstRenewal,
    SubsequentRenewal,
}

impl LicenseStatus {
    /// Picks the status from the renewal flags; a subsequent renewal wins
    /// over a first renewal.
    pub fn from_renewals(license_renewed: bool, subsequent_renewal: bool) -> Self {
        if subsequent_renewal {
            LicenseStatus::SubsequentRenewal
        } else if license_renewed {
            LicenseStatus::FirstRenewal
        } else {
            LicenseStatus::Original
        }
    }

    /// Total licensed operating term in years.
    pub fn license_years(self) -> u32 {
        match self {
            LicenseStatus::Original => 40,
            LicenseStatus::FirstRenewal => 60,
            LicenseStatus::SubsequentRenewal => 80,
        }
    }
}

/// Milestone dates exactly as the registry spells them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDates {
    pub construction_permit: Option<String>,
    pub operating_license: Option<String>,
    pub commercial_operation: Option<String>,
    pub license_renewed: Option<String>,
    pub license_expires: Option<String>,
    pub subsequent_renewal: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One generating unit from the master registry.
///
/// Read-only once loaded; reconciliation attaches metrics alongside it
/// rather than writing into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub docket_number: String,
    pub license_number: String,
    pub location: String,
    pub nrc_region: Option<u8>,
    pub reactor_type: String,
    pub containment_type: String,
    pub nsss_supplier: String,
    pub architect_engineer: String,
    pub constructor: String,
    pub parent_company: String,
    pub licensee: String,
    pub parent_website: String,
    pub licensed_mwt: Option<f64>,
    pub capacity_mwe: Option<u32>,
    pub dates: RegistryDates,
    pub license_status: LicenseStatus,
    pub license_years: u32,
    /// Whole years in commercial operation as of the reference date.
    pub current_age: Option<i64>,
    /// Years until the license expires, one decimal.
    pub time_remaining: Option<f64>,
    /// `time_remaining` as a share of the full license term, one decimal.
    pub pct_license_remaining: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub nrc_site_url: Option<String>,
}

impl RegistryEntry {
    /// A registry entry with only a name set, for fixtures and tests.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docket_number: String::new(),
            license_number: String::new(),
            location: String::new(),
            nrc_region: None,
            reactor_type: String::new(),
            containment_type: String::new(),
            nsss_supplier: String::new(),
            architect_engineer: String::new(),
            constructor: String::new(),
            parent_company: String::new(),
            licensee: String::new(),
            parent_website: String::new(),
            licensed_mwt: None,
            capacity_mwe: None,
            dates: RegistryDates::default(),
            license_status: LicenseStatus::Original,
            license_years: LicenseStatus::Original.license_years(),
            current_age: None,
            time_remaining: None,
            pct_license_remaining: None,
            coordinates: None,
            nrc_site_url: None,
        }
    }

    /// Recomputes the license and age fields from `dates`.
    ///
    /// `parse_date` turns a raw registry date into a calendar date; dates it
    /// rejects leave the dependent field absent.
    pub fn derive_lifecycle(
        &mut self,
        as_of: NaiveDate,
        parse_date: impl Fn(&str) -> Option<NaiveDate>,
    ) {
        self.license_status = LicenseStatus::from_renewals(
            self.dates.license_renewed.is_some(),
            self.dates.subsequent_renewal.is_some(),
        );
        self.license_years = self.license_status.license_years();

        self.current_age = self
            .dates
            .commercial_operation
            .as_deref()
            .and_then(&parse_date)
            .map(|op| (as_of - op).num_days().div_euclid(365));

        let remaining = self
            .dates
            .license_expires
            .as_deref()
            .and_then(&parse_date)
            .map(|exp| (exp - as_of).num_days() as f64 / 365.0);
        self.time_remaining = remaining.map(round1);
        self.pct_license_remaining =
            remaining.map(|years| round1(years / f64::from(self.license_years) * 100.0));
    }
}
