//! File edges: CSV ingestion for both datasets and output export.

pub mod export;
pub mod observations;
pub mod registry;

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::error::{PipelineError, RowError};

/// Records read from one CSV plus the rows that were dropped.
#[derive(Debug, Clone)]
pub struct Ingested<T> {
    pub records: Vec<T>,
    pub row_errors: Vec<RowError>,
    /// Data rows seen, dropped ones included.
    pub rows_read: usize,
}

/// Accepted date spellings, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Parses a calendar date in any of the spellings the source exports use.
///
/// A trailing time of day is accepted and discarded.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use reactor_perf::io::parse_date;
///
/// let d = NaiveDate::from_ymd_opt(2024, 3, 9);
/// assert_eq!(parse_date("2024-03-09"), d);
/// assert_eq!(parse_date("03/09/2024"), d);
/// assert_eq!(parse_date("2024-03-09 00:00:00"), d);
/// assert_eq!(parse_date("March 9"), None);
/// ```
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Column positions by lowercased, BOM-stripped header name.
pub(crate) struct Columns {
    map: HashMap<String, usize>,
}

impl Columns {
    pub(crate) fn from_headers(headers: &StringRecord) -> Self {
        let map = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header_name(name), idx))
            .collect();
        Self { map }
    }

    pub(crate) fn require(
        &self,
        dataset: &'static str,
        column: &'static str,
    ) -> Result<usize, PipelineError> {
        self.map
            .get(column)
            .copied()
            .ok_or(PipelineError::MissingColumn { dataset, column })
    }

    /// Trimmed cell for `column`; `None` when the column is missing or the
    /// cell is blank.
    pub(crate) fn get<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.map
            .get(column)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

pub(crate) fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

pub(crate) fn open(path: &Path) -> Result<File, PipelineError> {
    File::open(path).map_err(|e| PipelineError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_formats() {
        let d = NaiveDate::from_ymd_opt(2023, 12, 1);
        assert_eq!(parse_date("2023-12-01"), d);
        assert_eq!(parse_date("12/01/2023"), d);
        assert_eq!(parse_date("2023/12/01"), d);
        assert_eq!(parse_date(" 2023-12-01 "), d);
        assert_eq!(parse_date("12/01/2023 13:45:00"), d);
        assert_eq!(parse_date("2023-12-01T06:00:00"), d);
        assert_eq!(parse_date("2023-13-01"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn columns_ignore_case_and_bom() {
        let headers = StringRecord::from(vec!["\u{feff}Date", " Unit ", "POWER"]);
        let cols = Columns::from_headers(&headers);
        assert_eq!(cols.require("observations", "date").ok(), Some(0));
        assert_eq!(cols.require("observations", "power").ok(), Some(2));
        assert!(cols.require("observations", "name").is_err());

        let row = StringRecord::from(vec!["2024-01-01", " Hatch 1 ", ""]);
        assert_eq!(cols.get(&row, "unit"), Some("Hatch 1"));
        assert_eq!(cols.get(&row, "power"), None);
        assert_eq!(cols.get(&row, "missing"), None);
    }
}
