//! Daily power status CSV ingestion.
//!
//! Expects `Date`, `Unit` and `Power` columns (any case, extra columns
//! ignored). A blank `Power` cell is an absent reading and the row is kept;
//! a malformed `Power` or `Date` drops the row with a [`RowError`].

use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use super::{Columns, Ingested, csv_reader, open, parse_date};
use crate::error::{PipelineError, RowError};
use crate::metrics::Observation;

const DATASET: &str = "observations";

/// Loads the status feed from `path`.
///
/// # Errors
///
/// Returns `PipelineError::Io` if the file cannot be opened, and
/// `PipelineError::MissingColumn` / `PipelineError::Csv` for a bad header.
pub fn load_observations(path: &Path) -> Result<Ingested<Observation>, PipelineError> {
    let ingested = read_observations(open(path)?)?;
    info!(
        path = %path.display(),
        rows = ingested.rows_read,
        kept = ingested.records.len(),
        dropped = ingested.row_errors.len(),
        "loaded observations"
    );
    Ok(ingested)
}

/// Reads status rows from any CSV source.
///
/// # Errors
///
/// Fails only on the header; row problems are collected in
/// [`Ingested::row_errors`].
pub fn read_observations(reader: impl Read) -> Result<Ingested<Observation>, PipelineError> {
    let mut reader = csv_reader(reader);
    let columns = Columns::from_headers(reader.headers()?);
    for column in ["date", "unit", "power"] {
        columns.require(DATASET, column)?;
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0_usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| RowError::new(line, None, format!("CSV parse error: {e}")))
            .and_then(|record| parse_row(&record, &columns, line));
        match parsed {
            Ok(obs) => records.push(obs),
            Err(e) => {
                warn!(dataset = DATASET, line = e.line, field = ?e.field, "{}", e.message);
                row_errors.push(e);
            }
        }
    }

    Ok(Ingested {
        records,
        row_errors,
        rows_read,
    })
}

fn parse_row(record: &StringRecord, columns: &Columns, line: usize) -> Result<Observation, RowError> {
    let unit = columns
        .get(record, "unit")
        .ok_or_else(|| RowError::new(line, Some("unit"), "missing unit name"))?;

    let raw_date = columns
        .get(record, "date")
        .ok_or_else(|| RowError::new(line, Some("date"), "missing date"))?;
    let date = parse_date(raw_date)
        .ok_or_else(|| RowError::new(line, Some("date"), format!("invalid date \"{raw_date}\"")))?;

    let power_percent = match columns.get(record, "power") {
        None => None,
        Some(raw) => match raw.parse::<f64>() {
            Ok(p) if p.is_finite() => Some(p),
            _ => {
                return Err(RowError::new(
                    line,
                    Some("power"),
                    format!("invalid power \"{raw}\""),
                ));
            }
        },
    };

    Ok(Observation::new(unit, date, power_percent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn read(csv: &str) -> Ingested<Observation> {
        read_observations(csv.as_bytes()).expect("header should parse")
    }

    #[test]
    fn reads_rows_in_file_order() {
        let data = read("Date,Unit,Power\n2024-01-02,Hatch 1,100\n2024-01-01,Hatch 1,98.5\n");
        assert_eq!(data.rows_read, 2);
        assert!(data.row_errors.is_empty());
        assert_eq!(data.records.len(), 2);
        assert_eq!(data.records[1].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(data.records[1].power_percent, Some(98.5));
        assert_eq!(data.records[0].unit, "Hatch 1");
    }

    #[test]
    fn blank_power_is_absent_not_dropped() {
        let data = read("Date,Unit,Power\n2024-01-01,Ginna,\n");
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.records[0].power_percent, None);
    }

    #[test]
    fn malformed_rows_are_dropped_individually() {
        let data = read(
            "Date,Unit,Power\n\
             2024-01-01,A 1,100\n\
             yesterday,A 1,100\n\
             2024-01-02,A 1,n/a\n\
             2024-01-03,,90\n\
             2024-01-04,A 1,NaN\n\
             01/05/2024,A 1,95\n",
        );
        assert_eq!(data.rows_read, 6);
        assert_eq!(data.records.len(), 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
        assert_eq!(data.row_errors[0].field.as_deref(), Some("date"));
        assert_eq!(data.row_errors[1].field.as_deref(), Some("power"));
        assert_eq!(data.row_errors[2].field.as_deref(), Some("unit"));
    }

    #[test]
    fn headers_are_case_insensitive_with_bom() {
        let data = read("\u{feff}date,UNIT,power,Notes\n2024-01-01 00:00:00,Summer 1,100,ok\n");
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.records[0].unit, "Summer 1");
    }

    #[test]
    fn missing_column_is_fatal() {
        let result = read_observations("Date,Unit\n2024-01-01,A\n".as_bytes());
        assert!(matches!(
            result,
            Err(PipelineError::MissingColumn { column: "power", .. })
        ));
    }
}
