//! Master registry CSV ingestion.
//!
//! Headers are the snake_case field names of [`RegistryEntry`] with the
//! milestone dates and coordinates flattened into their own columns. Only
//! `name` is required; any other missing column reads as blank.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{info, warn};

use super::{Columns, Ingested, csv_reader, open, parse_date};
use crate::error::{PipelineError, RowError};
use crate::registry::{Coordinates, RegistryDates, RegistryEntry};

const DATASET: &str = "registry";

/// Loads the registry from `path`, deriving license and age fields as of
/// `as_of`.
///
/// # Errors
///
/// Returns `PipelineError::Io` if the file cannot be opened, and
/// `PipelineError::MissingColumn` / `PipelineError::Csv` for a bad header.
pub fn load_registry(
    path: &Path,
    as_of: NaiveDate,
) -> Result<Ingested<RegistryEntry>, PipelineError> {
    let ingested = read_registry(open(path)?, as_of)?;
    info!(
        path = %path.display(),
        rows = ingested.rows_read,
        kept = ingested.records.len(),
        dropped = ingested.row_errors.len(),
        %as_of,
        "loaded registry"
    );
    Ok(ingested)
}

/// Reads registry rows from any CSV source.
///
/// # Errors
///
/// Fails only on the header; row problems are collected in
/// [`Ingested::row_errors`].
pub fn read_registry(
    reader: impl Read,
    as_of: NaiveDate,
) -> Result<Ingested<RegistryEntry>, PipelineError> {
    let mut reader = csv_reader(reader);
    let columns = Columns::from_headers(reader.headers()?);
    columns.require(DATASET, "name")?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0_usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| RowError::new(line, None, format!("CSV parse error: {e}")))
            .and_then(|record| parse_row(&record, &columns, line));
        match parsed {
            Ok(mut entry) => {
                entry.derive_lifecycle(as_of, parse_date);
                records.push(entry);
            }
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

fn parse_row(
    record: &StringRecord,
    columns: &Columns,
    line: usize,
) -> Result<RegistryEntry, RowError> {
    let text = |column: &str| columns.get(record, column).unwrap_or_default().to_string();
    let opt_text = |column: &str| columns.get(record, column).map(str::to_string);

    let name = columns
        .get(record, "name")
        .ok_or_else(|| RowError::new(line, Some("name"), "missing unit name"))?;

    let latitude = number::<f64>(record, columns, "latitude", line)?;
    let longitude = number::<f64>(record, columns, "longitude", line)?;
    let coordinates = latitude
        .zip(longitude)
        .map(|(latitude, longitude)| Coordinates {
            latitude,
            longitude,
        });

    let mut entry = RegistryEntry::named(name);
    entry.docket_number = text("docket_number");
    entry.license_number = text("license_number");
    entry.location = text("location");
    entry.nrc_region = whole_number(record, columns, "nrc_region", line)?;
    entry.reactor_type = text("reactor_type");
    entry.containment_type = text("containment_type");
    entry.nsss_supplier = text("nsss_supplier");
    entry.architect_engineer = text("architect_engineer");
    entry.constructor = text("constructor");
    entry.parent_company = text("parent_company");
    entry.licensee = text("licensee");
    entry.parent_website = text("parent_website");
    entry.licensed_mwt = number::<f64>(record, columns, "licensed_mwt", line)?;
    entry.capacity_mwe = whole_number(record, columns, "capacity_mwe", line)?;
    entry.dates = RegistryDates {
        construction_permit: opt_text("construction_permit"),
        operating_license: opt_text("operating_license"),
        commercial_operation: opt_text("commercial_operation"),
        license_renewed: opt_text("license_renewed"),
        license_expires: opt_text("license_expires"),
        subsequent_renewal: opt_text("subsequent_renewal"),
    };
    entry.coordinates = coordinates;
    entry.nrc_site_url = opt_text("nrc_site_url");
    Ok(entry)
}

/// Optional finite number; a blank cell is `None`, garbage is an error.
fn number<T>(
    record: &StringRecord,
    columns: &Columns,
    column: &'static str,
    line: usize,
) -> Result<Option<T>, RowError>
where
    T: FromStr + Into<f64> + Copy,
{
    let Some(raw) = columns.get(record, column) else {
        return Ok(None);
    };
    match raw.parse::<T>() {
        Ok(v) if v.into().is_finite() => Ok(Some(v)),
        _ => Err(RowError::new(
            line,
            Some(column),
            format!("invalid {column} \"{raw}\""),
        )),
    }
}

/// Optional whole number. Spreadsheet exports sometimes write integers as
/// `1117.0`, so an integral decimal is accepted too.
fn whole_number<T>(
    record: &StringRecord,
    columns: &Columns,
    column: &'static str,
    line: usize,
) -> Result<Option<T>, RowError>
where
    T: FromStr + TryFrom<u64>,
{
    let Some(raw) = columns.get(record, column) else {
        return Ok(None);
    };
    if let Ok(v) = raw.parse::<T>() {
        return Ok(Some(v));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
        .and_then(|v| T::try_from(v as u64).ok())
        .map(Some)
        .ok_or_else(|| RowError::new(line, Some(column), format!("invalid {column} \"{raw}\"")))
}
