//! JSON and CSV export of pipeline results.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::PipelineError;
use crate::fleet::FleetStatistics;
use crate::metrics::PerformanceMetrics;
use crate::reconcile::ReconciledEntry;

/// Registry entries with their matched performance (or null).
pub const REACTORS_FILE: &str = "reactors.json";
/// Per-unit metrics keyed by series name.
pub const CAPACITY_FACTORS_FILE: &str = "capacity_factors.json";
pub const FLEET_STATS_FILE: &str = "fleet_stats.json";

/// Column header for the per-unit metrics CSV.
const HEADER: &str = "unit,status,current_power,capacity_factor_30d,capacity_factor_90d,\
                      capacity_factor_365d,capacity_factor_lifetime,trend,outages_last_year,\
                      outage_days_last_year,days_since_outage,longest_run_days,data_as_of";

/// Writes `value` as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns `PipelineError::Io` if the file cannot be written and
/// `PipelineError::Json` if serialization fails.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut buf = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut buf, value)?;
    buf.flush().map_err(|e| PipelineError::io(path, e))
}

/// Writes the three JSON outputs into `dir`, creating it if needed.
///
/// Returns the paths written, in a fixed order.
///
/// # Errors
///
/// Returns the first I/O or serialization failure.
pub fn export_json(
    dir: &Path,
    reactors: &[ReconciledEntry<'_>],
    metrics: &BTreeMap<String, PerformanceMetrics>,
    fleet: &FleetStatistics,
) -> Result<Vec<PathBuf>, PipelineError> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

    let reactors_path = dir.join(REACTORS_FILE);
    write_json(&reactors_path, reactors)?;
    let metrics_path = dir.join(CAPACITY_FACTORS_FILE);
    write_json(&metrics_path, metrics)?;
    let fleet_path = dir.join(FLEET_STATS_FILE);
    write_json(&fleet_path, fleet)?;

    info!(dir = %dir.display(), "wrote JSON outputs");
    Ok(vec![reactors_path, metrics_path, fleet_path])
}

/// Exports per-unit metrics to a CSV file at the given path.
///
/// # Arguments
///
/// * `metrics` - Metrics map keyed by series name
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_metrics_csv(
    metrics: &BTreeMap<String, PerformanceMetrics>,
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    write_metrics_csv(metrics, BufWriter::new(file))
}

/// Writes per-unit metrics as CSV to any writer, one row per unit in key
/// order. Absent figures are blank cells.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_metrics_csv(
    metrics: &BTreeMap<String, PerformanceMetrics>,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for (unit, m) in metrics {
        wtr.write_record(&[
            unit.clone(),
            m.status.to_string(),
            opt_pct(m.current_power),
            opt_pct(m.capacity_factor_30d),
            opt_pct(m.capacity_factor_90d),
            opt_pct(m.capacity_factor_365d),
            opt_pct(m.capacity_factor_lifetime),
            m.trend.to_string(),
            m.outages_last_year.to_string(),
            m.outage_days_last_year.to_string(),
            m.days_since_outage.to_string(),
            m.longest_run_days.to_string(),
            m.data_as_of.format("%Y-%m-%d").to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn opt_pct(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_default()
}
