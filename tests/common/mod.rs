//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use reactor_perf::io::observations::load_observations;
use reactor_perf::io::registry::load_registry;
use reactor_perf::metrics::Observation;
use reactor_perf::pipeline::PipelineInput;

/// Reference date the fixture registry ages are computed against.
pub fn fixture_as_of() -> NaiveDate {
    date(2025, 1, 1)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}

/// Path to a file under `fixtures/`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

/// Both fixture datasets, loaded the way the binary loads them.
pub fn fixture_input() -> PipelineInput {
    let registry = load_registry(&fixture("registry.csv"), fixture_as_of())
        .expect("fixture registry should load");
    let observations =
        load_observations(&fixture("observations.csv")).expect("fixture observations should load");
    PipelineInput {
        registry: registry.records,
        observations: observations.records,
    }
}

/// One reading per day ending at `end`, oldest first.
pub fn daily(unit: &str, end: NaiveDate, powers: &[Option<f64>]) -> Vec<Observation> {
    let n = powers.len() as u64;
    powers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let date = end
                .checked_sub_days(Days::new(n - 1 - i as u64))
                .expect("date in range");
            Observation::new(unit, date, *p)
        })
        .collect()
}

/// A scratch directory under the system temp dir, unique per test name.
pub fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("reactor-perf-{test}-{}", std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    dir
}
