//! TOML-based pipeline configuration.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::metrics::MetricsSettings;
use crate::reconcile::{AliasTable, builtin_aliases};

/// Top-level pipeline configuration parsed from TOML.
///
/// Every table is optional and falls back to the defaults the dashboard data
/// has always been built with. Load with [`PipelineConfig::from_toml_file`];
/// CLI flags are applied on top by the binary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Reference date for registry ages and license time remaining.
    /// Today when unset.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    /// Input dataset locations.
    #[serde(default)]
    pub inputs: InputsConfig,
    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,
    /// Metrics thresholds and window lengths.
    #[serde(default)]
    pub metrics: MetricsSettings,
    /// Extra registry-name to series-key aliases. Entries here override the
    /// built-in table.
    #[serde(default)]
    pub aliases: AliasTable,
}

/// Input dataset locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputsConfig {
    /// Master registry CSV.
    pub registry: PathBuf,
    /// Daily power status CSV.
    pub observations: PathBuf,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("data/reactors_master.csv"),
            observations: PathBuf::from("data/reactor_status.csv"),
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory receiving the JSON outputs.
    pub dir: PathBuf,
    /// Optional per-unit metrics CSV.
    pub metrics_csv: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            metrics_csv: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"metrics.outage_pct"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Built-in aliases extended (and overridden) by the `[aliases]` table.
    pub fn merged_aliases(&self) -> AliasTable {
        let mut aliases = builtin_aliases();
        aliases.extend(self.aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
        aliases
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.inputs.registry.as_os_str().is_empty() {
            errors.push(ConfigError::new("inputs.registry", "must not be empty"));
        }
        if self.inputs.observations.as_os_str().is_empty() {
            errors.push(ConfigError::new("inputs.observations", "must not be empty"));
        }
        if self.output.dir.as_os_str().is_empty() {
            errors.push(ConfigError::new("output.dir", "must not be empty"));
        }

        let m = &self.metrics;
        for (field, value) in [
            ("metrics.full_power_pct", m.full_power_pct),
            ("metrics.reduced_power_pct", m.reduced_power_pct),
            ("metrics.outage_pct", m.outage_pct),
            ("metrics.high_power_pct", m.high_power_pct),
        ] {
            if !(value > 0.0 && value <= 100.0) {
                errors.push(ConfigError::new(field, "must be in (0.0, 100.0]"));
            }
        }
        if m.reduced_power_pct > m.full_power_pct {
            errors.push(ConfigError::new(
                "metrics.reduced_power_pct",
                "must be <= metrics.full_power_pct",
            ));
        }
        if m.outage_pct > m.reduced_power_pct {
            errors.push(ConfigError::new(
                "metrics.outage_pct",
                "must be <= metrics.reduced_power_pct",
            ));
        }
        if !(m.trend_delta_pct >= 0.0) {
            errors.push(ConfigError::new("metrics.trend_delta_pct", "must be >= 0"));
        }

        if m.short_window_days == 0 {
            errors.push(ConfigError::new("metrics.short_window_days", "must be > 0"));
        }
        if m.short_window_days >= m.medium_window_days {
            errors.push(ConfigError::new(
                "metrics.short_window_days",
                "must be < metrics.medium_window_days",
            ));
        }
        if m.medium_window_days >= m.long_window_days {
            errors.push(ConfigError::new(
                "metrics.medium_window_days",
                "must be < metrics.long_window_days",
            ));
        }
        if m.trend_prior_days <= m.medium_window_days {
            errors.push(ConfigError::new(
                "metrics.trend_prior_days",
                "must be > metrics.medium_window_days",
            ));
        }

        for (name, key) in &self.aliases {
            if name.trim().is_empty() || key.trim().is_empty() {
                errors.push(ConfigError::new(
                    format!("aliases.\"{name}\""),
                    "alias names and targets must not be blank",
                ));
            }
        }

        errors
    }
}
