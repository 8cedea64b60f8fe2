//! One-pass orchestration: metrics, then reconciliation, then fleet figures.
//!
//! Stage order is fixed. All per-unit metrics are complete before any
//! registry entry is matched, and every entry is matched before the fleet is
//! aggregated. Nothing here touches the filesystem; see [`crate::io`] for
//! loading and export.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;

use crate::error::PipelineError;
use crate::fleet::FleetStatistics;
use crate::metrics::{MetricsSettings, Observation, PerformanceMetrics, anchor_date, compute_all};
use crate::reconcile::{AliasTable, Reconciler, Reconciliation};
use crate::registry::RegistryEntry;

/// The two datasets a run consumes.
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    pub registry: Vec<RegistryEntry>,
    pub observations: Vec<Observation>,
}

/// Owned results of a run.
///
/// Reconciled views borrow from this, so they are produced on demand by
/// [`PipelineOutput::reconcile`] rather than stored.
pub struct PipelineOutput {
    /// Latest date in the status feed; every metric is relative to it.
    pub anchor: NaiveDate,
    pub metrics: BTreeMap<String, PerformanceMetrics>,
    pub registry: Vec<RegistryEntry>,
    reconciler: Reconciler,
}

/// Reconciled registry and the fleet figures derived from it.
pub struct RunSummary<'a> {
    pub reconciliation: Reconciliation<'a>,
    pub fleet: FleetStatistics,
}

impl PipelineOutput {
    /// Matches every registry entry against the metrics map.
    pub fn reconcile(&self) -> Reconciliation<'_> {
        self.reconciler.reconcile(&self.registry, &self.metrics)
    }

    /// Reconciles and aggregates the fleet in one step.
    pub fn summarize(&self) -> RunSummary<'_> {
        let reconciliation = self.reconcile();
        let fleet = FleetStatistics::from_entries(&reconciliation.entries, self.anchor);
        info!(
            reactors = fleet.total_reactors,
            sites = fleet.total_sites,
            fleet_cf = fleet.fleet_capacity_factor,
            "aggregated fleet"
        );
        RunSummary {
            reconciliation,
            fleet,
        }
    }
}

/// Computes per-unit metrics for a run.
///
/// # Errors
///
/// Returns `PipelineError::MissingInput` if either dataset is empty.
pub fn run(
    input: PipelineInput,
    settings: &MetricsSettings,
    aliases: AliasTable,
) -> Result<PipelineOutput, PipelineError> {
    if input.registry.is_empty() {
        return Err(PipelineError::MissingInput { dataset: "registry" });
    }
    let anchor = anchor_date(&input.observations).ok_or(PipelineError::MissingInput {
        dataset: "observations",
    })?;

    let metrics = compute_all(&input.observations, anchor, settings);
    info!(
        units = metrics.len(),
        observations = input.observations.len(),
        %anchor,
        "computed unit metrics"
    );

    Ok(PipelineOutput {
        anchor,
        metrics,
        registry: input.registry,
        reconciler: Reconciler::new(aliases),
    })
}
