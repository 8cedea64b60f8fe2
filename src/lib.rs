//! Reactor performance metrics and registry reconciliation.
//!
//! Turns a daily per-unit power feed and a master registry of generating
//! units into per-unit performance metrics, a registry enriched with those
//! metrics, and fleet-wide statistics.

pub mod cli;
pub mod config;
pub mod error;
pub mod fleet;
/// CSV ingestion and JSON/CSV export.
pub mod io;
pub mod metrics;
pub mod names;
pub mod pipeline;
pub mod reconcile;
pub mod registry;
