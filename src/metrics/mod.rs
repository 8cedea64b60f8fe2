//! Time-series metrics: per-unit capacity factors, status, outages, and trend.

pub mod engine;
pub mod types;
/// Windowed statistics over date-sorted series.
pub mod window;

pub use engine::{anchor_date, compute_all, compute_unit};
pub use types::{MetricsSettings, Observation, PerformanceMetrics, PowerStatus, Trend};
pub use window::ObservationSeries;
