//! Metrics collection and export
//!
//! Provides the Prometheus registry shared by the reconciliation loop and the
//! HTTP endpoint.

pub mod collectors;
pub mod exporter;
pub mod gauge;
pub mod registry;

pub use collectors::ExporterMetrics;
pub use exporter::export_metrics;
pub use gauge::{GaugeHandle, GaugeWriter};
pub use registry::MetricsRegistry;

#[cfg(feature = "http")]
pub use exporter::http::{metrics_handler, metrics_router};
