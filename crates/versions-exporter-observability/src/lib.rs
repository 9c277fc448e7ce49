//! versions-exporter Observability
//!
//! Provides the metrics and logging infrastructure for the exporter.
//!
//! ## Features
//!
//! - **Metrics**: An owned Prometheus registry with a publish lock, so a
//!   label set can be replaced wholesale without a scrape seeing half of it
//! - **Export**: Prometheus text exposition and an axum `/metrics` router
//!   (feature `http`)
//! - **Tracing**: `tracing-subscriber` initialization with level mapping

pub mod error;
pub mod metrics;
pub mod logging;

pub use error::ObservabilityError;
pub use metrics::{export_metrics, ExporterMetrics, GaugeHandle, GaugeWriter, MetricsRegistry};
pub use logging::{init_tracing, normalize_level, TracingConfig};

#[cfg(feature = "http")]
pub use metrics::{metrics_handler, metrics_router};
