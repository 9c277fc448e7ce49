//! Owned metrics registry
//!
//! One instance is built at process start and shared by reference with the
//! reconciliation loop and the HTTP handler.

use super::collectors::ExporterMetrics;
use super::exporter::export_metrics;
use super::gauge::GaugeHandle;
use crate::error::Result;
use parking_lot::RwLock;
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts, Registry};
use std::sync::Arc;

/// Metrics registry for the exporter
pub struct MetricsRegistry {
    registry: Registry,
    publish_lock: Arc<RwLock<()>>,
    exporter_metrics: ExporterMetrics,
}

impl MetricsRegistry {
    /// Create a registry with the exporter's own metrics registered
    pub fn new() -> Self {
        let registry = Registry::new();
        let exporter_metrics = ExporterMetrics::new(&registry);

        Self {
            registry,
            publish_lock: Arc::new(RwLock::new(())),
            exporter_metrics,
        }
    }

    /// Get the exporter self-metrics
    pub fn exporter(&self) -> &ExporterMetrics {
        &self.exporter_metrics
    }

    /// Register a gauge family keyed by `label_names`.
    pub fn register_gauge(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<GaugeHandle> {
        let gauge = GaugeVec::new(Opts::new(name, help), label_names)?;
        self.registry.register(Box::new(gauge.clone()))?;

        Ok(GaugeHandle::new(
            gauge,
            label_names,
            self.publish_lock.clone(),
        ))
    }

    /// Snapshot every metric family.
    ///
    /// Taken under the shared side of the publish lock, so an in-progress
    /// gauge replacement is never observed half done.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let _guard = self.publish_lock.read();
        self.registry.gather()
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String> {
        export_metrics(&self.gather())
    }

    /// Get the underlying registry for custom collectors
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_exports_self_metrics() {
        let registry = MetricsRegistry::new();
        registry.exporter().record_scan_error("pods");
        let output = registry.export().unwrap();
        assert!(output.contains("versions_exporter_scan_errors_total"));
        assert!(output.contains("kind=\"pods\""));
    }

    #[test]
    fn test_registered_gauge_is_exported() {
        let registry = MetricsRegistry::new();
        let gauge = registry
            .register_gauge("application_info", "Application versions", &["application_name"])
            .unwrap();
        gauge.set(&["web"], 1.0).unwrap();

        let output = registry.export().unwrap();
        assert!(output.contains("application_info{application_name=\"web\"} 1"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = MetricsRegistry::new();
        registry.register_gauge("dup", "first", &["a"]).unwrap();
        assert!(registry.register_gauge("dup", "second", &["a"]).is_err());
    }
}
