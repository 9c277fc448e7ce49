//! Exporter self-metrics
//!
//! Health signals about the reconciliation loop itself. They live next to
//! `application_info` on the same registry but never mix with it.

use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};

/// Metrics describing the exporter's own reconciliation cycles
pub struct ExporterMetrics {
    /// Workload listing failures, by workload kind
    pub scan_errors_total: IntCounterVec,

    /// Upstream release lookups that failed, by failure class
    pub resolution_errors_total: IntCounterVec,

    /// Wall time of a full reconciliation cycle
    pub reconcile_duration_seconds: Histogram,

    /// Records published by the last cycle
    pub records: IntGauge,
}

impl ExporterMetrics {
    /// Create and register exporter metrics
    pub fn new(registry: &Registry) -> Self {
        let scan_errors_total = IntCounterVec::new(
            Opts::new(
                "versions_exporter_scan_errors_total",
                "Workload listing failures",
            ),
            &["kind"],
        )
        .expect("Failed to create scan_errors_total metric");
        registry
            .register(Box::new(scan_errors_total.clone()))
            .expect("Failed to register scan_errors_total");

        let resolution_errors_total = IntCounterVec::new(
            Opts::new(
                "versions_exporter_resolution_errors_total",
                "Upstream release lookups that failed",
            ),
            &["reason"],
        )
        .expect("Failed to create resolution_errors_total metric");
        registry
            .register(Box::new(resolution_errors_total.clone()))
            .expect("Failed to register resolution_errors_total");

        let reconcile_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "versions_exporter_reconcile_duration_seconds",
                "Duration of a reconciliation cycle",
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        )
        .expect("Failed to create reconcile_duration_seconds metric");
        registry
            .register(Box::new(reconcile_duration_seconds.clone()))
            .expect("Failed to register reconcile_duration_seconds");

        let records = IntGauge::new(
            "versions_exporter_records",
            "Version records published by the last cycle",
        )
        .expect("Failed to create records metric");
        registry
            .register(Box::new(records.clone()))
            .expect("Failed to register records");

        Self {
            scan_errors_total,
            resolution_errors_total,
            reconcile_duration_seconds,
            records,
        }
    }

    /// Record a failed listing of one workload kind
    pub fn record_scan_error(&self, kind: &str) {
        self.scan_errors_total.with_label_values(&[kind]).inc();
    }

    /// Record a failed upstream lookup
    pub fn record_resolution_error(&self, reason: &str) {
        self.resolution_errors_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a completed cycle
    pub fn record_cycle(&self, duration_secs: f64, records: usize) {
        self.reconcile_duration_seconds.observe(duration_secs);
        self.records.set(records as i64);
    }
}
