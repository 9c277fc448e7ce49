//! Metrics publisher for `application_info`

use versions_exporter_observability::{GaugeHandle, MetricsRegistry, ObservabilityError};
use versions_exporter_types::VersionRecordSet;

/// Gauge family carrying one series per version record
pub const APPLICATION_INFO: &str = "application_info";

pub const APPLICATION_INFO_HELP: &str = "Informations on applications, especially version.";

pub const APPLICATION_INFO_LABELS: [&str; 3] =
    ["application_name", "current_version", "latest_version"];

/// Publishes version records into the `application_info` gauge
#[derive(Debug, Clone)]
pub struct MetricsPublisher {
    gauge: GaugeHandle,
}

impl MetricsPublisher {
    /// Register `application_info` on the registry
    pub fn register(registry: &MetricsRegistry) -> Result<Self, ObservabilityError> {
        let gauge =
            registry.register_gauge(APPLICATION_INFO, APPLICATION_INFO_HELP, &APPLICATION_INFO_LABELS)?;
        Ok(Self { gauge })
    }

    pub fn gauge(&self) -> &GaugeHandle {
        &self.gauge
    }

    /// Replace the published state with `records`
    pub fn publish(&self, records: &VersionRecordSet) -> usize {
        publish(&self.gauge, records)
    }
}

/// Reset the gauge and set one series per record, valued 1.
///
/// Runs under the registry's publish lock, so scrapes never observe a
/// partially rebuilt family. Returns the number of series written.
pub fn publish(gauge: &GaugeHandle, records: &VersionRecordSet) -> usize {
    gauge.replace_with(|writer| {
        let mut written = 0;
        for record in records {
            match writer.set(&record.label_values(), 1.0) {
                Ok(()) => written += 1,
                Err(e) => tracing::error!(
                    application = %record.application_name,
                    error = %e,
                    "Failed to publish version record"
                ),
            }
        }
        written
    })
}
