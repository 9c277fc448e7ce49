//! Application state for API handlers

use crate::scheduler::SchedulerStatus;
use std::sync::Arc;
use versions_exporter_observability::MetricsRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Registry scraped by `/metrics`
    pub metrics: Arc<MetricsRegistry>,

    /// Scheduler status handle
    pub scheduler: SchedulerStatus,

    /// Exporter version
    pub version: String,

    /// Exporter start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(metrics: Arc<MetricsRegistry>, scheduler: SchedulerStatus) -> Self {
        Self {
            metrics,
            scheduler,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let secs = (chrono::Utc::now() - self.started_at).num_seconds().max(0);

        match secs {
            s if s < 60 => format!("{}s", s),
            s if s < 3600 => format!("{}m {}s", s / 60, s % 60),
            s if s < 86400 => format!("{}h {}m", s / 3600, (s % 3600) / 60),
            s => format!("{}d {}h", s / 86400, (s % 86400) / 3600),
        }
    }
}
