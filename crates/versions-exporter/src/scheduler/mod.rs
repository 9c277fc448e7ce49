//! Reconciliation loop and scheduler
//!
//! The scheduler alternates between two states: idle, waiting for the next
//! tick, and reconciling, running scan, resolve and publish to completion.
//! A tick that falls due during a long cycle is delayed rather than burst.

mod publisher;
mod reconciler;

pub use publisher::{
    publish, MetricsPublisher, APPLICATION_INFO, APPLICATION_INFO_HELP, APPLICATION_INFO_LABELS,
};
pub use reconciler::{ReconcileSettings, Reconciler};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};
use versions_exporter_observability::MetricsRegistry;
use versions_exporter_types::VersionRecordSet;

/// What the scheduler is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Reconciling,
}

/// Point-in-time view of the scheduler
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerSnapshot {
    pub state: SchedulerState,
    pub cycles_completed: u64,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub last_record_count: usize,
}

/// Shared scheduler status, readable from the HTTP handlers
#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    inner: Arc<RwLock<SchedulerSnapshot>>,
}

impl Default for SchedulerStatus {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SchedulerSnapshot {
                state: SchedulerState::Idle,
                cycles_completed: 0,
                last_completed_at: None,
                last_record_count: 0,
            })),
        }
    }
}

impl SchedulerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        self.inner.read().clone()
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.read().state
    }

    fn begin_cycle(&self) {
        self.inner.write().state = SchedulerState::Reconciling;
    }

    fn complete_cycle(&self, records: usize) {
        let mut inner = self.inner.write();
        inner.state = SchedulerState::Idle;
        inner.cycles_completed += 1;
        inner.last_completed_at = Some(Utc::now());
        inner.last_record_count = records;
    }
}

/// Periodic driver of reconcile and publish
pub struct Scheduler {
    reconciler: Reconciler,
    publisher: MetricsPublisher,
    interval: Duration,
    metrics: Option<Arc<MetricsRegistry>>,
    status: SchedulerStatus,
}

impl Scheduler {
    pub fn new(reconciler: Reconciler, publisher: MetricsPublisher, interval: Duration) -> Self {
        Self {
            reconciler,
            publisher,
            interval,
            metrics: None,
            status: SchedulerStatus::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn status(&self) -> SchedulerStatus {
        self.status.clone()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one full cycle: reconcile, then publish.
    pub async fn run_cycle(&self) -> VersionRecordSet {
        self.status.begin_cycle();
        let started = Instant::now();

        let records = self.reconciler.reconcile().await;
        let published = self.publisher.publish(&records);

        let elapsed = started.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics
                .exporter()
                .record_cycle(elapsed.as_secs_f64(), published);
        }
        self.status.complete_cycle(published);

        tracing::info!(
            records = records.len(),
            unresolved = records.unresolved(),
            duration_ms = elapsed.as_millis() as u64,
            "Reconciliation cycle completed"
        );

        records
    }

    /// Run cycles forever. The first one starts immediately.
    pub async fn run(self) {
        tracing::info!(
            interval = %humantime::format_duration(self.interval),
            "Scheduler started"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }
}
