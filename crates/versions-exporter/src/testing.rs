//! In-memory inventory and release clients for tests

use crate::error::{InventoryError, ResolveError};
use crate::inventory::{InventoryClient, InventoryResult};
use crate::upstream::{Release, ReleaseClient};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use versions_exporter_types::{UpstreamProject, Workload, WorkloadKind};

/// Inventory serving a fixed, replaceable set of workloads
#[derive(Default)]
pub struct FakeInventory {
    workloads: Mutex<Vec<Workload>>,
    failing: Mutex<HashSet<WorkloadKind>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workload(self, workload: Workload) -> Self {
        self.workloads.lock().push(workload);
        self
    }

    /// Make every list call for `kind` fail
    pub fn failing(self, kind: WorkloadKind) -> Self {
        self.failing.lock().insert(kind);
        self
    }

    /// Replace all workloads, as if the cluster changed between cycles
    pub fn set_workloads(&self, workloads: Vec<Workload>) {
        *self.workloads.lock() = workloads;
    }

    fn of_kind(&self, kind: WorkloadKind) -> InventoryResult<Vec<Workload>> {
        if self.failing.lock().contains(&kind) {
            return Err(InventoryError::List {
                kind,
                message: "connection refused".to_string(),
            });
        }
        Ok(self
            .workloads
            .lock()
            .iter()
            .filter(|w| w.kind == kind)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl InventoryClient for FakeInventory {
    async fn list_pods(&self) -> InventoryResult<Vec<Workload>> {
        self.of_kind(WorkloadKind::Pod)
    }

    async fn list_deployments(&self) -> InventoryResult<Vec<Workload>> {
        self.of_kind(WorkloadKind::Deployment)
    }

    async fn list_daemonsets(&self) -> InventoryResult<Vec<Workload>> {
        self.of_kind(WorkloadKind::DaemonSet)
    }
}

/// Release client answering from a tag table
#[derive(Default)]
pub struct FakeReleases {
    tags: Mutex<HashMap<String, String>>,
    failures: Mutex<HashMap<String, ResolveError>>,
    calls: AtomicUsize,
}

impl FakeReleases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_release(self, project: &str, tag: &str) -> Self {
        self.set_release(project, tag);
        self
    }

    /// Make lookups of `project` fail with `error`
    pub fn failing(self, project: &str, error: ResolveError) -> Self {
        self.failures.lock().insert(project.to_string(), error);
        self
    }

    pub fn set_release(&self, project: &str, tag: &str) {
        self.tags.lock().insert(project.to_string(), tag.to_string());
    }

    /// Number of lookups served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReleaseClient for FakeReleases {
    async fn latest_release(&self, project: &UpstreamProject) -> Result<Release, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = project.to_string();

        if let Some(error) = self.failures.lock().get(&key) {
            return Err(error.clone());
        }
        self.tags
            .lock()
            .get(&key)
            .map(|tag| Release::new(tag.clone()))
            .ok_or(ResolveError::NotFound(key))
    }
}
