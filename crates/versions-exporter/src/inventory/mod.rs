//! Cluster workload inventory
//!
//! `InventoryClient` is the seam between the scanner and the cluster; the
//! production implementation talks to the Kubernetes API through `kube`.

mod cluster;
mod scanner;

pub use cluster::KubeInventory;
pub use scanner::{scan, targets_for, ScanOutput, ScanSettings, RESERVED_SUFFIX};

use crate::error::InventoryError;
use async_trait::async_trait;
use versions_exporter_types::{Workload, WorkloadKind};

/// Result type for inventory operations
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Read-only access to the workloads running in the cluster
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// List pods across all namespaces
    async fn list_pods(&self) -> InventoryResult<Vec<Workload>>;

    /// List deployments across all namespaces
    async fn list_deployments(&self) -> InventoryResult<Vec<Workload>>;

    /// List daemonsets across all namespaces
    async fn list_daemonsets(&self) -> InventoryResult<Vec<Workload>>;

    /// List workloads of one kind
    async fn list(&self, kind: WorkloadKind) -> InventoryResult<Vec<Workload>> {
        match kind {
            WorkloadKind::Pod => self.list_pods().await,
            WorkloadKind::Deployment => self.list_deployments().await,
            WorkloadKind::DaemonSet => self.list_daemonsets().await,
        }
    }
}
