//! Kubernetes-backed inventory

use super::{InventoryClient, InventoryResult};
use crate::error::InventoryError;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::{Pod, PodSpec};
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::time::Duration;
use versions_exporter_types::{ContainerSpec, Workload, WorkloadKind};

/// Inventory client listing workloads through the Kubernetes API
#[derive(Clone)]
pub struct KubeInventory {
    client: Client,
    list_timeout: Duration,
}

impl KubeInventory {
    /// Build a client from the in-cluster service account, or from a
    /// kubeconfig when `out_of_cluster` is set.
    pub async fn connect(
        out_of_cluster: bool,
        kubeconfig: Option<&str>,
        list_timeout: Duration,
    ) -> InventoryResult<Self> {
        let config = if out_of_cluster {
            match kubeconfig {
                Some(path) => {
                    let kubeconfig = Kubeconfig::read_from(path)
                        .map_err(|e| InventoryError::Client(e.to_string()))?;
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await
                        .map_err(|e| InventoryError::Client(e.to_string()))?
                }
                None => Config::from_kubeconfig(&KubeConfigOptions::default())
                    .await
                    .map_err(|e| InventoryError::Client(e.to_string()))?,
            }
        } else {
            Config::incluster().map_err(|e| InventoryError::Client(e.to_string()))?
        };

        tracing::debug!(
            cluster_url = %config.cluster_url,
            out_of_cluster,
            "Kubernetes client configured"
        );

        let client = Client::try_from(config).map_err(|e| InventoryError::Client(e.to_string()))?;
        Ok(Self::from_client(client, list_timeout))
    }

    pub fn from_client(client: Client, list_timeout: Duration) -> Self {
        Self {
            client,
            list_timeout,
        }
    }

    async fn list_all<K>(&self, kind: WorkloadKind) -> InventoryResult<Vec<K>>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let params = ListParams::default();

        match tokio::time::timeout(self.list_timeout, api.list(&params)).await {
            Ok(Ok(list)) => Ok(list.items),
            Ok(Err(e)) => Err(InventoryError::List {
                kind,
                message: e.to_string(),
            }),
            Err(_) => Err(InventoryError::Timeout {
                kind,
                timeout_secs: self.list_timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl InventoryClient for KubeInventory {
    async fn list_pods(&self) -> InventoryResult<Vec<Workload>> {
        let pods: Vec<Pod> = self.list_all(WorkloadKind::Pod).await?;
        Ok(pods
            .iter()
            .map(|pod| to_workload(WorkloadKind::Pod, pod, pod.spec.as_ref()))
            .collect())
    }

    async fn list_deployments(&self) -> InventoryResult<Vec<Workload>> {
        let deployments: Vec<Deployment> = self.list_all(WorkloadKind::Deployment).await?;
        Ok(deployments
            .iter()
            .map(|d| {
                let pod_spec = d.spec.as_ref().and_then(|s| s.template.spec.as_ref());
                to_workload(WorkloadKind::Deployment, d, pod_spec)
            })
            .collect())
    }

    async fn list_daemonsets(&self) -> InventoryResult<Vec<Workload>> {
        let daemonsets: Vec<DaemonSet> = self.list_all(WorkloadKind::DaemonSet).await?;
        Ok(daemonsets
            .iter()
            .map(|ds| {
                let pod_spec = ds.spec.as_ref().and_then(|s| s.template.spec.as_ref());
                to_workload(WorkloadKind::DaemonSet, ds, pod_spec)
            })
            .collect())
    }
}

/// Project an API object onto the inventory view
fn to_workload<K: ResourceExt>(kind: WorkloadKind, obj: &K, pod_spec: Option<&PodSpec>) -> Workload {
    let containers = pod_spec
        .map(|spec| {
            spec.containers
                .iter()
                .map(|c| ContainerSpec::new(c.name.clone(), c.image.clone().unwrap_or_default()))
                .collect()
        })
        .unwrap_or_default();

    Workload {
        kind,
        name: obj.name_any(),
        namespace: obj.namespace().unwrap_or_default(),
        labels: obj.labels().clone(),
        annotations: obj.annotations().clone(),
        containers,
    }
}
