//! Workload inventory scanner
//!
//! Turns annotated workloads into scan targets. Two discovery modes apply to
//! every workload:
//!
//! - the project annotation (`versions-exporter/githubRepo` by default) tracks
//!   the workload's first container under the application name;
//! - `<prefix><container-name>` annotations track that named container under
//!   the container's own name.

use super::InventoryClient;
use versions_exporter_types::{ScanTarget, Workload, WorkloadKind};

/// Suffix reserved for the project annotation, never a container name
pub const RESERVED_SUFFIX: &str = "githubRepo";

/// What the scanner looks for
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub annotation_name: String,
    pub container_annotation_prefix: String,
    pub kinds: Vec<WorkloadKind>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            annotation_name: "versions-exporter/githubRepo".to_string(),
            container_annotation_prefix: "versions-exporter/".to_string(),
            kinds: vec![WorkloadKind::Pod],
        }
    }
}

/// Result of one scan
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    /// Targets in scan order
    pub targets: Vec<ScanTarget>,

    /// Kinds whose list call failed
    pub failed_kinds: Vec<WorkloadKind>,
}

/// List every configured kind and collect the annotated targets.
///
/// A failing kind is logged, reported in `failed_kinds` and contributes no
/// targets; the other kinds are still scanned.
pub async fn scan(inventory: &dyn InventoryClient, settings: &ScanSettings) -> ScanOutput {
    let mut output = ScanOutput::default();
    let kinds: Vec<WorkloadKind> = WorkloadKind::ALL
        .into_iter()
        .filter(|k| settings.kinds.contains(k))
        .collect();

    for kind in kinds {
        let workloads = match inventory.list(kind).await {
            Ok(workloads) => workloads,
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Failed to list workloads");
                output.failed_kinds.push(kind);
                continue;
            }
        };

        tracing::debug!(kind = %kind, count = workloads.len(), "Listed workloads");

        for workload in &workloads {
            output.targets.extend(targets_for(workload, settings));
        }
    }

    output
}

/// Scan targets declared by a single workload
pub fn targets_for(workload: &Workload, settings: &ScanSettings) -> Vec<ScanTarget> {
    let mut targets = Vec::new();

    if let Some(upstream) = workload.annotations.get(&settings.annotation_name) {
        match workload.application_name() {
            Some(name) => {
                let current = workload
                    .first_container()
                    .map(|c| container_version(workload, &c.name, &c.image, c.tag()))
                    .unwrap_or_default();
                targets.push(ScanTarget::new(name, current, upstream.as_str()));
            }
            None => {
                tracing::warn!(
                    workload = %workload.qualified_name(),
                    "Annotated workload has neither an app label nor a name, skipping"
                );
            }
        }
    }

    for (key, upstream) in &workload.annotations {
        if key == &settings.annotation_name {
            continue;
        }
        let Some(container_name) = container_key(key, &settings.container_annotation_prefix) else {
            continue;
        };

        let current = match workload.container(container_name) {
            Some(c) => container_version(workload, &c.name, &c.image, c.tag()),
            None => {
                tracing::debug!(
                    workload = %workload.qualified_name(),
                    container = %container_name,
                    "No container matches annotation"
                );
                String::new()
            }
        };
        targets.push(ScanTarget::new(container_name, current, upstream.as_str()));
    }

    targets
}

/// Container name carried by a per-container annotation key
fn container_key<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    let name = key.strip_prefix(prefix)?;
    if name.is_empty() || name.contains('/') || name == RESERVED_SUFFIX {
        return None;
    }
    Some(name)
}

fn container_version(workload: &Workload, container: &str, image: &str, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => tag.to_string(),
        None => {
            tracing::warn!(
                workload = %workload.qualified_name(),
                container = %container,
                image = %image,
                "Could not extract a tag from image reference"
            );
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeInventory;
    use std::sync::Arc;

    fn settings() -> ScanSettings {
        ScanSettings::default()
    }

    #[test]
    fn test_project_annotation_uses_first_container() {
        let workload = Workload::new(WorkloadKind::Pod, "default", "app-5d4f")
            .with_label("app", "app")
            .with_annotation("versions-exporter/githubRepo", "octocat/Hello-World")
            .with_container("app", "myrepo/app:1.2.3")
            .with_container("proxy", "envoy:1.30");

        let targets = targets_for(&workload, &settings());
        assert_eq!(
            targets,
            vec![ScanTarget::new("app", "1.2.3", "octocat/Hello-World")]
        );
    }

    #[test]
    fn test_container_annotation_uses_named_container() {
        let workload = Workload::new(WorkloadKind::Pod, "default", "jobs")
            .with_annotation("versions-exporter/worker", "octocat/Hello-World")
            .with_container("main", "app:9.9.9")
            .with_container("worker", "img:4.5.6");

        let targets = targets_for(&workload, &settings());
        assert_eq!(
            targets,
            vec![ScanTarget::new("worker", "4.5.6", "octocat/Hello-World")]
        );
    }

    #[test]
    fn test_both_modes_on_one_workload() {
        let workload = Workload::new(WorkloadKind::Pod, "default", "web")
            .with_annotation("versions-exporter/githubRepo", "acme/web")
            .with_annotation("versions-exporter/sidecar", "acme/sidecar")
            .with_container("web", "web:2.0")
            .with_container("sidecar", "sidecar:0.3");

        let targets = targets_for(&workload, &settings());
        assert_eq!(
            targets,
            vec![
                ScanTarget::new("web", "2.0", "acme/web"),
                ScanTarget::new("sidecar", "0.3", "acme/sidecar"),
            ]
        );
    }

    #[test]
    fn test_unmatched_container_yields_empty_version() {
        let workload = Workload::new(WorkloadKind::Pod, "default", "web")
            .with_annotation("versions-exporter/ghost", "acme/ghost")
            .with_container("web", "web:2.0");

        let targets = targets_for(&workload, &settings());
        assert_eq!(targets, vec![ScanTarget::new("ghost", "", "acme/ghost")]);
    }

    #[test]
    fn test_untagged_image_and_missing_containers() {
        let untagged = Workload::new(WorkloadKind::Pod, "default", "nginx")
            .with_annotation("versions-exporter/githubRepo", "nginx/nginx")
            .with_container("nginx", "registry.local:5000/nginx");
        assert_eq!(
            targets_for(&untagged, &settings()),
            vec![ScanTarget::new("nginx", "", "nginx/nginx")]
        );

        let empty = Workload::new(WorkloadKind::Deployment, "default", "empty")
            .with_annotation("versions-exporter/githubRepo", "acme/empty");
        assert_eq!(
            targets_for(&empty, &settings()),
            vec![ScanTarget::new("empty", "", "acme/empty")]
        );
    }

    #[test]
    fn test_ignored_annotation_keys() {
        assert_eq!(container_key("versions-exporter/worker", "versions-exporter/"), Some("worker"));
        assert_eq!(container_key("versions-exporter/githubRepo", "versions-exporter/"), None);
        assert_eq!(container_key("versions-exporter/a/b", "versions-exporter/"), None);
        assert_eq!(container_key("versions-exporter/", "versions-exporter/"), None);
        assert_eq!(container_key("other/worker", "versions-exporter/"), None);

        let workload = Workload::new(WorkloadKind::Pod, "default", "plain")
            .with_annotation("kubectl.kubernetes.io/restartedAt", "now")
            .with_container("plain", "plain:1");
        assert!(targets_for(&workload, &settings()).is_empty());
    }

    #[test]
    fn test_custom_annotation_name() {
        let settings = ScanSettings {
            annotation_name: "patate/poil".to_string(),
            ..ScanSettings::default()
        };
        let workload = Workload::new(WorkloadKind::Pod, "default", "web")
            .with_annotation("patate/poil", "acme/web")
            .with_annotation("versions-exporter/githubRepo", "acme/ignored")
            .with_container("web", "web:1.0");

        assert_eq!(
            targets_for(&workload, &settings),
            vec![ScanTarget::new("web", "1.0", "acme/web")]
        );
    }

    #[tokio::test]
    async fn test_scan_order_and_failed_kinds() {
        let inventory = FakeInventory::new()
            .with_workload(
                Workload::new(WorkloadKind::DaemonSet, "kube-system", "agent")
                    .with_annotation("versions-exporter/githubRepo", "acme/agent")
                    .with_container("agent", "agent:0.1"),
            )
            .with_workload(
                Workload::new(WorkloadKind::Pod, "default", "web")
                    .with_annotation("versions-exporter/githubRepo", "acme/web")
                    .with_container("web", "web:1.0"),
            )
            .failing(WorkloadKind::Deployment);

        let settings = ScanSettings {
            kinds: WorkloadKind::ALL.to_vec(),
            ..ScanSettings::default()
        };
        let output = scan(&inventory, &settings).await;

        let names: Vec<_> = output.targets.iter().map(|t| t.application_name.as_str()).collect();
        assert_eq!(names, vec!["web", "agent"]);
        assert_eq!(output.failed_kinds, vec![WorkloadKind::Deployment]);
    }

    #[tokio::test]
    async fn test_scan_runs_on_spawned_task() {
        let inventory = Arc::new(FakeInventory::new().with_workload(
            Workload::new(WorkloadKind::DaemonSet, "kube-system", "agent")
                .with_annotation("versions-exporter/githubRepo", "acme/agent")
                .with_container("agent", "agent:0.1"),
        ));
        let settings = ScanSettings {
            kinds: vec![WorkloadKind::DaemonSet, WorkloadKind::Pod],
            ..ScanSettings::default()
        };

        let output = tokio::spawn(async move { scan(inventory.as_ref(), &settings).await })
            .await
            .unwrap();
        assert_eq!(
            output.targets,
            vec![ScanTarget::new("agent", "0.1", "acme/agent")]
        );
    }

    #[tokio::test]
    async fn test_scan_skips_unconfigured_kinds() {
        let inventory = FakeInventory::new().with_workload(
            Workload::new(WorkloadKind::Deployment, "default", "api")
                .with_annotation("versions-exporter/githubRepo", "acme/api")
                .with_container("api", "api:1"),
        );

        let output = scan(&inventory, &ScanSettings::default()).await;
        assert!(output.targets.is_empty());
        assert!(output.failed_kinds.is_empty());
    }
}
