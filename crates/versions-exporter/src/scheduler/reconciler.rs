//! Reconciliation engine

use crate::inventory::{scan, InventoryClient, ScanSettings};
use crate::upstream::VersionResolver;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use versions_exporter_observability::MetricsRegistry;
use versions_exporter_types::{ScanTarget, VersionRecordSet};

/// Reconciliation settings
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub scan: ScanSettings,

    /// Upstream lookups allowed in flight at once
    pub max_concurrent_resolutions: usize,

    /// Resolve each distinct project once per cycle
    pub cache_per_cycle: bool,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            scan: ScanSettings::default(),
            max_concurrent_resolutions: 1,
            cache_per_cycle: false,
        }
    }
}

/// Scans the inventory and resolves every target into a version record
pub struct Reconciler {
    inventory: Arc<dyn InventoryClient>,
    resolver: VersionResolver,
    settings: ReconcileSettings,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Reconciler {
    pub fn new(
        inventory: Arc<dyn InventoryClient>,
        resolver: VersionResolver,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            inventory,
            resolver,
            settings,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build this cycle's record set.
    ///
    /// Records follow scan order whatever the resolution concurrency. Nothing
    /// is kept between calls.
    pub async fn reconcile(&self) -> VersionRecordSet {
        let output = scan(self.inventory.as_ref(), &self.settings.scan).await;

        if let Some(metrics) = &self.metrics {
            for kind in &output.failed_kinds {
                metrics.exporter().record_scan_error(kind.as_str());
            }
        }

        tracing::debug!(
            targets = output.targets.len(),
            failed_kinds = output.failed_kinds.len(),
            "Inventory scanned"
        );

        if self.settings.cache_per_cycle {
            self.resolve_memoized(output.targets).await
        } else {
            self.resolve_each(output.targets).await
        }
    }

    fn concurrency(&self) -> usize {
        self.settings.max_concurrent_resolutions.max(1)
    }

    async fn resolve_each(&self, targets: Vec<ScanTarget>) -> VersionRecordSet {
        let resolver = self.resolver.clone();
        stream::iter(targets)
            .map(move |target| {
                let resolver = resolver.clone();
                async move {
                    let latest = resolver.resolve_or_empty(&target.upstream).await;
                    target.into_record(latest)
                }
            })
            .buffered(self.concurrency())
            .collect::<Vec<_>>()
            .await
            .into()
    }

    async fn resolve_memoized(&self, targets: Vec<ScanTarget>) -> VersionRecordSet {
        let mut projects: Vec<String> = Vec::new();
        for target in &targets {
            if !projects.contains(&target.upstream) {
                projects.push(target.upstream.clone());
            }
        }

        let resolver = self.resolver.clone();
        let tags: Vec<String> = stream::iter(projects.clone())
            .map(move |project| {
                let resolver = resolver.clone();
                async move { resolver.resolve_or_empty(&project).await }
            })
            .buffered(self.concurrency())
            .collect()
            .await;

        let memo: HashMap<String, String> = projects.into_iter().zip(tags).collect();

        targets
            .into_iter()
            .map(|target| {
                let latest = memo.get(&target.upstream).cloned().unwrap_or_default();
                target.into_record(latest)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::testing::{FakeInventory, FakeReleases};
    use versions_exporter_types::{VersionRecord, Workload, WorkloadKind};

    fn pod(name: &str, project: &str, image: &str) -> Workload {
        Workload::new(WorkloadKind::Pod, "default", name)
            .with_annotation("versions-exporter/githubRepo", project)
            .with_container(name, image)
    }

    fn reconciler(
        inventory: FakeInventory,
        releases: Arc<FakeReleases>,
        settings: ReconcileSettings,
    ) -> Reconciler {
        Reconciler::new(Arc::new(inventory), VersionResolver::new(releases), settings)
    }

    #[tokio::test]
    async fn test_failed_resolution_keeps_record() {
        let inventory = FakeInventory::new()
            .with_workload(pod("web", "acme/web", "web:1.0"))
            .with_workload(pod("db", "acme/db", "db:14"))
            .with_workload(pod("cache", "acme/cache", "cache:7"));
        let releases = Arc::new(
            FakeReleases::new()
                .with_release("acme/web", "1.1")
                .with_release("acme/cache", "7")
                .failing("acme/db", ResolveError::RateLimited("acme/db".to_string())),
        );

        let records = reconciler(inventory, releases, ReconcileSettings::default())
            .reconcile()
            .await;

        assert_eq!(
            records.as_slice(),
            &[
                VersionRecord::new("web", "1.0", "1.1"),
                VersionRecord::new("db", "14", ""),
                VersionRecord::new("cache", "7", "7"),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_resolution_keeps_scan_order() {
        let mut inventory = FakeInventory::new();
        let mut releases = FakeReleases::new();
        for i in 0..20 {
            let name = format!("app{}", i);
            let project = format!("acme/{}", name);
            inventory = inventory.with_workload(pod(&name, &project, &format!("{}:{}", name, i)));
            releases = releases.with_release(&project, &format!("{}", i + 1));
        }

        let settings = ReconcileSettings {
            max_concurrent_resolutions: 8,
            ..ReconcileSettings::default()
        };
        let records = reconciler(inventory, Arc::new(releases), settings)
            .reconcile()
            .await;

        let names: Vec<_> = records.iter().map(|r| r.application_name.clone()).collect();
        let expected: Vec<_> = (0..20).map(|i| format!("app{}", i)).collect();
        assert_eq!(names, expected);
        assert_eq!(records.as_slice()[3], VersionRecord::new("app3", "3", "4"));
    }

    #[tokio::test]
    async fn test_no_dedup_by_default() {
        let inventory = FakeInventory::new()
            .with_workload(pod("a", "acme/shared", "a:1"))
            .with_workload(pod("b", "acme/shared", "b:1"))
            .with_workload(pod("c", "acme/shared", "c:2"));
        let releases = Arc::new(FakeReleases::new().with_release("acme/shared", "2"));

        let records = reconciler(inventory, releases.clone(), ReconcileSettings::default())
            .reconcile()
            .await;
        assert_eq!(records.len(), 3);
        assert_eq!(releases.calls(), 3);
    }

    #[tokio::test]
    async fn test_cache_per_cycle_resolves_once() {
        let inventory = FakeInventory::new()
            .with_workload(pod("a", "acme/shared", "a:1"))
            .with_workload(pod("b", "acme/other", "b:1"))
            .with_workload(pod("c", "acme/shared", "c:2"));
        let releases = Arc::new(
            FakeReleases::new()
                .with_release("acme/shared", "2")
                .with_release("acme/other", "5"),
        );
        let settings = ReconcileSettings {
            cache_per_cycle: true,
            ..ReconcileSettings::default()
        };

        let reconciler = reconciler(inventory, releases.clone(), settings);
        let records = reconciler.reconcile().await;
        assert_eq!(
            records.as_slice(),
            &[
                VersionRecord::new("a", "1", "2"),
                VersionRecord::new("b", "1", "5"),
                VersionRecord::new("c", "2", "2"),
            ]
        );
        assert_eq!(releases.calls(), 2);

        // The memo does not survive the cycle
        reconciler.reconcile().await;
        assert_eq!(releases.calls(), 4);
    }

    #[tokio::test]
    async fn test_reconcile_runs_on_spawned_task() {
        let releases = Arc::new(FakeReleases::new().with_release("acme/shared", "2"));

        for cache_per_cycle in [false, true] {
            let inventory = FakeInventory::new()
                .with_workload(pod("a", "acme/shared", "a:1"))
                .with_workload(pod("b", "acme/shared", "b:2"));
            let settings = ReconcileSettings {
                max_concurrent_resolutions: 2,
                cache_per_cycle,
                ..ReconcileSettings::default()
            };
            let reconciler = Arc::new(reconciler(inventory, releases.clone(), settings));

            let records = tokio::spawn(async move { reconciler.reconcile().await })
                .await
                .unwrap();
            assert_eq!(
                records.as_slice(),
                &[
                    VersionRecord::new("a", "1", "2"),
                    VersionRecord::new("b", "2", "2"),
                ]
            );
        }
    }

    #[tokio::test]
    async fn test_scan_errors_are_counted() {
        let registry = Arc::new(MetricsRegistry::new());
        let inventory = FakeInventory::new()
            .with_workload(pod("web", "acme/web", "web:1"))
            .failing(WorkloadKind::DaemonSet);
        let releases = Arc::new(FakeReleases::new().with_release("acme/web", "1"));
        let settings = ReconcileSettings {
            scan: ScanSettings {
                kinds: WorkloadKind::ALL.to_vec(),
                ..ScanSettings::default()
            },
            ..ReconcileSettings::default()
        };

        let records = reconciler(inventory, releases, settings)
            .with_metrics(registry.clone())
            .reconcile()
            .await;

        assert_eq!(records.len(), 1);
        let counter = &registry.exporter().scan_errors_total;
        assert_eq!(counter.with_label_values(&["daemonsets"]).get(), 1);
        assert_eq!(counter.with_label_values(&["pods"]).get(), 0);
    }
}
