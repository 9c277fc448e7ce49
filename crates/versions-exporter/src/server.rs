//! Server setup and lifecycle management

use crate::api::{create_router, AppState};
use crate::config::ExporterConfig;
use crate::error::{ExporterError, ExporterResult};
use crate::inventory::{InventoryClient, KubeInventory, ScanSettings};
use crate::scheduler::{MetricsPublisher, ReconcileSettings, Reconciler, Scheduler};
use crate::upstream::{GitHubReleaseClient, ReleaseClient, VersionResolver};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use versions_exporter_observability::MetricsRegistry;
use versions_exporter_types::VersionRecordSet;

/// versions-exporter server: the reconciliation loop plus the metrics endpoint
pub struct Server {
    config: ExporterConfig,
    metrics: Arc<MetricsRegistry>,
    scheduler: Scheduler,
}

impl Server {
    /// Build a server talking to the configured cluster and GitHub.
    ///
    /// Fails when the Kubernetes or GitHub client cannot be constructed.
    pub async fn from_config(config: ExporterConfig) -> ExporterResult<Self> {
        let inventory = KubeInventory::connect(
            config.out_of_cluster(),
            config.kubeconfig.as_deref(),
            config.list_timeout(),
        )
        .await?;

        let releases = GitHubReleaseClient::new(
            &config.github_api_url,
            config.github_token.as_deref(),
            config.request_timeout(),
        )
        .map_err(|e| ExporterError::Upstream(e.to_string()))?;

        Self::new(config, Arc::new(inventory), Arc::new(releases))
    }

    /// Build a server over the given clients
    pub fn new(
        config: ExporterConfig,
        inventory: Arc<dyn InventoryClient>,
        releases: Arc<dyn ReleaseClient>,
    ) -> ExporterResult<Self> {
        config.validate()?;
        let metrics = Arc::new(MetricsRegistry::new());

        let settings = ReconcileSettings {
            scan: ScanSettings {
                annotation_name: config.annotation_name().to_string(),
                container_annotation_prefix: config.container_annotation_prefix.clone(),
                kinds: config.kinds()?,
            },
            max_concurrent_resolutions: config.max_concurrent_resolutions,
            cache_per_cycle: config.cache_per_cycle,
        };

        let resolver = VersionResolver::new(releases).with_metrics(metrics.clone());
        let reconciler = Reconciler::new(inventory, resolver, settings).with_metrics(metrics.clone());
        let publisher = MetricsPublisher::register(&metrics)?;
        let scheduler = Scheduler::new(reconciler, publisher, config.refresh_interval())
            .with_metrics(metrics.clone());

        Ok(Self {
            config,
            metrics,
            scheduler,
        })
    }

    pub fn metrics(&self) -> Arc<MetricsRegistry> {
        self.metrics.clone()
    }

    /// HTTP router serving this server's registry
    pub fn router(&self) -> Router {
        create_router(AppState::new(self.metrics.clone(), self.scheduler.status()))
    }

    /// Run a single reconciliation cycle and return its records
    pub async fn run_once(&self) -> VersionRecordSet {
        self.scheduler.run_cycle().await
    }

    /// Serve `/metrics` and run the scheduler until SIGINT or SIGTERM
    pub async fn run(self) -> ExporterResult<()> {
        let addr = self.config.listen_addr();
        let app = self.router();

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("versions-exporter listening on {}", addr);
        tracing::info!(
            annotation = %self.config.annotation_name(),
            kinds = %self.config.workload_kinds,
            "Watching annotated workloads"
        );

        // Start scheduler in background
        let scheduler = tokio::spawn(self.scheduler.run());

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ExporterError::Server(e.to_string()))?;

        tracing::info!("versions-exporter shutting down");

        // An in-flight cycle is abandoned
        scheduler.abort();

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeInventory, FakeReleases};

    #[test]
    fn test_new_rejects_unknown_kind() {
        let config = ExporterConfig {
            workload_kinds: "pods,jobs".to_string(),
            ..ExporterConfig::default()
        };
        let result = Server::new(
            config,
            Arc::new(FakeInventory::new()),
            Arc::new(FakeReleases::new()),
        );
        assert!(matches!(result, Err(ExporterError::Config(_))));
    }

    #[tokio::test]
    async fn test_run_once_with_empty_cluster() {
        let server = Server::new(
            ExporterConfig::default(),
            Arc::new(FakeInventory::new()),
            Arc::new(FakeReleases::new()),
        )
        .unwrap();

        let records = server.run_once().await;
        assert!(records.is_empty());
        assert_eq!(server.metrics().exporter().records.get(), 0);
    }
}
