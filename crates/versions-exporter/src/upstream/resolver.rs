//! Version resolver

use super::ReleaseClient;
use crate::error::ResolveError;
use std::sync::Arc;
use versions_exporter_observability::MetricsRegistry;
use versions_exporter_types::UpstreamProject;

/// Resolves `owner/repo` identifiers to their latest release tag.
///
/// Every call goes to the release client: no caching, no retry.
#[derive(Clone)]
pub struct VersionResolver {
    client: Arc<dyn ReleaseClient>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl VersionResolver {
    pub fn new(client: Arc<dyn ReleaseClient>) -> Self {
        Self {
            client,
            metrics: None,
        }
    }

    /// Count failures in `versions_exporter_resolution_errors_total`
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Latest release tag of `project`
    pub async fn resolve(&self, project: &str) -> Result<String, ResolveError> {
        let project = UpstreamProject::parse(project)?;
        let release = self.client.latest_release(&project).await?;
        Ok(release.tag_name)
    }

    /// Latest release tag of `project`, or an empty string on failure.
    ///
    /// The failure is logged and counted, never propagated.
    pub async fn resolve_or_empty(&self, project: &str) -> String {
        match self.resolve(project).await {
            Ok(tag) => {
                tracing::debug!(project = %project, tag = %tag, "Resolved latest release");
                tag
            }
            Err(e) => {
                tracing::error!(
                    project = %project,
                    reason = e.reason(),
                    error = %e,
                    "Failed to resolve latest release"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.exporter().record_resolution_error(e.reason());
                }
                String::new()
            }
        }
    }
}
