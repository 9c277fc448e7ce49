//! Upstream release lookup

mod github;
mod resolver;

pub use github::{GitHubReleaseClient, DEFAULT_API_URL};
pub use resolver::VersionResolver;

use crate::error::ResolveError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use versions_exporter_types::UpstreamProject;

/// A published release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Release {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            name: None,
        }
    }
}

/// Source of "latest release" answers for upstream projects
#[async_trait]
pub trait ReleaseClient: Send + Sync {
    /// Latest published release of `project`
    async fn latest_release(&self, project: &UpstreamProject) -> Result<Release, ResolveError>;
}
