//! GitHub releases client

use super::{Release, ReleaseClient};
use crate::error::ResolveError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use versions_exporter_types::UpstreamProject;

/// Public GitHub REST API
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Release client for the GitHub REST API
#[derive(Clone)]
pub struct GitHubReleaseClient {
    client: Client,
    base_url: String,
}

impl GitHubReleaseClient {
    /// Create a client; `token` enables authenticated requests.
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            if let Ok(mut value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            } else {
                tracing::warn!("GitHub token is not a valid header value, sending anonymous requests");
            }
        }

        let client = Client::builder()
            .user_agent(concat!("versions-exporter/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn latest_url(&self, project: &UpstreamProject) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.base_url, project.owner, project.repo
        )
    }

    async fn handle_response(
        &self,
        project: &UpstreamProject,
        response: Response,
    ) -> Result<Release, ResolveError> {
        let status = response.status();

        if status.is_success() {
            return response.json::<Release>().await.map_err(|e| ResolveError::Decode {
                project: project.to_string(),
                message: e.to_string(),
            });
        }

        match status {
            StatusCode::NOT_FOUND => Err(ResolveError::NotFound(project.to_string())),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                Err(ResolveError::RateLimited(project.to_string()))
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(ResolveError::Api {
                    project: project.to_string(),
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[async_trait]
impl ReleaseClient for GitHubReleaseClient {
    async fn latest_release(&self, project: &UpstreamProject) -> Result<Release, ResolveError> {
        let url = self.latest_url(project);
        tracing::debug!(project = %project, url = %url, "Fetching latest release");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolveError::Transport {
                project: project.to_string(),
                message: e.to_string(),
            })?;

        self.handle_response(project, response).await
    }
}
