//! Error types for versions-exporter

use thiserror::Error;
use versions_exporter_observability::ObservabilityError;
use versions_exporter_types::{UpstreamProjectError, WorkloadKind};

/// Exporter-level errors, all fatal at startup
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cluster inventory client could not be built
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Upstream release client could not be built
    #[error("Upstream client error: {0}")]
    Upstream(String),

    /// Metrics or tracing setup failed
    #[error("Observability error: {0}")]
    Observability(#[from] ObservabilityError),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ExporterError {
    fn from(e: config::ConfigError) -> Self {
        ExporterError::Config(e.to_string())
    }
}

/// Cluster inventory errors
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Client configuration or construction failed
    #[error("failed to build cluster client: {0}")]
    Client(String),

    /// A list call failed
    #[error("failed to list {kind}: {message}")]
    List { kind: WorkloadKind, message: String },

    /// A list call did not answer in time
    #[error("listing {kind} timed out after {timeout_secs}s")]
    Timeout { kind: WorkloadKind, timeout_secs: u64 },
}

/// Upstream release resolution errors
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Identifier is not `owner/repo`
    #[error(transparent)]
    InvalidProject(#[from] UpstreamProjectError),

    /// Repository or release does not exist
    #[error("no published release found for {0}")]
    NotFound(String),

    /// API quota exhausted or access refused
    #[error("rate limited while resolving {0}")]
    RateLimited(String),

    /// Any other non-success response
    #[error("upstream API returned {status} for {project}: {message}")]
    Api {
        project: String,
        status: u16,
        message: String,
    },

    /// Connection, TLS or timeout failure
    #[error("request for {project} failed: {message}")]
    Transport { project: String, message: String },

    /// Response body was not a release
    #[error("invalid release response for {project}: {message}")]
    Decode { project: String, message: String },
}

impl ResolveError {
    /// Short failure class, used as a metric label
    pub fn reason(&self) -> &'static str {
        match self {
            ResolveError::InvalidProject(_) => "invalid_project",
            ResolveError::NotFound(_) => "not_found",
            ResolveError::RateLimited(_) => "rate_limited",
            ResolveError::Api { .. } => "api",
            ResolveError::Transport { .. } => "transport",
            ResolveError::Decode { .. } => "decode",
        }
    }
}

/// Result type alias for exporter operations
pub type ExporterResult<T> = Result<T, ExporterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_reasons() {
        assert_eq!(
            ResolveError::NotFound("a/b".to_string()).reason(),
            "not_found"
        );
        assert_eq!(
            ResolveError::InvalidProject(UpstreamProjectError("ab".to_string())).reason(),
            "invalid_project"
        );
        assert_eq!(
            ResolveError::Api {
                project: "a/b".to_string(),
                status: 500,
                message: "boom".to_string(),
            }
            .reason(),
            "api"
        );
    }

    #[test]
    fn test_inventory_error_display() {
        let err = InventoryError::Timeout {
            kind: WorkloadKind::Deployment,
            timeout_secs: 30,
        };
        assert_eq!(err.to_string(), "listing deployments timed out after 30s");

        let err: ExporterError = InventoryError::Client("no kubeconfig".to_string()).into();
        assert!(err.to_string().contains("no kubeconfig"));
    }
}
