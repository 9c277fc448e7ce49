//! Error types for versions-exporter-observability

use thiserror::Error;

/// Errors that can occur in observability operations
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// Metric creation, registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Subscriber installation failed
    #[error("Tracing error: {0}")]
    Tracing(String),
}

impl From<prometheus::Error> for ObservabilityError {
    fn from(e: prometheus::Error) -> Self {
        ObservabilityError::Metrics(e.to_string())
    }
}

/// Result type alias for observability operations
pub type Result<T> = std::result::Result<T, ObservabilityError>;
