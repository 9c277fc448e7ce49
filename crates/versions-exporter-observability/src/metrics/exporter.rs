//! Metrics exporter for Prometheus scraping

use crate::error::{ObservabilityError, Result};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};

/// Content type of the text exposition format
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Encode gathered metric families in Prometheus text format
pub fn export_metrics(metric_families: &[MetricFamily]) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ObservabilityError::Metrics(e.to_string()))
}

/// HTTP handler for metrics endpoint (requires "http" feature)
#[cfg(feature = "http")]
pub mod http {
    use crate::metrics::MetricsRegistry;
    use axum::{
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use std::sync::Arc;

    /// Handler for GET /metrics
    pub async fn metrics_handler(State(registry): State<Arc<MetricsRegistry>>) -> Response {
        match registry.export() {
            Ok(metrics) => (
                StatusCode::OK,
                [("content-type", super::TEXT_CONTENT_TYPE)],
                metrics,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode metrics");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }

    /// Create an axum router for metrics
    pub fn metrics_router(registry: Arc<MetricsRegistry>) -> axum::Router {
        use axum::routing::get;

        axum::Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(registry)
    }

}
