//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use versions_exporter_observability::metrics_router;

/// Create the exporter router: `/health` plus the registry's `/metrics`
pub fn create_router(state: AppState) -> Router {
    let metrics = metrics_router(state.metrics.clone());

    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .merge(metrics)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{MetricsPublisher, SchedulerStatus};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;
    use versions_exporter_observability::MetricsRegistry;
    use versions_exporter_types::{VersionRecord, VersionRecordSet};

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = AppState::new(Arc::new(MetricsRegistry::new()), SchedulerStatus::new());
        let response = create_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["scheduler"]["state"], "idle");
        assert_eq!(json["scheduler"]["cycles_completed"], 0);
    }

    #[tokio::test]
    async fn test_metrics() {
        let registry = Arc::new(MetricsRegistry::new());
        let publisher = MetricsPublisher::register(&registry).unwrap();
        let records: VersionRecordSet = vec![VersionRecord::new("web", "1.2.3", "1.3.0")].into();
        publisher.publish(&records);

        let state = AppState::new(registry, SchedulerStatus::new());
        let response = create_router(state)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_string(response).await;
        assert!(text.contains(
            r#"application_info{application_name="web",current_version="1.2.3",latest_version="1.3.0"} 1"#
        ));
        assert!(text.contains("versions_exporter_records"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let state = AppState::new(Arc::new(MetricsRegistry::new()), SchedulerStatus::new());
        let response = create_router(state)
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
