//! `/metrics` endpoint for Prometheus scraping.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::registry::MetricsRegistry;

/// Router serving the registry at `GET /metrics`, ready to be merged into
/// an application router
pub fn metrics_router<S>(registry: MetricsRegistry) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry)
}

async fn metrics_handler(State(registry): State<MetricsRegistry>) -> Response {
    match registry.render() {
        Ok(metrics) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            metrics,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use prometheus::IntCounter;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let registry = MetricsRegistry::new();
        let counter = registry
            .register(IntCounter::new("scraped_total", "Scraped").unwrap())
            .unwrap();
        counter.inc();

        let app: Router = metrics_router(registry);
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; version=0.0.4"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8(body.to_vec())
            .unwrap()
            .contains("scraped_total 1"));
    }
}
