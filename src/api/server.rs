//! HTTP server implementation for the vector index health API

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, SharedState};
use super::routes::create_vector_db_routes;
use crate::core::{Error, Result};

/// Creates the main application router with all routes and middleware
pub fn create_app(state: SharedState) -> Router {
    let router = Router::new()
        .route("/", get(handlers::root_handler))
        .merge(create_vector_db_routes(state.config.metrics.enable_prometheus));

    let router = if state.config.server.enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET])
            .allow_headers([CONTENT_TYPE])
            .allow_origin(Any);
        router.layer(cors)
    } else {
        router
    };

    router
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn start_server<F>(addr: SocketAddr, state: SharedState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Cannot bind {}: {}", addr, e)))?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/vector-db/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::tests::test_descriptor;
    use crate::client::{ClientError, HealthState, InMemoryIndexClient};
    use crate::core::{AppState, Config};
    use crate::system::metrics::tests::assert_valid_exposition;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(client: Arc<InMemoryIndexClient>, configure: impl FnOnce(&mut Config)) -> Router {
        let mut config = Config::default();
        config.environment = Some("test".to_string());
        configure(&mut config);
        let state = AppState::new(config, client).unwrap().shared();
        create_app(state)
    }

    fn sample_client() -> Arc<InMemoryIndexClient> {
        Arc::new(InMemoryIndexClient::with_sample_data(test_descriptor()))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, body) = get(app, uri).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = app_with(sample_client(), |_| {});
        let (status, body) = get_json(app, "/vector-db/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["environment"], "test");
        assert!(body["uptime_seconds"].as_f64().is_some());
        assert!(body["timestamp"].as_str().is_some());
        assert!(body["version"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_health_route_degraded() {
        let client = sample_client();
        client.set_health(HealthState::Degraded);
        let app = app_with(client, |_| {});

        let (status, body) = get_json(app, "/vector-db/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_health_route_unreachable() {
        let client = sample_client();
        client.fail_health(ClientError::Unreachable("connection refused".to_string()));
        let app = app_with(client, |_| {});

        let (status, body) = get_json(app, "/vector-db/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_environment_omitted_when_unset() {
        let app = app_with(sample_client(), |config| config.environment = None);
        let (_, body) = get_json(app, "/vector-db/health").await;
        assert!(body.get("environment").is_none());
    }

    #[tokio::test]
    async fn test_detailed_route() {
        let app = app_with(sample_client(), |_| {});
        let (status, body) = get_json(app, "/vector-db/health/detailed").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["vector_db"]["provider"], "memory");
        assert_eq!(body["vector_db"]["total_vectors"], 9235);
        assert_eq!(body["vector_db"]["namespaces"]["billing"]["vector_count"], 2310);
        assert_eq!(body["performance"]["total_checks"], 1);
        assert_eq!(body["performance"]["cache_hit"], true);
    }

    #[tokio::test]
    async fn test_detailed_route_failure() {
        let client = sample_client();
        client.fail_health(ClientError::Timeout("probe timed out".to_string()));
        let app = app_with(client, |_| {});

        let (status, body) = get_json(app, "/vector-db/health/detailed").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
        assert!(body["error"].as_str().unwrap().contains("probe timed out"));
        assert!(body["response_time_ms"].as_f64().is_some());
    }

    #[tokio::test]
    async fn test_stats_route() {
        let app = app_with(sample_client(), |_| {});
        let (status, body) = get_json(app, "/vector-db/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_vector_count"], 9235);
        assert_eq!(body["dimension"], 384);
        assert!(body["retrieved_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_stats_route_failure_carries_message() {
        let client = sample_client();
        client.fail_stats(ClientError::Timeout("describe_index_stats timed out after 10s".to_string()));
        let app = app_with(client, |_| {});

        let (status, body) = get_json(app, "/vector-db/stats").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "service_unavailable");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("describe_index_stats timed out after 10s"));
    }

    #[tokio::test]
    async fn test_metrics_route_always_ok() {
        let client = sample_client();
        let app = app_with(client.clone(), |_| {});
        let (status, text) = get(app, "/vector-db/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_valid_exposition(&text);
        assert!(text.contains("vector_db_health_status 1\n"));

        client.fail_stats(ClientError::Unreachable("connection reset".to_string()));
        let app = app_with(client, |_| {});
        let (status, text) = get(app, "/vector-db/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_valid_exposition(&text);
        assert!(text.contains("vector_db_health_status -1\n"));
    }

    #[tokio::test]
    async fn test_metrics_route_with_endpoint_metrics() {
        let app = app_with(sample_client(), |config| config.metrics.endpoint_metrics = true);
        let (_, text) = get(app, "/vector-db/metrics").await;
        assert_valid_exposition(&text);
        assert!(text.contains("vector_health_requests_total{endpoint=\"metrics\",outcome=\"ok\"} 1"));
    }

    #[tokio::test]
    async fn test_metrics_route_disabled() {
        let app = app_with(sample_client(), |config| config.metrics.enable_prometheus = false);
        let (status, _) = get(app, "/vector-db/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let app = app_with(sample_client(), |_| {});
        let (status, body) = get_json(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["index_name"], "support-tickets");
        assert_eq!(body["endpoints"].as_array().unwrap().len(), 4);
    }
}
