//! HTTP request handlers for the vector index health API

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::core::AppState;
use crate::health::responses::{ErrorResponse, HealthResponse, StatsResponse};
use crate::system::metrics;

/// State shared by all handlers
pub type SharedState = Arc<AppState>;

/// Service information returned by `GET /`
#[derive(Serialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub index_name: String,
    pub provider: String,
    pub endpoints: Vec<String>,
}

fn observe(state: &AppState, endpoint: &str, success: bool, started: Instant) {
    if let Some(endpoint_metrics) = &state.endpoint_metrics {
        let outcome = if success { "ok" } else { "error" };
        endpoint_metrics.observe(endpoint, outcome, started.elapsed());
    }
}

/// `GET /`
pub async fn root_handler(State(state): State<SharedState>) -> Json<InfoResponse> {
    let descriptor = state.health.client().descriptor();
    let mut endpoints = vec![
        "GET /vector-db/health".to_string(),
        "GET /vector-db/health/detailed".to_string(),
        "GET /vector-db/stats".to_string(),
    ];
    if state.config.metrics.enable_prometheus {
        endpoints.push("GET /vector-db/metrics".to_string());
    }

    Json(InfoResponse {
        name: crate::NAME.to_string(),
        version: crate::VERSION.to_string(),
        index_name: descriptor.index_name.clone(),
        provider: descriptor.provider.clone(),
        endpoints,
    })
}

/// `GET /vector-db/health` - fast liveness probe for load balancers
pub async fn vector_db_health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let started = Instant::now();
    let (code, body) = state.health.basic_check().await;
    observe(&state, "health", code.is_success(), started);
    (code, Json(body))
}

/// `GET /vector-db/health/detailed` - full diagnostics for dashboards
pub async fn vector_db_health_detailed(State(state): State<SharedState>) -> Response {
    let started = Instant::now();
    let response = match state.health.detailed_check().await {
        Ok((code, body)) => (code, Json(body)).into_response(),
        Err(failure) => (StatusCode::SERVICE_UNAVAILABLE, Json(failure)).into_response(),
    };
    observe(&state, "health_detailed", response.status().is_success(), started);
    response
}

/// `GET /vector-db/stats` - raw index statistics
pub async fn vector_db_stats(
    State(state): State<SharedState>,
) -> Result<Json<StatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let started = Instant::now();
    let result = state.health.stats().await;
    observe(&state, "stats", result.is_ok(), started);

    result.map(Json).map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::service_unavailable(e.to_string())),
        )
    })
}

/// `GET /vector-db/metrics` - Prometheus scrape target, always 200
pub async fn vector_db_metrics(State(state): State<SharedState>) -> impl IntoResponse {
    let started = Instant::now();
    let mut body = state.health.export_metrics().await;
    observe(&state, "metrics", true, started);

    if let Some(endpoint_metrics) = &state.endpoint_metrics {
        match endpoint_metrics.render() {
            Ok(text) => body.push_str(&text),
            Err(e) => tracing::warn!(error = %e, "Failed to encode endpoint metrics"),
        }
    }

    ([(CONTENT_TYPE, metrics::CONTENT_TYPE)], body)
}
