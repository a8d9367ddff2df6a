//! Response bodies of the vector index endpoints

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::client::NamespaceStats;

/// Basic health check body
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// healthy, degraded or unhealthy
    pub status: &'static str,
    /// When the response was built
    pub timestamp: DateTime<Utc>,
    /// Seconds since the monitor started
    pub uptime_seconds: f64,
    /// Service version
    pub version: String,
    /// Deployment environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// Index description and statistics in the detailed check
#[derive(Debug, Clone, Serialize)]
pub struct VectorDbInfo {
    pub provider: String,
    pub index_name: String,
    pub total_vectors: u64,
    pub dimension: u32,
    pub index_fullness: f64,
    pub metric: String,
    pub cloud: String,
    pub region: String,
    pub environment: String,
    pub namespaces: BTreeMap<String, NamespaceStats>,
}

/// Check performance in the detailed check
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceInfo {
    /// Time spent serving this request
    pub response_time_ms: f64,
    /// Checks recorded over the process lifetime
    pub total_checks: u64,
    /// Unhealthy share of recorded checks, 3 decimals
    pub error_rate: f64,
    /// Most recent recorded check
    pub last_check: Option<DateTime<Utc>>,
    /// Heuristic only: a fast response is assumed to have hit the client cache
    pub cache_hit: bool,
}

/// Detailed health check body
#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: f64,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub vector_db: VectorDbInfo,
    pub performance: PerformanceInfo,
}

/// Body of a detailed check that could not reach the index
#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealthFailure {
    /// Always unhealthy
    pub status: &'static str,
    /// Error reported by the client
    pub error: String,
    /// Time spent before giving up
    pub response_time_ms: f64,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: f64,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// Index statistics body
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_vector_count: u64,
    pub dimension: u32,
    pub index_fullness: f64,
    pub namespaces: BTreeMap<String, NamespaceStats>,
    /// When the statistics were served
    pub retrieved_at: DateTime<Utc>,
}

/// Error body for failed requests
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    pub error: String,
    /// Human-readable message
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Service-unavailable error carrying `message`
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self {
            error: "service_unavailable".to_string(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
