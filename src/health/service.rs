//! Health endpoint logic
//!
//! [`HealthService`] sits between the HTTP handlers and the vector index
//! client. Every client call is bounded by the configured call timeout and
//! every client failure is caught and logged here, so handlers only ever see
//! ready-made response values.

use axum::http::StatusCode;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::monitor::HealthMonitor;
use super::recorder::CheckRecorder;
use super::responses::{
    DetailedHealthFailure, DetailedHealthResponse, HealthResponse, PerformanceInfo,
    StatsResponse, VectorDbInfo,
};
use super::status::{map_health_state, STATUS_UNHEALTHY};
use crate::client::{ClientError, HealthState, StatsSnapshot, VectorIndexClient};
use crate::system::metrics;

/// Responses at or under this many milliseconds are reported as cache hits
pub const CACHE_HIT_THRESHOLD_MS: f64 = 1000.0;

/// Static facts reported in every response
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    /// Service version
    pub version: String,
    /// Deployment environment
    pub environment: Option<String>,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            version: crate::VERSION.to_string(),
            environment: None,
        }
    }
}

/// Health checks, stats and metrics export for one vector index
pub struct HealthService {
    client: Arc<dyn VectorIndexClient>,
    monitor: Arc<HealthMonitor>,
    recorder: CheckRecorder,
    call_timeout: Duration,
    info: ServiceInfo,
}

impl HealthService {
    /// Create the service and start its check recorder.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        client: Arc<dyn VectorIndexClient>,
        monitor: Arc<HealthMonitor>,
        call_timeout: Duration,
        recorder_capacity: usize,
        info: ServiceInfo,
    ) -> Self {
        let recorder = CheckRecorder::spawn(monitor.clone(), recorder_capacity);
        Self {
            client,
            monitor,
            recorder,
            call_timeout,
            info,
        }
    }

    /// Shared monitor
    pub fn monitor(&self) -> &Arc<HealthMonitor> {
        &self.monitor
    }

    /// Underlying client
    pub fn client(&self) -> &Arc<dyn VectorIndexClient> {
        &self.client
    }

    async fn call<T, F>(&self, operation: &str, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(format!(
                "{} timed out after {}ms",
                operation,
                self.call_timeout.as_millis()
            ))),
        }
    }

    fn uptime_seconds(&self) -> f64 {
        self.monitor.uptime().as_secs_f64()
    }

    /// Fast liveness check answered from the client's cache when possible.
    ///
    /// The check is recorded in the background; a client failure becomes a
    /// 503 "unhealthy" response and is recorded as unhealthy.
    pub async fn basic_check(&self) -> (StatusCode, HealthResponse) {
        let state = match self.call("health check", self.client.health_check(false)).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Basic vector index health check failed");
                HealthState::Unhealthy
            }
        };

        self.recorder.submit(state);

        let (code, status) = map_health_state(state);
        let body = HealthResponse {
            status,
            timestamp: Utc::now(),
            uptime_seconds: self.uptime_seconds(),
            version: self.info.version.clone(),
            environment: self.info.environment.clone(),
        };
        (code, body)
    }

    /// Full diagnostic with a forced health probe and fresh statistics.
    ///
    /// The check is recorded before returning. `Err` carries an explicit
    /// failure body meant to be served with 503.
    pub async fn detailed_check(
        &self,
    ) -> Result<(StatusCode, DetailedHealthResponse), DetailedHealthFailure> {
        let started = Instant::now();

        let reading = async {
            let state = self.call("forced health check", self.client.health_check(true)).await?;
            let stats = self.call("stats fetch", self.client.get_stats()).await?;
            Ok::<_, ClientError>((state, stats))
        }
        .await;

        let response_time_ms = elapsed_ms(started);

        let (state, stats) = match reading {
            Ok(reading) => reading,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    response_time_ms,
                    "Detailed vector index health check failed"
                );
                self.monitor.record_check(HealthState::Unhealthy);
                return Err(DetailedHealthFailure {
                    status: STATUS_UNHEALTHY,
                    error: e.to_string(),
                    response_time_ms,
                    timestamp: Utc::now(),
                    uptime_seconds: self.uptime_seconds(),
                    version: self.info.version.clone(),
                    environment: self.info.environment.clone(),
                });
            }
        };

        self.monitor.record_check(state);
        let snapshot = self.monitor.snapshot();
        let descriptor = self.client.descriptor();
        let (code, status) = map_health_state(state);

        let body = DetailedHealthResponse {
            status,
            timestamp: Utc::now(),
            uptime_seconds: snapshot.uptime.as_secs_f64(),
            version: self.info.version.clone(),
            environment: self.info.environment.clone(),
            vector_db: VectorDbInfo {
                provider: descriptor.provider.clone(),
                index_name: descriptor.index_name.clone(),
                total_vectors: stats.total_vector_count,
                dimension: stats.dimension,
                index_fullness: stats.index_fullness,
                metric: descriptor.metric.clone(),
                cloud: descriptor.cloud.clone(),
                region: descriptor.region.clone(),
                environment: descriptor.environment.clone(),
                namespaces: stats.namespaces,
            },
            performance: PerformanceInfo {
                response_time_ms,
                total_checks: snapshot.total_checks,
                error_rate: snapshot.error_rate(),
                last_check: snapshot.last_check_time,
                cache_hit: response_time_ms <= CACHE_HIT_THRESHOLD_MS,
            },
        };

        if code != StatusCode::OK {
            tracing::warn!(status = %state, "Vector index reported unhealthy");
        }
        Ok((code, body))
    }

    /// Current index statistics; leaves the monitor untouched
    pub async fn stats(&self) -> Result<StatsResponse, ClientError> {
        let stats = self
            .call("stats fetch", self.client.get_stats())
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Vector index stats fetch failed"))?;

        Ok(StatsResponse {
            total_vector_count: stats.total_vector_count,
            dimension: stats.dimension,
            index_fullness: stats.index_fullness,
            namespaces: stats.namespaces,
            retrieved_at: Utc::now(),
        })
    }

    /// Prometheus text for the index; never fails
    pub async fn export_metrics(&self) -> String {
        match self.read_for_export().await {
            Ok((state, stats)) => {
                let snapshot = self.monitor.snapshot();
                metrics::render_index_metrics(state, &stats, &snapshot).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to encode vector index metrics");
                    metrics::sentinel_document()
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Vector index unavailable for metrics export");
                metrics::sentinel_document()
            }
        }
    }

    async fn read_for_export(&self) -> Result<(HealthState, StatsSnapshot), ClientError> {
        let state = self.call("health check", self.client.health_check(false)).await?;
        let stats = self.call("stats fetch", self.client.get_stats()).await?;
        Ok((state, stats))
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    let ms = started.elapsed().as_secs_f64() * 1000.0;
    (ms * 100.0).round() / 100.0
}
