//! REST client for a hosted vector index
//!
//! Speaks the Pinecone control-plane and data-plane APIs:
//! - `GET  {control}/indexes/{name}` - describe the index and discover its host
//! - `POST {control}/indexes` - create the index when missing
//! - `POST {host}/describe_index_stats` - statistics, also used as the health probe

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::{ClientError, HealthState, IndexDescriptor, NamespaceStats, StatsSnapshot, VectorIndexClient};
use crate::core::config::ClientConfig;

const API_VERSION: &str = "2024-07";

#[derive(Debug, Clone, Copy)]
struct CachedHealth {
    state: HealthState,
    checked_at: Instant,
}

/// Pinecone-style REST client with a cached health probe
pub struct HttpIndexClient {
    http: reqwest::Client,
    descriptor: IndexDescriptor,
    control_plane_url: String,
    api_key: Option<String>,
    host: RwLock<Option<String>>,
    host_pinned: bool,
    cache_ttl: Duration,
    degraded_fullness: f64,
    slow_probe_threshold: Duration,
    cached: Mutex<Option<CachedHealth>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeStatsBody {
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceBody>,
    #[serde(default)]
    dimension: u32,
    #[serde(default)]
    index_fullness: f64,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceBody {
    #[serde(default)]
    vector_count: u64,
}

#[derive(Debug, Deserialize)]
struct IndexModelBody {
    host: String,
}

impl DescribeStatsBody {
    fn into_snapshot(self) -> StatsSnapshot {
        StatsSnapshot {
            total_vector_count: self.total_vector_count,
            dimension: self.dimension,
            index_fullness: self.index_fullness,
            namespaces: self
                .namespaces
                .into_iter()
                .map(|(name, ns)| (name, NamespaceStats { vector_count: ns.vector_count }))
                .collect(),
            fetched_at: Utc::now(),
        }
    }
}

impl HttpIndexClient {
    /// Build a client from configuration; no network traffic happens here
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Setup(format!("Failed to build HTTP client: {}", e)))?;

        let host = config.host.as_deref().map(normalize_host);

        Ok(Self {
            http,
            descriptor: config.descriptor(),
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            host_pinned: host.is_some(),
            host: RwLock::new(host),
            cache_ttl: config.health_cache_ttl,
            degraded_fullness: config.degraded_fullness,
            slow_probe_threshold: config.slow_probe_threshold,
            cached: Mutex::new(None),
        })
    }

    /// Data-plane host, once known
    pub fn host(&self) -> Option<String> {
        self.host.read().clone()
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("X-Pinecone-API-Version", API_VERSION);
        match &self.api_key {
            Some(key) => builder.header("Api-Key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = self.request(builder).send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .ok()
            .filter(|body| !body.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        Err(ClientError::Api { status: status.as_u16(), message })
    }

    async fn fetch_stats(&self, host: &str) -> Result<StatsSnapshot, ClientError> {
        let url = format!("{}/describe_index_stats", host);
        let response = self.send(self.http.post(url).json(&json!({}))).await?;
        let body: DescribeStatsBody = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(body.into_snapshot())
    }

    async fn describe_index(&self) -> Result<IndexModelBody, ClientError> {
        let url = format!("{}/indexes/{}", self.control_plane_url, self.descriptor.index_name);
        let response = self.send(self.http.get(url)).await?;
        response.json().await.map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn create_index(&self) -> Result<IndexModelBody, ClientError> {
        let url = format!("{}/indexes", self.control_plane_url);
        let body = json!({
            "name": self.descriptor.index_name,
            "dimension": self.descriptor.dimension,
            "metric": self.descriptor.metric,
            "spec": {
                "serverless": {
                    "cloud": self.descriptor.cloud,
                    "region": self.descriptor.region,
                }
            }
        });
        let response = self.send(self.http.post(url).json(&body)).await?;
        response.json().await.map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Data-plane host, asking the control plane when it is not known yet
    async fn resolve_host(&self) -> Result<String, ClientError> {
        if let Some(host) = self.host() {
            return Ok(host);
        }

        match self.describe_index().await {
            Ok(model) => Ok(self.store_host(&model.host)),
            Err(ClientError::Api { status: 404, .. }) => {
                Err(ClientError::IndexNotFound(self.descriptor.index_name.clone()))
            }
            Err(e) => Err(e),
        }
    }

    fn store_host(&self, raw: &str) -> String {
        let host = normalize_host(raw);
        tracing::info!(index = %self.descriptor.index_name, host = %host, "Resolved vector index host");
        *self.host.write() = Some(host.clone());
        host
    }

    fn cached_state(&self) -> Option<HealthState> {
        let cached = (*self.cached.lock())?;
        (cached.checked_at.elapsed() < self.cache_ttl).then_some(cached.state)
    }

    fn store_state(&self, state: HealthState) {
        *self.cached.lock() = Some(CachedHealth {
            state,
            checked_at: Instant::now(),
        });
    }
}

#[async_trait]
impl VectorIndexClient for HttpIndexClient {
    async fn initialize(&self, create_if_missing: bool) -> Result<(), ClientError> {
        if self.host_pinned {
            let host = self.host().ok_or(ClientError::NotInitialized)?;
            let stats = self.fetch_stats(&host).await?;
            tracing::info!(
                index = %self.descriptor.index_name,
                host = %host,
                vectors = stats.total_vector_count,
                "Connected to vector index"
            );
            return Ok(());
        }

        let model = match self.describe_index().await {
            Ok(model) => model,
            Err(ClientError::Api { status: 404, .. }) if create_if_missing => {
                tracing::info!(index = %self.descriptor.index_name, "Index missing, creating it");
                self.create_index().await?
            }
            Err(ClientError::Api { status: 404, .. }) => {
                return Err(ClientError::IndexNotFound(self.descriptor.index_name.clone()));
            }
            Err(e) => return Err(e),
        };

        self.store_host(&model.host);
        Ok(())
    }

    async fn health_check(&self, force_refresh: bool) -> Result<HealthState, ClientError> {
        if !force_refresh {
            if let Some(state) = self.cached_state() {
                return Ok(state);
            }
        }

        let host = self.resolve_host().await?;

        let started = Instant::now();
        let state = match self.fetch_stats(&host).await {
            Ok(stats) => classify_probe(
                stats.index_fullness,
                started.elapsed(),
                self.degraded_fullness,
                self.slow_probe_threshold,
            ),
            Err(e @ (ClientError::Api { .. } | ClientError::Decode(_))) => {
                tracing::warn!(error = %e, "Vector index probe answered with an error");
                HealthState::Unhealthy
            }
            Err(e) => return Err(e),
        };

        self.store_state(state);
        Ok(state)
    }

    async fn get_stats(&self) -> Result<StatsSnapshot, ClientError> {
        let host = self.resolve_host().await?;
        self.fetch_stats(&host).await
    }

    fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }
}

/// Classify a successful stats probe
pub fn classify_probe(
    fullness: f64,
    latency: Duration,
    degraded_fullness: f64,
    slow_probe_threshold: Duration,
) -> HealthState {
    if fullness >= degraded_fullness || latency >= slow_probe_threshold {
        HealthState::Degraded
    } else {
        HealthState::Healthy
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn map_transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout(e.to_string())
    } else if e.is_decode() {
        ClientError::Decode(e.to_string())
    } else {
        ClientError::Unreachable(e.to_string())
    }
}
