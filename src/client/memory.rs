//! In-process vector index client
//!
//! Holds a scripted health state and statistics. Failures and latency can be
//! injected at runtime, which makes it the backing client for `--demo` mode.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{ClientError, HealthState, IndexDescriptor, NamespaceStats, StatsSnapshot, VectorIndexClient};

#[derive(Debug)]
struct MemoryState {
    initialized: bool,
    health: Result<HealthState, ClientError>,
    total_vector_count: u64,
    index_fullness: f64,
    namespaces: BTreeMap<String, NamespaceStats>,
    stats_error: Option<ClientError>,
    latency: Option<Duration>,
}

/// Scriptable in-memory index
#[derive(Debug)]
pub struct InMemoryIndexClient {
    descriptor: IndexDescriptor,
    state: RwLock<MemoryState>,
    health_calls: AtomicU64,
    forced_health_calls: AtomicU64,
    stats_calls: AtomicU64,
}

impl InMemoryIndexClient {
    /// Create an empty, healthy index
    pub fn new(descriptor: IndexDescriptor) -> Self {
        Self {
            descriptor,
            state: RwLock::new(MemoryState {
                initialized: false,
                health: Ok(HealthState::Healthy),
                total_vector_count: 0,
                index_fullness: 0.0,
                namespaces: BTreeMap::new(),
                stats_error: None,
                latency: None,
            }),
            health_calls: AtomicU64::new(0),
            forced_health_calls: AtomicU64::new(0),
            stats_calls: AtomicU64::new(0),
        }
    }

    /// Create an index pre-populated with support-ticket namespaces
    pub fn with_sample_data(descriptor: IndexDescriptor) -> Self {
        let client = Self::new(descriptor);
        for (namespace, count) in [
            ("account", 1_840),
            ("billing", 2_310),
            ("general", 960),
            ("technical", 4_125),
        ] {
            client.upsert_namespace(namespace, count);
        }
        client.set_fullness(0.02);
        client
    }

    /// Set the state returned by health probes
    pub fn set_health(&self, state: HealthState) {
        self.state.write().health = Ok(state);
    }

    /// Make health probes fail with the given error
    pub fn fail_health(&self, error: ClientError) {
        self.state.write().health = Err(error);
    }

    /// Make stats fetches fail with the given error
    pub fn fail_stats(&self, error: ClientError) {
        self.state.write().stats_error = Some(error);
    }

    /// Clear any injected stats failure
    pub fn clear_stats_failure(&self) {
        self.state.write().stats_error = None;
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().latency = latency;
    }

    /// Set the index fullness ratio
    pub fn set_fullness(&self, fullness: f64) {
        self.state.write().index_fullness = fullness.clamp(0.0, 1.0);
    }

    /// Set a namespace's vector count, keeping the total in step
    pub fn upsert_namespace(&self, namespace: &str, vector_count: u64) {
        let mut state = self.state.write();
        let previous = state
            .namespaces
            .insert(namespace.to_string(), NamespaceStats { vector_count })
            .map(|ns| ns.vector_count)
            .unwrap_or(0);
        state.total_vector_count = state.total_vector_count - previous + vector_count;
    }

    /// Whether `initialize` has succeeded
    pub fn is_initialized(&self) -> bool {
        self.state.read().initialized
    }

    /// Number of health probes served
    pub fn health_calls(&self) -> u64 {
        self.health_calls.load(Ordering::Relaxed)
    }

    /// Number of health probes that requested a forced refresh
    pub fn forced_health_calls(&self) -> u64 {
        self.forced_health_calls.load(Ordering::Relaxed)
    }

    /// Number of stats fetches served
    pub fn stats_calls(&self) -> u64 {
        self.stats_calls.load(Ordering::Relaxed)
    }

    async fn simulate_latency(&self) {
        let latency = self.state.read().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl VectorIndexClient for InMemoryIndexClient {
    async fn initialize(&self, _create_if_missing: bool) -> Result<(), ClientError> {
        self.simulate_latency().await;
        self.state.write().initialized = true;
        tracing::debug!(index = %self.descriptor.index_name, "In-memory index initialized");
        Ok(())
    }

    async fn health_check(&self, force_refresh: bool) -> Result<HealthState, ClientError> {
        self.health_calls.fetch_add(1, Ordering::Relaxed);
        if force_refresh {
            self.forced_health_calls.fetch_add(1, Ordering::Relaxed);
        }
        self.simulate_latency().await;
        self.state.read().health.clone()
    }

    async fn get_stats(&self) -> Result<StatsSnapshot, ClientError> {
        self.stats_calls.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;

        let state = self.state.read();
        if let Some(error) = &state.stats_error {
            return Err(error.clone());
        }
        Ok(StatsSnapshot {
            total_vector_count: state.total_vector_count,
            dimension: self.descriptor.dimension,
            index_fullness: state.index_fullness,
            namespaces: state.namespaces.clone(),
            fetched_at: Utc::now(),
        })
    }

    fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }
}
