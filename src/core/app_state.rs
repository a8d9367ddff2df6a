//! Application State Management
//!
//! The central AppState is built once at startup and shared by every handler.

use std::sync::Arc;

use crate::client::{HttpIndexClient, InMemoryIndexClient, VectorIndexClient};
use crate::core::config::{ClientProvider, Config};
use crate::core::{Error, Result};
use crate::health::{HealthMonitor, HealthService, ServiceInfo};
use crate::system::metrics::EndpointMetrics;

/// Central application state holding all services
pub struct AppState {
    /// Health checks and metrics export for the vector index
    pub health: HealthService,

    /// Per-endpoint request metrics, when enabled
    pub endpoint_metrics: Option<EndpointMetrics>,

    /// Application configuration
    pub config: Config,
}

impl AppState {
    /// Assemble the state around an already constructed client.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config, client: Arc<dyn VectorIndexClient>) -> Result<Self> {
        let monitor = Arc::new(HealthMonitor::new());
        let health = HealthService::new(
            client,
            monitor,
            config.health.call_timeout,
            config.health.recorder_capacity,
            ServiceInfo {
                version: crate::VERSION.to_string(),
                environment: config.environment.clone(),
            },
        );

        let endpoint_metrics = if config.metrics.endpoint_metrics {
            Some(EndpointMetrics::new()?)
        } else {
            None
        };

        Ok(Self {
            health,
            endpoint_metrics,
            config,
        })
    }

    /// Shared handle for axum
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Build the client selected by the configuration
pub fn create_client(config: &Config) -> Result<Arc<dyn VectorIndexClient>> {
    let descriptor = config.client.descriptor();
    match config.client.provider {
        ClientProvider::Memory => Ok(Arc::new(InMemoryIndexClient::with_sample_data(descriptor))),
        ClientProvider::Pinecone => {
            let client = HttpIndexClient::new(&config.client).map_err(Error::from)?;
            Ok(Arc::new(client))
        }
    }
}
