//! Vector index client abstraction
//!
//! The health service never owns the vector index; it talks to it through the
//! [`VectorIndexClient`] trait. Two implementations ship with the crate:
//! - [`memory::InMemoryIndexClient`] - scriptable in-process index for demos and tests
//! - [`http::HttpIndexClient`] - REST client for a hosted (Pinecone-style) index

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub mod http;
pub mod memory;

pub use http::HttpIndexClient;
pub use memory::InMemoryIndexClient;

/// Health of the vector index as observed by a client probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Index is reachable and serving normally
    Healthy,
    /// Index is reachable but slow or close to capacity
    Degraded,
    /// Index is not usable
    Unhealthy,
    /// No reading is available
    Unknown,
}

impl HealthState {
    /// Severity rank; `Unknown` ranks worst
    pub fn severity(self) -> u8 {
        match self {
            Self::Healthy => 0,
            Self::Degraded => 1,
            Self::Unhealthy => 2,
            Self::Unknown => 3,
        }
    }

    /// Whether this state should be signalled externally as a failure
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Unhealthy | Self::Unknown)
    }

    /// Lowercase name of the state
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
            Self::Unknown => "unknown",
        }
    }
}

impl PartialOrd for HealthState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HealthState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-namespace counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceStats {
    /// Number of vectors stored in the namespace
    pub vector_count: u64,
}

/// Point-in-time statistics of the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Total vectors across all namespaces
    pub total_vector_count: u64,
    /// Vector dimensionality
    pub dimension: u32,
    /// Ratio of used to total capacity (0.0 to 1.0)
    pub index_fullness: f64,
    /// Namespace name to its counts
    pub namespaces: BTreeMap<String, NamespaceStats>,
    /// When the snapshot was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Read-only identity and configuration of the index a client is bound to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDescriptor {
    /// Provider name, e.g. "pinecone"
    pub provider: String,
    /// Index name
    pub index_name: String,
    /// Provider environment
    pub environment: String,
    /// Distance metric
    pub metric: String,
    /// Cloud provider hosting the index
    pub cloud: String,
    /// Cloud region
    pub region: String,
    /// Configured vector dimension
    pub dimension: u32,
}

/// Errors raised by vector index clients
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The index could not be reached
    #[error("Index unreachable: {0}")]
    Unreachable(String),

    /// A call exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The index API answered with an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status returned by the API
        status: u16,
        /// Error body or reason
        message: String,
    },

    /// A response could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The client was used before `initialize` succeeded
    #[error("Client not initialized")]
    NotInitialized,

    /// The index does not exist and creation was not allowed
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// The client could not be set up locally
    #[error("Client setup error: {0}")]
    Setup(String),
}

/// Handle to the external vector index
///
/// Implementations own their caching; `health_check(false)` may answer from a
/// cache while `health_check(true)` must take a fresh reading.
#[async_trait]
pub trait VectorIndexClient: Send + Sync {
    /// Connect to the index, creating it when missing if allowed
    async fn initialize(&self, create_if_missing: bool) -> Result<(), ClientError>;

    /// Probe index health
    async fn health_check(&self, force_refresh: bool) -> Result<HealthState, ClientError>;

    /// Fetch current index statistics
    async fn get_stats(&self) -> Result<StatsSnapshot, ClientError>;

    /// Configuration of the bound index
    fn descriptor(&self) -> &IndexDescriptor;
}
