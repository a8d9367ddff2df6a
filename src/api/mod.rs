//! # API Module
//!
//! HTTP interface of the vector index health service.
//!
//! ## Endpoints Overview
//!
//! - `GET /` - Service info and endpoint list
//! - `GET /vector-db/health` - Basic liveness check (200 healthy/degraded, 503 unhealthy)
//! - `GET /vector-db/health/detailed` - Forced check with index statistics and performance
//! - `GET /vector-db/stats` - Raw index statistics
//! - `GET /vector-db/metrics` - Prometheus text exposition, always 200

pub mod handlers;
pub mod routes;
pub mod server;

// Re-export commonly used items
pub use handlers::SharedState;
pub use server::{create_app, start_server};
