//! Vector Health - health checks and metrics for the ticket-routing vector index
//!
//! The support-ticket router relies on a vector index for its similarity
//! search stage. This crate watches that index: a fast liveness probe, a
//! forced diagnostic check, raw statistics and a Prometheus scrape target,
//! all backed by one shared health monitor.

// Core foundational modules
pub mod core;

// Main functional modules
pub mod api;
pub mod client;
pub mod health;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{AppState, Config, Error, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing from the logging configuration
pub fn init(config: &Config) -> Result<()> {
    system::logging::init_tracing(&config.logging)?;
    tracing::info!("Initializing {} v{}", NAME, VERSION);
    Ok(())
}
