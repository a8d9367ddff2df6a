//! Health checks for the vector index
//!
//! - [`monitor`] - check history and uptime, the only mutable shared state
//! - [`recorder`] - deferred recording used by the basic check
//! - [`status`] - health state to HTTP status mapping
//! - [`service`] - basic, detailed, stats and metrics operations
//! - [`responses`] - response bodies

pub mod monitor;
pub mod recorder;
pub mod responses;
pub mod service;
pub mod status;

pub use monitor::{HealthMonitor, MonitorSnapshot};
pub use recorder::CheckRecorder;
pub use service::{HealthService, ServiceInfo};
pub use status::map_health_state;
