//! Health state to HTTP status mapping shared by every health endpoint

use axum::http::StatusCode;

use crate::client::HealthState;

/// Status text for healthy responses
pub const STATUS_HEALTHY: &str = "healthy";
/// Status text for degraded responses
pub const STATUS_DEGRADED: &str = "degraded";
/// Status text for unhealthy responses
pub const STATUS_UNHEALTHY: &str = "unhealthy";

/// Map a health state to its HTTP status and status text.
///
/// Degraded stays 200: the index still serves traffic and callers must look
/// at the body to tell it apart from healthy.
pub fn map_health_state(state: HealthState) -> (StatusCode, &'static str) {
    match state {
        HealthState::Healthy => (StatusCode::OK, STATUS_HEALTHY),
        HealthState::Degraded => (StatusCode::OK, STATUS_DEGRADED),
        HealthState::Unhealthy | HealthState::Unknown => {
            (StatusCode::SERVICE_UNAVAILABLE, STATUS_UNHEALTHY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_total() {
        let cases = [
            (HealthState::Healthy, StatusCode::OK, "healthy"),
            (HealthState::Degraded, StatusCode::OK, "degraded"),
            (HealthState::Unhealthy, StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
            (HealthState::Unknown, StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        ];

        for (state, code, text) in cases {
            assert_eq!(map_health_state(state), (code, text), "state {:?}", state);
        }
    }
}
