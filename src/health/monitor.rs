//! Health check history and uptime
//!
//! All four mutable fields live behind one lock, so a recorded check is
//! observed either completely or not at all.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::client::HealthState;

#[derive(Debug)]
struct MonitorState {
    last_check_time: Option<DateTime<Utc>>,
    cached_status: HealthState,
    total_checks: u64,
    error_count: u64,
}

/// Consistent copy of the monitor fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    /// When the monitor was created
    pub start_time: DateTime<Utc>,
    /// Most recent recorded check
    pub last_check_time: Option<DateTime<Utc>>,
    /// Status of the most recent recorded check
    pub cached_status: HealthState,
    /// Checks recorded so far
    pub total_checks: u64,
    /// Recorded checks that were unhealthy
    pub error_count: u64,
    /// Time since creation
    pub uptime: Duration,
}

impl MonitorSnapshot {
    /// `error_count / max(total_checks, 1)`, rounded to 3 decimals
    pub fn error_rate(&self) -> f64 {
        let rate = self.error_count as f64 / self.total_checks.max(1) as f64;
        (rate * 1000.0).round() / 1000.0
    }
}

/// Process-wide record of health checks
#[derive(Debug)]
pub struct HealthMonitor {
    start_time: DateTime<Utc>,
    started: Instant,
    state: Mutex<MonitorState>,
}

impl HealthMonitor {
    /// Create a monitor; its start time is now
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            started: Instant::now(),
            state: Mutex::new(MonitorState {
                last_check_time: None,
                cached_status: HealthState::Unknown,
                total_checks: 0,
                error_count: 0,
            }),
        }
    }

    /// Wall-clock creation time
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Time since creation, measured on the monotonic clock
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Record the outcome of one health check
    pub fn record_check(&self, status: HealthState) {
        let now = Utc::now();
        let mut state = self.state.lock();
        state.total_checks += 1;
        if status == HealthState::Unhealthy {
            state.error_count += 1;
        }
        state.cached_status = status;
        state.last_check_time = Some(now);
    }

    /// Read every field at once
    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.state.lock();
        MonitorSnapshot {
            start_time: self.start_time,
            last_check_time: state.last_check_time,
            cached_status: state.cached_status,
            total_checks: state.total_checks,
            error_count: state.error_count,
            uptime: self.uptime(),
        }
    }

    /// Status of the most recent recorded check
    pub fn cached_status(&self) -> HealthState {
        self.state.lock().cached_status
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn any_state() -> impl Strategy<Value = HealthState> {
        prop_oneof![
            Just(HealthState::Healthy),
            Just(HealthState::Degraded),
            Just(HealthState::Unhealthy),
            Just(HealthState::Unknown),
        ]
    }

    proptest! {
        #[test]
        fn prop_counts_follow_recorded_checks(states in proptest::collection::vec(any_state(), 0..200)) {
            let monitor = HealthMonitor::new();
            for state in &states {
                monitor.record_check(*state);
            }

            let snapshot = monitor.snapshot();
            let unhealthy = states.iter().filter(|s| **s == HealthState::Unhealthy).count() as u64;
            prop_assert_eq!(snapshot.total_checks, states.len() as u64);
            prop_assert_eq!(snapshot.error_count, unhealthy);
            prop_assert!(snapshot.error_count <= snapshot.total_checks);
            prop_assert_eq!(snapshot.cached_status, states.last().copied().unwrap_or(HealthState::Unknown));
        }
    }

    #[test]
    fn test_initial_state() {
        let monitor = HealthMonitor::new();
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.cached_status, HealthState::Unknown);
        assert_eq!(snapshot.total_checks, 0);
        assert_eq!(snapshot.error_count, 0);
        assert!(snapshot.last_check_time.is_none());
    }

    #[test]
    fn test_uptime_is_monotonic() {
        let monitor = HealthMonitor::new();
        let mut previous = monitor.uptime();
        for _ in 0..100 {
            let current = monitor.uptime();
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_error_rate() {
        let monitor = HealthMonitor::new();
        assert_eq!(monitor.snapshot().error_rate(), 0.0);

        for i in 0..10 {
            let state = if i < 3 { HealthState::Unhealthy } else { HealthState::Healthy };
            monitor.record_check(state);
        }
        assert_eq!(monitor.snapshot().error_rate(), 0.3);
    }

    #[test]
    fn test_error_rate_rounding() {
        let monitor = HealthMonitor::new();
        monitor.record_check(HealthState::Unhealthy);
        monitor.record_check(HealthState::Healthy);
        monitor.record_check(HealthState::Healthy);
        assert_eq!(monitor.snapshot().error_rate(), 0.333);
    }

    #[test]
    fn test_unknown_is_not_counted_as_error() {
        let monitor = HealthMonitor::new();
        monitor.record_check(HealthState::Unknown);
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.total_checks, 1);
        assert_eq!(snapshot.error_count, 0);
        assert!(snapshot.last_check_time.is_some());
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let monitor = Arc::new(HealthMonitor::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let monitor = monitor.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let state = if t % 2 == 0 { HealthState::Unhealthy } else { HealthState::Healthy };
                        monitor.record_check(state);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.total_checks, 4_000);
        assert_eq!(snapshot.error_count, 2_000);
    }
}
