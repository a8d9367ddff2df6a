//! Deferred check recording
//!
//! The basic health check must not wait on monitor bookkeeping. Results are
//! pushed onto a bounded queue and applied by a single background task; when
//! the queue is full or the task is gone the record is dropped and logged.

use flume::TrySendError;
use std::sync::Arc;

use super::monitor::HealthMonitor;
use crate::client::HealthState;

/// Submission handle for the background recorder task
#[derive(Debug, Clone)]
pub struct CheckRecorder {
    tx: flume::Sender<HealthState>,
}

impl CheckRecorder {
    /// Start the recorder task on the current tokio runtime.
    ///
    /// The task exits once every handle has been dropped and the queue drained.
    pub fn spawn(monitor: Arc<HealthMonitor>, capacity: usize) -> Self {
        let (tx, rx) = flume::bounded::<HealthState>(capacity.max(1));

        tokio::spawn(async move {
            while let Ok(state) = rx.recv_async().await {
                monitor.record_check(state);
            }
            tracing::debug!("Check recorder stopped");
        });

        Self { tx }
    }

    /// Queue a check result without waiting. Returns `false` when it was dropped.
    pub fn submit(&self, state: HealthState) -> bool {
        match self.tx.try_send(state) {
            Ok(()) => true,
            Err(TrySendError::Full(state)) => {
                tracing::warn!(status = %state, "Check recorder queue full, dropping record");
                false
            }
            Err(TrySendError::Disconnected(state)) => {
                tracing::warn!(status = %state, "Check recorder stopped, dropping record");
                false
            }
        }
    }

    /// Records waiting to be applied
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}
