//! Attendance recording backends.
//!
//! An [`AttendanceRecorder`] accepts completed records. The session treats any
//! recorder failure as opaque: it only needs to know that the attempt failed
//! and why, so it can offer a retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::config::SimulationConfig;
use crate::record::{Ack, AttendanceRecord};

/// A recorder-side failure (connectivity, rejection, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("recording failed: {message}")]
pub struct RecordingError {
    message: String,
}

impl RecordingError {
    /// Create a new recording error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The recorder's description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A destination for completed attendance records.
#[async_trait::async_trait]
pub trait AttendanceRecorder: Send + Sync {
    /// Record one attendance event.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordingError`] if the record was not accepted.
    async fn record(&self, record: &AttendanceRecord) -> Result<Ack, RecordingError>;
}

/// A recorder that accepts everything after a fixed latency.
///
/// Records are logged, not stored.
#[derive(Debug)]
pub struct SimulatedRecorder {
    latency: Duration,
    accepted: AtomicU64,
}

impl SimulatedRecorder {
    /// Create a recorder that answers after `latency`.
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            accepted: AtomicU64::new(0),
        }
    }

    /// Number of records accepted so far.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl From<&SimulationConfig> for SimulatedRecorder {
    fn from(config: &SimulationConfig) -> Self {
        Self::new(Duration::from_millis(config.submit_delay_ms))
    }
}

#[async_trait::async_trait]
impl AttendanceRecorder for SimulatedRecorder {
    async fn record(&self, record: &AttendanceRecord) -> Result<Ack, RecordingError> {
        tokio::time::sleep(self.latency).await;

        let sequence = self.accepted.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = format!("{}-{sequence}", record.kind());
        info!(
            kind = %record.kind(),
            timestamp = %record.timestamp().to_rfc3339(),
            has_location = record.location().is_some(),
            "Recorded attendance {reference}"
        );
        Ok(Ack::now(reference))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::record::FlowKind;

    #[test]
    fn test_recording_error_display() {
        let err = RecordingError::new("connection refused");
        assert_eq!(err.to_string(), "recording failed: connection refused");
        assert_eq!(err.message(), "connection refused");
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_recorder_acknowledges_in_sequence() {
        let recorder = SimulatedRecorder::new(Duration::from_millis(1500));
        let record = AttendanceRecord::new(FlowKind::OfficeCheckIn, Utc::now(), None, None);

        let first = recorder.record(&record).await.unwrap();
        let second = recorder.record(&record).await.unwrap();

        assert_eq!(first.reference, "office_check_in-1");
        assert_eq!(second.reference, "office_check_in-2");
        assert_eq!(recorder.accepted(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_recorder_waits_for_latency() {
        let recorder = SimulatedRecorder::new(Duration::from_millis(1500));
        let record = AttendanceRecord::new(FlowKind::MeetingCheckOut, Utc::now(), None, None);
        let started = tokio::time::Instant::now();

        recorder.record(&record).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[test]
    fn test_from_simulation_config() {
        let recorder = SimulatedRecorder::from(&SimulationConfig::default());
        assert_eq!(recorder.latency, Duration::from_millis(1500));
        assert_eq!(recorder.accepted(), 0);
    }
}
