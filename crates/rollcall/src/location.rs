//! Location acquisition.
//!
//! A [`LocationProvider`] produces a single device fix on request. Location is
//! best-effort for attendance: a failed fix degrades the record rather than
//! blocking it, so providers report failures as plain [`LocationError`] values.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::config::SimulationConfig;
use crate::record::Coordinates;

/// Reasons a location fix could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user refused location access.
    #[error("location permission denied")]
    PermissionDenied,

    /// The device could not determine its position.
    #[error("location unavailable")]
    Unavailable,

    /// No fix arrived within the allowed time.
    #[error("location request timed out")]
    Timeout,
}

/// A source of device location fixes.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    /// Request one fix, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a [`LocationError`] if no fix could be produced.
    async fn request_fix(&self, timeout: Duration) -> Result<Coordinates, LocationError>;
}

/// A provider that answers with fixed coordinates after an artificial delay.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedLocationProvider {
    coordinates: Coordinates,
    delay: Duration,
    permission_granted: bool,
}

impl SimulatedLocationProvider {
    /// Create a provider that always resolves to `coordinates` after `delay`.
    #[must_use]
    pub fn new(coordinates: Coordinates, delay: Duration) -> Self {
        Self {
            coordinates,
            delay,
            permission_granted: true,
        }
    }

    /// Simulate the user refusing location access.
    #[must_use]
    pub fn with_permission(mut self, granted: bool) -> Self {
        self.permission_granted = granted;
        self
    }
}

impl From<&SimulationConfig> for SimulatedLocationProvider {
    fn from(config: &SimulationConfig) -> Self {
        Self::new(
            Coordinates::new(config.latitude, config.longitude),
            Duration::from_millis(config.location_delay_ms),
        )
        .with_permission(config.location_permission)
    }
}

#[async_trait::async_trait]
impl LocationProvider for SimulatedLocationProvider {
    async fn request_fix(&self, timeout: Duration) -> Result<Coordinates, LocationError> {
        if !self.permission_granted {
            debug!("Simulated location permission denied");
            return Err(LocationError::PermissionDenied);
        }

        if self.delay > timeout {
            tokio::time::sleep(timeout).await;
            return Err(LocationError::Timeout);
        }

        tokio::time::sleep(self.delay).await;
        debug!("Simulated location fix: {}", self.coordinates);
        Ok(self.coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office() -> Coordinates {
        Coordinates::new(37.7749, -122.4194)
    }

    #[test]
    fn test_location_error_display() {
        assert_eq!(
            LocationError::PermissionDenied.to_string(),
            "location permission denied"
        );
        assert_eq!(LocationError::Unavailable.to_string(), "location unavailable");
        assert!(LocationError::Timeout.to_string().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_fix_after_delay() {
        let provider = SimulatedLocationProvider::new(office(), Duration::from_millis(1000));
        let started = tokio::time::Instant::now();

        let fix = provider.request_fix(Duration::from_secs(10)).await;

        assert_eq!(fix, Ok(office()));
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_denied() {
        let provider = SimulatedLocationProvider::new(office(), Duration::ZERO).with_permission(false);
        let fix = provider.request_fix(Duration::from_secs(1)).await;
        assert_eq!(fix, Err(LocationError::PermissionDenied));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_times_out_when_slower_than_budget() {
        let provider = SimulatedLocationProvider::new(office(), Duration::from_secs(5));
        let fix = provider.request_fix(Duration::from_secs(1)).await;
        assert_eq!(fix, Err(LocationError::Timeout));
    }

    #[test]
    fn test_from_simulation_config() {
        let config = SimulationConfig {
            location_permission: false,
            ..SimulationConfig::default()
        };
        let provider = SimulatedLocationProvider::from(&config);

        assert_eq!(provider.coordinates, office());
        assert_eq!(provider.delay, Duration::from_millis(1000));
        assert!(!provider.permission_granted);
    }
}
