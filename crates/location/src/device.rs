//! Live position from the host's positioning capability.

use crate::fix::{Accuracy, GeoFix, Source};
use crate::outcome::{NoFixReason, ReaderOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use photopost_core::config::LocationConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Options passed to the positioning capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRequest {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the caller will accept
    pub maximum_age: Duration,
}

impl PositionRequest {
    pub fn from_config(config: &LocationConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            timeout: config.device_timeout,
            maximum_age: config.device_max_age,
        }
    }
}

impl Default for PositionRequest {
    fn default() -> Self {
        Self::from_config(&LocationConfig::default())
    }
}

/// A raw reading from the sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in metres
    pub accuracy_m: f64,
    pub altitude: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Ways the positioning capability can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("Positioning is not available on this host")]
    Unavailable,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Position unavailable")]
    PositionUnavailable,
    #[error("Position request timed out")]
    Timeout,
}

impl From<PositionError> for NoFixReason {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::Unavailable => NoFixReason::Unavailable,
            PositionError::PermissionDenied => NoFixReason::PermissionDenied,
            PositionError::PositionUnavailable => NoFixReason::PositionUnavailable,
            PositionError::Timeout => NoFixReason::Timeout,
        }
    }
}

/// The host seam for device positioning.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    async fn current_position(&self, request: &PositionRequest) -> Result<Position, PositionError>;
}

/// A host without positioning.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableProvider;

#[async_trait]
impl PositionProvider for UnavailableProvider {
    async fn current_position(&self, _request: &PositionRequest) -> Result<Position, PositionError> {
        Err(PositionError::Unavailable)
    }
}

/// A host where the user refused location access.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedProvider;

#[async_trait]
impl PositionProvider for DeniedProvider {
    async fn current_position(&self, _request: &PositionRequest) -> Result<Position, PositionError> {
        Err(PositionError::PermissionDenied)
    }
}

/// Always reports the same position, optionally after a delay and with a
/// given age.
#[derive(Debug, Clone)]
pub struct FixedPositionProvider {
    latitude: f64,
    longitude: f64,
    accuracy_m: f64,
    altitude: Option<f64>,
    delay: Duration,
    age: Duration,
}

impl FixedPositionProvider {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            altitude: None,
            delay: Duration::ZERO,
            age: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Answer only after `delay` has elapsed.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Report a fix that was taken `age` ago.
    #[must_use]
    pub fn with_age(mut self, age: Duration) -> Self {
        self.age = age;
        self
    }
}

#[async_trait]
impl PositionProvider for FixedPositionProvider {
    async fn current_position(&self, _request: &PositionRequest) -> Result<Position, PositionError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let age = chrono::Duration::from_std(self.age).map_err(|_| PositionError::PositionUnavailable)?;
        Ok(Position {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_m: self.accuracy_m,
            altitude: self.altitude,
            timestamp: Utc::now() - age,
        })
    }
}

/// Requests one fix and enforces the request options itself.
#[derive(Clone)]
pub struct DeviceReader {
    provider: Arc<dyn PositionProvider>,
    request: PositionRequest,
}

impl DeviceReader {
    pub fn new(provider: Arc<dyn PositionProvider>, request: PositionRequest) -> Self {
        Self { provider, request }
    }

    pub fn from_config(provider: Arc<dyn PositionProvider>, config: &LocationConfig) -> Self {
        Self::new(provider, PositionRequest::from_config(config))
    }

    pub fn request(&self) -> &PositionRequest {
        &self.request
    }

    #[instrument(skip(self), fields(timeout = ?self.request.timeout))]
    pub async fn read(&self) -> ReaderOutcome {
        let outcome = match tokio::time::timeout(self.request.timeout, self.provider.current_position(&self.request)).await {
            Err(_) => ReaderOutcome::NoFix(NoFixReason::Timeout),
            Ok(Err(e)) => ReaderOutcome::NoFix(e.into()),
            Ok(Ok(position)) => self.accept(position),
        };

        match &outcome {
            ReaderOutcome::Fix(fix) => debug!(%fix, "Device position acquired"),
            ReaderOutcome::NoFix(reason) => debug!(%reason, "No device position"),
        }
        outcome
    }

    fn accept(&self, position: Position) -> ReaderOutcome {
        let age = Utc::now().signed_duration_since(position.timestamp);
        if age.to_std().is_ok_and(|age| age > self.request.maximum_age) {
            return ReaderOutcome::NoFix(NoFixReason::Stale);
        }

        match GeoFix::new(
            position.latitude,
            position.longitude,
            Source::Device,
            Accuracy::from_radius(position.accuracy_m),
        ) {
            Ok(fix) => ReaderOutcome::Fix(fix.with_altitude(position.altitude).with_captured_at(Some(position.timestamp))),
            Err(_) => ReaderOutcome::NoFix(NoFixReason::OutOfRange),
        }
    }
}

impl std::fmt::Debug for DeviceReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceReader").field("request", &self.request).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::AccuracyClass;

    fn reader(provider: impl PositionProvider + 'static) -> DeviceReader {
        DeviceReader::new(Arc::new(provider), PositionRequest::default())
    }

    #[test]
    fn test_default_request_options() {
        let request = PositionRequest::default();
        assert!(request.high_accuracy);
        assert_eq!(request.timeout, Duration::from_secs(8));
        assert_eq!(request.maximum_age, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_fixed_position_classified() {
        let outcome = reader(FixedPositionProvider::new(51.0, 5.0, 15.0)).read().await;
        let fix = outcome.into_fix().unwrap();
        assert_eq!(fix.source(), Source::Device);
        assert_eq!(fix.accuracy().class, AccuracyClass::Medium);
        assert_eq!(fix.accuracy().radius_m, Some(15.0));
        assert!(fix.captured_at().is_some());
    }

    #[tokio::test]
    async fn test_failures_become_reasons() {
        assert_eq!(
            reader(DeniedProvider).read().await,
            ReaderOutcome::NoFix(NoFixReason::PermissionDenied)
        );
        assert_eq!(
            reader(UnavailableProvider).read().await,
            ReaderOutcome::NoFix(NoFixReason::Unavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_cut_off() {
        let slow = FixedPositionProvider::new(51.0, 5.0, 5.0).with_delay(Duration::from_secs(20));
        assert_eq!(reader(slow).read().await, ReaderOutcome::NoFix(NoFixReason::Timeout));
    }

    #[tokio::test]
    async fn test_stale_fix_discarded() {
        let stale = FixedPositionProvider::new(51.0, 5.0, 5.0).with_age(Duration::from_secs(120));
        assert_eq!(reader(stale).read().await, ReaderOutcome::NoFix(NoFixReason::Stale));

        let recent = FixedPositionProvider::new(51.0, 5.0, 5.0).with_age(Duration::from_secs(10));
        assert!(reader(recent).read().await.fix().is_some());
    }

    #[tokio::test]
    async fn test_out_of_range_position_rejected() {
        let broken = FixedPositionProvider::new(123.0, 5.0, 5.0);
        assert_eq!(reader(broken).read().await, ReaderOutcome::NoFix(NoFixReason::OutOfRange));
    }
}
