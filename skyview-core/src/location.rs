//! Resolves "where am I" into coordinates plus a display name.
//!
//! Three unreliable signals are tried in order: the device position
//! (bounded wait), reverse-geocoding of that position, and IP-based
//! geolocation when the device gives nothing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fmt::Debug, time::Duration};

use crate::{
    WeatherError,
    model::{Coordinates, PlaceName},
};

pub mod device;
pub mod ip;
pub mod reverse;

pub use device::{FixedPosition, UnsupportedDevice};
pub use ip::IpInfoLocator;
pub use reverse::BigDataCloudGeocoder;

/// How long to wait for the device, and how old a cached fix may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub timeout: Duration,
    pub maximum_age: Duration,
    pub high_accuracy: bool,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
            high_accuracy: false,
        }
    }
}

/// A position fix reported by the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePosition {
    pub coordinates: Coordinates,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("geolocation not supported")]
    Unsupported,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location request timed out")]
    Timeout,
    #[error("cached position is too old")]
    Stale,
    #[error("location error: {0}")]
    Unavailable(String),
}

/// Source of the device's own position.
#[async_trait]
pub trait DeviceLocator: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<DevicePosition, DeviceError>;
}

/// Coordinates to place name. `None` means "could not name it".
#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    async fn place_name(&self, coords: Coordinates) -> Option<PlaceName>;
}

/// Position derived from the caller's public IP address.
#[async_trait]
pub trait IpLocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<ResolvedLocation, WeatherError>;
}

/// Which strategy produced the coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Device,
    Ip,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    pub place: PlaceName,
    pub source: LocationSource,
}

/// Observable progress of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolverState {
    Idle,
    RequestingDevice,
    ReverseGeocoding,
    /// Entered with the reason the device step failed.
    IpFallback(DeviceError),
    Resolved(ResolvedLocation),
    Failed(WeatherError),
}

impl ResolverState {
    /// Short progress line for the user, where one makes sense.
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            ResolverState::RequestingDevice => Some("Getting location…"),
            ResolverState::IpFallback(DeviceError::Unsupported) => {
                Some("Geolocation not supported. Using IP location…")
            }
            ResolverState::IpFallback(DeviceError::PermissionDenied) => {
                Some("Permission denied. Using IP location…")
            }
            ResolverState::IpFallback(_) => Some("Location unavailable. Using IP location…"),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct LocationResolver {
    device: Box<dyn DeviceLocator>,
    geocoder: Box<dyn ReverseGeocoder>,
    ip: Box<dyn IpLocator>,
    options: PositionOptions,
}

impl LocationResolver {
    pub fn new(
        device: Box<dyn DeviceLocator>,
        geocoder: Box<dyn ReverseGeocoder>,
        ip: Box<dyn IpLocator>,
    ) -> Self {
        Self {
            device,
            geocoder,
            ip,
            options: PositionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// Runs the full chain, reporting each state transition to `on_state`.
    ///
    /// Reverse-geocoding failure is never fatal: the placeholder name is used
    /// instead. Only an exhausted IP fallback ends in `LocationUnavailable`.
    pub async fn resolve(
        &self,
        on_state: &mut (dyn FnMut(&ResolverState) + Send),
    ) -> Result<ResolvedLocation, WeatherError> {
        on_state(&ResolverState::Idle);
        on_state(&ResolverState::RequestingDevice);

        let outcome = match self.request_device().await {
            Ok(coordinates) => {
                on_state(&ResolverState::ReverseGeocoding);
                Ok(self.name_device_position(coordinates).await)
            }
            Err(reason) => {
                tracing::info!("Device location failed ({reason}); falling back to IP lookup");
                on_state(&ResolverState::IpFallback(reason));
                self.ip.locate().await.map_err(|e| {
                    tracing::warn!("IP geolocation failed: {e}");
                    WeatherError::LocationUnavailable
                })
            }
        };

        match &outcome {
            Ok(location) => {
                tracing::info!(
                    source = ?location.source,
                    "Resolved location {} ({})",
                    location.place,
                    location.coordinates
                );
                on_state(&ResolverState::Resolved(location.clone()));
            }
            Err(e) => on_state(&ResolverState::Failed(*e)),
        }

        outcome
    }

    async fn request_device(&self) -> Result<Coordinates, DeviceError> {
        let position = tokio::time::timeout(
            self.options.timeout,
            self.device.current_position(&self.options),
        )
        .await
        .map_err(|_| DeviceError::Timeout)??;

        // A fix stamped in the future counts as fresh.
        let age = Utc::now()
            .signed_duration_since(position.captured_at)
            .to_std()
            .unwrap_or_default();
        if age > self.options.maximum_age {
            tracing::debug!("Device position is {}s old; rejecting", age.as_secs());
            return Err(DeviceError::Stale);
        }

        Ok(position.coordinates)
    }

    async fn name_device_position(&self, coordinates: Coordinates) -> ResolvedLocation {
        let place = match self.geocoder.place_name(coordinates).await {
            Some(place) => place,
            None => {
                tracing::warn!("Reverse geocoding failed for {coordinates}; using placeholder name");
                PlaceName::placeholder()
            }
        };

        ResolvedLocation {
            coordinates,
            place,
            source: LocationSource::Device,
        }
    }
}
