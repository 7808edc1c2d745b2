use async_trait::async_trait;
use chrono::Utc;

use super::{DeviceError, DeviceLocator, DevicePosition, PositionOptions};
use crate::model::Coordinates;

/// A device with no positioning hardware or API.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedDevice;

#[async_trait]
impl DeviceLocator for UnsupportedDevice {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<DevicePosition, DeviceError> {
        Err(DeviceError::Unsupported)
    }
}

/// Reports a known position as a fresh fix, e.g. coordinates given on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition {
    coordinates: Coordinates,
}

impl FixedPosition {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl DeviceLocator for FixedPosition {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<DevicePosition, DeviceError> {
        let Coordinates { latitude, longitude } = self.coordinates;
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(DeviceError::Unavailable(format!(
                "coordinates out of range: {latitude}, {longitude}"
            )));
        }

        Ok(DevicePosition {
            coordinates: self.coordinates,
            captured_at: Utc::now(),
        })
    }
}
