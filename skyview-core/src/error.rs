//! Error kinds surfaced by the provider client and the location resolver.

use thiserror::Error;

/// Failure of a weather or location operation.
///
/// Only [`WeatherError::InvalidCredential`] is fatal; the other kinds can be
/// retried, either with different input or after a while.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// The provider rejected the API key (HTTP 401) or no usable key is configured.
    #[error("invalid or missing OpenWeatherMap API key")]
    InvalidCredential,

    /// The provider does not know the requested place name (HTTP 404).
    #[error("location not found")]
    LocationNotFound,

    /// Any other non-success status, transport failure or unreadable body.
    #[error("weather provider unavailable")]
    ProviderUnavailable,

    /// Device, reverse-geocoding and IP strategies all failed to produce coordinates.
    #[error("current location unavailable")]
    LocationUnavailable,
}

impl WeatherError {
    /// Message suitable for a transient notification.
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::InvalidCredential => {
                "Invalid OpenWeatherMap API key. Run `skyview configure` to set a valid key."
            }
            WeatherError::LocationNotFound => "City not found. Try another name.",
            WeatherError::ProviderUnavailable => "Something went wrong. Please try again.",
            WeatherError::LocationUnavailable => "Unable to determine your location.",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, WeatherError::InvalidCredential)
    }
}
