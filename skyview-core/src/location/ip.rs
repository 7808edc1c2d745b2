//! IP-based geolocation via ipinfo.io.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{IpLocator, LocationSource, ResolvedLocation};
use crate::{
    WeatherError,
    model::{Coordinates, PlaceName},
};

pub const DEFAULT_IP_GEOLOCATION_URL: &str = "https://ipinfo.io/json";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IpInfoResponse {
    /// "lat,lon"
    loc: Option<String>,
    city: Option<String>,
    country: Option<String>,
}

impl IpInfoResponse {
    fn into_location(self) -> Result<ResolvedLocation, WeatherError> {
        let loc = self.loc.as_deref().ok_or_else(|| {
            tracing::debug!("IP geolocation response has no loc field");
            WeatherError::LocationUnavailable
        })?;
        let coordinates = parse_lat_lon(loc).ok_or_else(|| {
            tracing::debug!("IP geolocation loc field is not \"lat,lon\": {loc}");
            WeatherError::LocationUnavailable
        })?;

        Ok(ResolvedLocation {
            coordinates,
            place: PlaceName::from_parts(self.city.as_deref(), self.country.as_deref()),
            source: LocationSource::Ip,
        })
    }
}

/// Parses "51.5,-0.12" into coordinates. Non-finite values are rejected.
pub fn parse_lat_lon(raw: &str) -> Option<Coordinates> {
    let (lat, lon) = raw.split_once(',')?;
    let latitude: f64 = lat.trim().parse().ok()?;
    let longitude: f64 = lon.trim().parse().ok()?;

    (latitude.is_finite() && longitude.is_finite()).then(|| Coordinates::new(latitude, longitude))
}

#[derive(Debug, Clone)]
pub struct IpInfoLocator {
    url: String,
    http: Client,
}

impl IpInfoLocator {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_IP_GEOLOCATION_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
        }
    }
}

impl Default for IpInfoLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IpLocator for IpInfoLocator {
    async fn locate(&self) -> Result<ResolvedLocation, WeatherError> {
        let response = self.http.get(&self.url).send().await.map_err(|e| {
            tracing::warn!("IP geolocation request failed: {e}");
            WeatherError::LocationUnavailable
        })?;

        if !response.status().is_success() {
            tracing::warn!("IP geolocation returned status {}", response.status());
            return Err(WeatherError::LocationUnavailable);
        }

        let body: IpInfoResponse = response.json().await.map_err(|e| {
            tracing::warn!("IP geolocation parse error: {e}");
            WeatherError::LocationUnavailable
        })?;

        body.into_location()
    }
}
