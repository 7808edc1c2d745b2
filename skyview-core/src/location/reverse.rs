//! Reverse geocoding via BigDataCloud's client endpoint (no API key required).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::ReverseGeocoder;
use crate::model::{Coordinates, PlaceName};

pub const DEFAULT_REVERSE_GEOCODE_URL: &str =
    "https://api.bigdatacloud.net/data/reverse-geocode-client";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BigDataCloudResponse {
    city: Option<String>,
    locality: Option<String>,
    principal_subdivision: Option<String>,
    country_name: Option<String>,
}

impl BigDataCloudResponse {
    /// Prefer city > locality > principal subdivision, then add the country.
    fn into_place(self) -> PlaceName {
        let primary = [self.city, self.locality, self.principal_subdivision]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty());

        PlaceName::from_parts(primary.as_deref(), self.country_name.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct BigDataCloudGeocoder {
    url: String,
    language: String,
    http: Client,
}

impl BigDataCloudGeocoder {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_REVERSE_GEOCODE_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            language: "en".to_string(),
            http: Client::new(),
        }
    }
}

impl Default for BigDataCloudGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReverseGeocoder for BigDataCloudGeocoder {
    async fn place_name(&self, coords: Coordinates) -> Option<PlaceName> {
        let response = match self
            .http
            .get(&self.url)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("localityLanguage", self.language.clone()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return None;
        }

        let body: BigDataCloudResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return None;
            }
        };

        let place = body.into_place();
        tracing::info!("Reverse geocoded to: {}", place);
        Some(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> PlaceName {
        serde_json::from_str::<BigDataCloudResponse>(json)
            .unwrap()
            .into_place()
    }

    #[test]
    fn city_and_country() {
        let place = parse(r#"{"city": "Seattle", "locality": "Belltown", "countryName": "United States"}"#);
        assert_eq!(place.as_str(), "Seattle, United States");
    }

    #[test]
    fn empty_city_falls_through_to_locality() {
        let place = parse(r#"{"city": "", "locality": "Hallstatt", "principalSubdivision": "Upper Austria"}"#);
        assert_eq!(place.as_str(), "Hallstatt");
    }

    #[test]
    fn only_subdivision() {
        let place = parse(r#"{"principalSubdivision": "Svalbard", "countryName": "Norway"}"#);
        assert_eq!(place.as_str(), "Svalbard, Norway");
    }

    #[test]
    fn nothing_named_uses_placeholder() {
        let place = parse(r#"{"countryName": ""}"#);
        assert_eq!(place, PlaceName::placeholder());
    }
}
