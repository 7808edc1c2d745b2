use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::{
    WeatherError,
    model::{Coordinates, CurrentConditions, CurrentReport, ForecastSample, PlaceName},
    units::UnitSystem,
};

use super::{QueryKind, WeatherProvider, classify_status, is_plausible_api_key};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const DT_TXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

// Redacts the API key.
impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Location part of a request, serialized into query parameters.
enum Target<'a> {
    Name(&'a str),
    Coords(Coordinates),
}

impl Target<'_> {
    fn kind(&self) -> QueryKind {
        match self {
            Target::Name(_) => QueryKind::ByName,
            Target::Coords(_) => QueryKind::ByCoords,
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Target::Name(city) => vec![("q", (*city).to_string())],
            Target::Coords(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
        }
    }
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        target: &Target<'_>,
        unit: UnitSystem,
    ) -> Result<T, WeatherError> {
        if !is_plausible_api_key(&self.api_key) {
            tracing::warn!("OpenWeatherMap API key is missing or malformed; skipping request");
            return Err(WeatherError::InvalidCredential);
        }

        let url = format!("{}{}", self.base_url, path);
        let mut query = target.params();
        query.push(("appid", self.api_key.trim().to_string()));
        query.push(("units", unit.provider_units().to_string()));

        tracing::debug!(path, units = unit.provider_units(), "requesting OpenWeatherMap");

        let res = self.http.get(&url).query(&query).send().await.map_err(|e| {
            tracing::warn!("Failed to send request to OpenWeatherMap ({path}): {e}");
            WeatherError::ProviderUnavailable
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            tracing::warn!("Failed to read OpenWeatherMap response body ({path}): {e}");
            WeatherError::ProviderUnavailable
        })?;

        if !status.is_success() {
            let err = classify_status(status, target.kind());
            tracing::debug!(
                "OpenWeatherMap request {} failed with status {}: {}",
                path,
                status,
                truncate_body(&body),
            );
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("Failed to parse OpenWeatherMap JSON ({path}): {e}");
            WeatherError::ProviderUnavailable
        })
    }

    async fn fetch_current(
        &self,
        target: Target<'_>,
        unit: UnitSystem,
    ) -> Result<CurrentReport, WeatherError> {
        let parsed: OwCurrentResponse = self.get_json(CURRENT_PATH, &target, unit).await?;
        Ok(parsed.into_report())
    }

    async fn fetch_forecast(
        &self,
        target: Target<'_>,
        unit: UnitSystem,
    ) -> Result<Vec<ForecastSample>, WeatherError> {
        let parsed: OwForecastResponse = self.get_json(FORECAST_PATH, &target, unit).await?;
        Ok(parsed.into_samples())
    }
}

// Every field is optional: a successful response missing parts of the
// documented shape, or carrying `null` in their place, still renders with
// "unknown" placeholders.

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    #[serde(deserialize_with = "null_as_default")]
    temp: f64,
    #[serde(deserialize_with = "null_as_default")]
    humidity: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    id: Option<i32>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    #[serde(deserialize_with = "null_as_default")]
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    sys: OwSys,
    #[serde(deserialize_with = "null_as_default")]
    main: OwMain,
    #[serde(deserialize_with = "null_as_default")]
    weather: Vec<Option<OwWeather>>,
    #[serde(deserialize_with = "null_as_default")]
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_report(self) -> CurrentReport {
        let place = PlaceName::from_parts(self.name.as_deref(), self.sys.country.as_deref());
        let first = self.weather.into_iter().next().flatten();

        CurrentReport {
            conditions: CurrentConditions {
                temperature: self.main.temp,
                humidity_pct: self.main.humidity,
                wind_speed: self.wind.speed,
                condition_code: first.as_ref().and_then(|w| w.id),
                condition_text: first.and_then(|w| w.description),
            },
            place,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwForecastEntry {
    dt_txt: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    main: OwMain,
    #[serde(deserialize_with = "null_as_default")]
    weather: Vec<Option<OwWeather>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwForecastResponse {
    #[serde(deserialize_with = "null_as_default")]
    list: Vec<OwForecastEntry>,
}

impl OwForecastResponse {
    fn into_samples(self) -> Vec<ForecastSample> {
        self.list
            .into_iter()
            .filter_map(|entry| {
                let raw = entry.dt_txt.as_deref()?;
                let timestamp = match NaiveDateTime::parse_from_str(raw, DT_TXT_FORMAT) {
                    Ok(ts) => ts,
                    Err(e) => {
                        tracing::warn!("Skipping forecast entry with bad dt_txt '{raw}': {e}");
                        return None;
                    }
                };
                let first = entry.weather.into_iter().next().flatten();

                Some(ForecastSample {
                    timestamp,
                    temperature: entry.main.temp,
                    condition_code: first.as_ref().and_then(|w| w.id),
                    condition_text: first.and_then(|w| w.description),
                })
            })
            .collect()
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_by_name(
        &self,
        city: &str,
        unit: UnitSystem,
    ) -> Result<CurrentReport, WeatherError> {
        self.fetch_current(Target::Name(city), unit).await
    }

    async fn current_by_coords(
        &self,
        coords: Coordinates,
        unit: UnitSystem,
    ) -> Result<CurrentReport, WeatherError> {
        self.fetch_current(Target::Coords(coords), unit).await
    }

    async fn forecast_by_name(
        &self,
        city: &str,
        unit: UnitSystem,
    ) -> Result<Vec<ForecastSample>, WeatherError> {
        self.fetch_forecast(Target::Name(city), unit).await
    }

    async fn forecast_by_coords(
        &self,
        coords: Coordinates,
        unit: UnitSystem,
    ) -> Result<Vec<ForecastSample>, WeatherError> {
        self.fetch_forecast(Target::Coords(coords), unit).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
