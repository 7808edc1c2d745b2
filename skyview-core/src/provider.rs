use crate::{
    Config, WeatherError,
    model::{Coordinates, CurrentReport, ForecastSample},
    provider::openweather::OpenWeatherProvider,
    units::UnitSystem,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;

pub mod openweather;

/// Which kind of query produced a response; 404 only means "not found" for names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    ByName,
    ByCoords,
}

/// The four query shapes issued against the upstream weather API.
///
/// Implementations never retry; retry policy belongs to the caller.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_by_name(
        &self,
        city: &str,
        unit: UnitSystem,
    ) -> Result<CurrentReport, WeatherError>;

    async fn current_by_coords(
        &self,
        coords: Coordinates,
        unit: UnitSystem,
    ) -> Result<CurrentReport, WeatherError>;

    async fn forecast_by_name(
        &self,
        city: &str,
        unit: UnitSystem,
    ) -> Result<Vec<ForecastSample>, WeatherError>;

    async fn forecast_by_coords(
        &self,
        coords: Coordinates,
        unit: UnitSystem,
    ) -> Result<Vec<ForecastSample>, WeatherError>;
}

/// Maps a non-success HTTP status to the error kind callers match on.
pub fn classify_status(status: StatusCode, kind: QueryKind) -> WeatherError {
    match (status, kind) {
        (StatusCode::UNAUTHORIZED, _) => WeatherError::InvalidCredential,
        (StatusCode::NOT_FOUND, QueryKind::ByName) => WeatherError::LocationNotFound,
        _ => WeatherError::ProviderUnavailable,
    }
}

/// Rejects keys that are obviously not a bare OpenWeatherMap key, such as a pasted URL.
pub fn is_plausible_api_key(key: &str) -> bool {
    let key = key.trim();
    !(key.is_empty()
        || key.contains("openweathermap.org")
        || key.contains("appid=")
        || key.contains('{')
        || key.contains('}'))
}

/// Construct the weather provider from config.
///
/// A missing key does not fail here: fetches report `InvalidCredential`
/// without sending a request, while credential-free operations keep working.
pub fn provider_from_config(config: &Config) -> Box<dyn WeatherProvider> {
    let api_key = config.api_key().unwrap_or_else(|| {
        tracing::warn!(
            "No OpenWeatherMap API key configured; run `skyview configure` or set SKYVIEW_API_KEY"
        );
        ""
    });

    Box::new(OpenWeatherProvider::with_base_url(api_key, config.weather_base_url()))
}
