//! Integration tests for OpenWeatherProvider using wiremock.
//!
//! These tests verify query shapes and status mapping against a mock HTTP server.

use skyview_core::{
    Coordinates, UnitSystem, WeatherError, WeatherProvider,
    provider::openweather::OpenWeatherProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "0123456789abcdef";

fn london_current() -> serde_json::Value {
    serde_json::json!({
        "name": "London",
        "sys": { "country": "GB" },
        "main": { "temp": 15.4, "humidity": 60 },
        "wind": { "speed": 3.0 },
        "weather": [{ "id": 800, "description": "clear sky" }]
    })
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "list": [
            { "dt_txt": "2024-05-01 09:00:00", "main": { "temp": 11.0 }, "weather": [{ "id": 500, "description": "light rain" }] },
            { "dt_txt": "2024-05-01 12:00:00", "main": { "temp": 14.0 }, "weather": [{ "id": 801, "description": "few clouds" }] },
            { "dt_txt": "2024-05-02 00:00:00", "main": { "temp": 8.0 }, "weather": [] }
        ]
    })
}

async fn status_server(status: u16) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "cod": status, "message": "mocked"
        })))
        .mount(&mock_server)
        .await;
    mock_server
}

#[tokio::test]
async fn current_by_name_sends_city_key_and_units() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "London"))
        .and(query_param("appid", KEY))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::with_base_url(KEY, mock_server.uri());
    let report = provider
        .current_by_name("London", UnitSystem::Celsius)
        .await
        .unwrap();

    assert_eq!(report.place.as_str(), "London, GB");
    assert_eq!(report.conditions.temperature, 15.4);
    assert_eq!(report.conditions.humidity_pct, 60);
    assert_eq!(report.conditions.condition_code, Some(800));
}

#[tokio::test]
async fn coordinate_queries_send_lat_lon_and_imperial_units() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::with_base_url(KEY, mock_server.uri());
    let samples = provider
        .forecast_by_coords(Coordinates::new(51.5, -0.12), UnitSystem::Fahrenheit)
        .await
        .unwrap();

    assert_eq!(samples.len(), 3);
    assert_eq!(samples[0].condition_code, Some(500));
    assert_eq!(samples[2].condition_code, None);
}

#[tokio::test]
async fn unauthorized_maps_to_invalid_credential_for_all_four_queries() {
    let mock_server = status_server(401).await;
    let provider = OpenWeatherProvider::with_base_url(KEY, mock_server.uri());
    let here = Coordinates::new(1.0, 2.0);
    let unit = UnitSystem::Celsius;

    assert_eq!(
        provider.current_by_name("London", unit).await.unwrap_err(),
        WeatherError::InvalidCredential
    );
    assert_eq!(
        provider.current_by_coords(here, unit).await.unwrap_err(),
        WeatherError::InvalidCredential
    );
    assert_eq!(
        provider.forecast_by_name("London", unit).await.unwrap_err(),
        WeatherError::InvalidCredential
    );
    assert_eq!(
        provider.forecast_by_coords(here, unit).await.unwrap_err(),
        WeatherError::InvalidCredential
    );
}

#[tokio::test]
async fn not_found_on_name_lookup_is_location_not_found() {
    let mock_server = status_server(404).await;
    let provider = OpenWeatherProvider::with_base_url(KEY, mock_server.uri());

    let err = provider
        .current_by_name("Atlantis", UnitSystem::Celsius)
        .await
        .unwrap_err();
    assert_eq!(err, WeatherError::LocationNotFound);

    let err = provider
        .current_by_coords(Coordinates::new(0.0, 0.0), UnitSystem::Celsius)
        .await
        .unwrap_err();
    assert_eq!(err, WeatherError::ProviderUnavailable);
}

#[tokio::test]
async fn server_errors_are_provider_unavailable() {
    for status in [400, 429, 500, 503] {
        let mock_server = status_server(status).await;
        let provider = OpenWeatherProvider::with_base_url(KEY, mock_server.uri());

        let err = provider
            .forecast_by_name("London", UnitSystem::Celsius)
            .await
            .unwrap_err();
        assert_eq!(err, WeatherError::ProviderUnavailable, "status {status}");
    }
}

#[tokio::test]
async fn non_json_body_is_provider_unavailable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::with_base_url(KEY, mock_server.uri());
    let err = provider
        .current_by_name("London", UnitSystem::Celsius)
        .await
        .unwrap_err();

    assert_eq!(err, WeatherError::ProviderUnavailable);
}

#[tokio::test]
async fn unreachable_server_is_provider_unavailable() {
    // Nothing listens on port 9 of localhost in the test environment.
    let provider = OpenWeatherProvider::with_base_url(KEY, "http://127.0.0.1:9");
    let err = provider
        .current_by_name("London", UnitSystem::Celsius)
        .await
        .unwrap_err();

    assert_eq!(err, WeatherError::ProviderUnavailable);
}

#[tokio::test]
async fn malformed_key_is_rejected_without_a_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london_current()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = OpenWeatherProvider::with_base_url(
        "https://api.openweathermap.org/data/2.5/weather?appid={key}",
        mock_server.uri(),
    );
    let err = provider
        .current_by_name("London", UnitSystem::Celsius)
        .await
        .unwrap_err();

    assert_eq!(err, WeatherError::InvalidCredential);
}
