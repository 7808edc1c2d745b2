//! Render-ready view of current conditions and the daily forecast.
//!
//! Pure mapping: everything here is computed from already-fetched data.

use serde::Serialize;

use crate::{
    model::{CurrentConditions, DayForecast, PlaceName},
    units::{UnitSystem, round_half_up},
};

/// Shown when the provider gave no condition description.
pub const MISSING_TEXT: &str = "—";

/// Icon category derived from an OpenWeatherMap condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    Clear,
    Thunderstorm,
    Rain,
    Snow,
    Haze,
    PartlyCloudy,
    Unknown,
}

impl WeatherIcon {
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_condition_code(code: Option<i32>) -> Self {
        match code {
            Some(800) => Self::Clear,
            Some(200..=299) => Self::Thunderstorm,
            // Drizzle (3xx) and rain (5xx), plus the unused 4xx block.
            Some(300..=599) => Self::Rain,
            Some(600..=699) => Self::Snow,
            Some(700..=799) => Self::Haze,
            Some(801..) => Self::PartlyCloudy,
            _ => Self::Unknown,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Thunderstorm => "thunderstorm",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Haze => "haze",
            Self::PartlyCloudy => "partly_cloudy",
            Self::Unknown => "unknown",
        }
    }

    /// Glyph for terminal output.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::Thunderstorm => "⛈️",
            Self::Rain => "🌧️",
            Self::Snow => "🌨️",
            Self::Haze => "🌫️",
            Self::PartlyCloudy => "⛅",
            Self::Unknown => "❓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub place: String,
    /// e.g. "15°C"
    pub temperature: String,
    pub condition: String,
    pub icon: WeatherIcon,
    /// e.g. "Humidity: 60%"
    pub humidity: String,
    /// e.g. "Wind: 11 km/h"
    pub wind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayView {
    pub label: String,
    pub icon: WeatherIcon,
    /// e.g. "12° / 18°"
    pub range: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherView {
    pub unit: UnitSystem,
    pub current: CurrentView,
    pub days: Vec<DayView>,
}

pub fn build_view(
    current: &CurrentConditions,
    days: &[DayForecast],
    place: &PlaceName,
    unit: UnitSystem,
) -> WeatherView {
    WeatherView {
        unit,
        current: build_current(current, place, unit),
        days: days.iter().map(build_day).collect(),
    }
}

fn build_current(current: &CurrentConditions, place: &PlaceName, unit: UnitSystem) -> CurrentView {
    CurrentView {
        place: place.to_string(),
        temperature: format!(
            "{}{}",
            round_half_up(current.temperature),
            unit.temperature_suffix()
        ),
        condition: condition_text(current.condition_text.as_deref()),
        icon: WeatherIcon::from_condition_code(current.condition_code),
        humidity: format!("Humidity: {}%", current.humidity_pct),
        wind: format!(
            "Wind: {} {}",
            unit.display_wind_speed(current.wind_speed),
            unit.wind_label()
        ),
    }
}

fn build_day(day: &DayForecast) -> DayView {
    DayView {
        label: day.label.clone(),
        icon: WeatherIcon::from_condition_code(day.representative.condition_code),
        range: format!("{}° / {}°", day.min_temp, day.max_temp),
        condition: condition_text(day.representative.condition_text.as_deref()),
    }
}

fn condition_text(text: Option<&str>) -> String {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => capitalize_first(t),
        None => MISSING_TEXT.to_string(),
    }
}

/// Uppercases the first character only: "light rain" -> "Light rain".
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForecastSample;
    use chrono::NaiveDate;

    fn london_now() -> CurrentConditions {
        CurrentConditions {
            temperature: 15.4,
            humidity_pct: 60,
            wind_speed: 3.0,
            condition_code: Some(800),
            condition_text: Some("clear sky".to_string()),
        }
    }

    #[test]
    fn icon_rule_ranges() {
        let cases = [
            (800, WeatherIcon::Clear),
            (200, WeatherIcon::Thunderstorm),
            (232, WeatherIcon::Thunderstorm),
            (299, WeatherIcon::Thunderstorm),
            (300, WeatherIcon::Rain),
            (521, WeatherIcon::Rain),
            (599, WeatherIcon::Rain),
            (600, WeatherIcon::Snow),
            (622, WeatherIcon::Snow),
            (701, WeatherIcon::Haze),
            (781, WeatherIcon::Haze),
            (801, WeatherIcon::PartlyCloudy),
            (804, WeatherIcon::PartlyCloudy),
        ];
        for (code, expected) in cases {
            assert_eq!(WeatherIcon::from_condition_code(Some(code)), expected, "code {code}");
        }
    }

    #[test]
    fn unknown_codes_map_to_unknown() {
        for code in [None, Some(0), Some(100), Some(199), Some(-1)] {
            assert_eq!(WeatherIcon::from_condition_code(code), WeatherIcon::Unknown);
        }
        assert_eq!(WeatherIcon::Unknown.token(), "unknown");
    }

    #[test]
    fn celsius_current_block() {
        let view = build_view(
            &london_now(),
            &[],
            &PlaceName::new("London, GB"),
            UnitSystem::Celsius,
        );

        assert_eq!(view.current.place, "London, GB");
        assert_eq!(view.current.temperature, "15°C");
        assert_eq!(view.current.humidity, "Humidity: 60%");
        assert_eq!(view.current.wind, "Wind: 11 km/h");
        assert_eq!(view.current.icon.token(), "clear");
        assert_eq!(view.current.condition, "Clear sky");
        assert!(view.days.is_empty());
    }

    #[test]
    fn fahrenheit_keeps_mph() {
        let mut now = london_now();
        now.temperature = 59.7;
        now.wind_speed = 6.7;
        let view = build_view(&now, &[], &PlaceName::new("London, GB"), UnitSystem::Fahrenheit);

        assert_eq!(view.current.temperature, "60°F");
        assert_eq!(view.current.wind, "Wind: 7 mph");
    }

    #[test]
    fn missing_condition_uses_placeholders() {
        let mut now = london_now();
        now.condition_code = None;
        now.condition_text = None;
        let view = build_view(&now, &[], &PlaceName::placeholder(), UnitSystem::Celsius);

        assert_eq!(view.current.icon, WeatherIcon::Unknown);
        assert_eq!(view.current.condition, MISSING_TEXT);
    }

    #[test]
    fn day_view_formats_range() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let day = DayForecast {
            date,
            min_temp: -3,
            max_temp: 4,
            representative: ForecastSample {
                timestamp: date.and_hms_opt(12, 0, 0).unwrap(),
                temperature: 4.0,
                condition_code: Some(601),
                condition_text: Some("snow".to_string()),
            },
            label: "Wed".to_string(),
        };
        let view = build_view(&london_now(), &[day], &PlaceName::placeholder(), UnitSystem::Celsius);

        assert_eq!(view.days.len(), 1);
        assert_eq!(view.days[0].label, "Wed");
        assert_eq!(view.days[0].range, "-3° / 4°");
        assert_eq!(view.days[0].icon, WeatherIcon::Snow);
        assert_eq!(view.days[0].condition, "Snow");
    }

    #[test]
    fn capitalize_handles_unicode_and_empty() {
        assert_eq!(capitalize_first("überall regen"), "Überall regen");
        assert_eq!(capitalize_first(""), "");
    }
}
