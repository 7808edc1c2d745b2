use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Human-readable location label, e.g. "London, GB". Best effort only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceName(String);

impl PlaceName {
    pub const PLACEHOLDER: &'static str = "Current Location";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Used when a position is known but could not be named.
    pub fn placeholder() -> Self {
        Self(Self::PLACEHOLDER.to_string())
    }

    /// Joins a primary label with an optional country, skipping empty parts.
    pub fn from_parts(primary: Option<&str>, country: Option<&str>) -> Self {
        let primary = primary
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(Self::PLACEHOLDER);

        match country.map(str::trim).filter(|c| !c.is_empty()) {
            Some(country) => Self(format!("{primary}, {country}")),
            None => Self(primary.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current observation, already in the unit system it was requested with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub humidity_pct: u8,
    /// m/s for metric requests, mph for imperial ones.
    pub wind_speed: f64,
    /// `None` when the provider omitted `weather[0]`.
    pub condition_code: Option<i32>,
    pub condition_text: Option<String>,
}

/// Result of a current-conditions lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentReport {
    pub conditions: CurrentConditions,
    pub place: PlaceName,
}

/// One raw 3-hour forecast point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub condition_code: Option<i32>,
    pub condition_text: Option<String>,
}

impl ForecastSample {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Hours between this sample and midday.
    pub fn distance_from_noon(&self) -> u32 {
        self.timestamp.hour().abs_diff(12)
    }
}

/// Summary of one calendar day of forecast samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub min_temp: i64,
    pub max_temp: i64,
    pub representative: ForecastSample,
    /// Short weekday, e.g. "Mon".
    pub label: String,
}
