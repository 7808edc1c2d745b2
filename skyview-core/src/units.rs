use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Meters per second to kilometers per hour.
const MS_TO_KMH: f64 = 3.6;

/// Temperature unit system the user has selected.
///
/// The provider returns temperatures already converted for the requested
/// system, so this only decides the query vocabulary and the labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Celsius,
    Fahrenheit,
}

impl UnitSystem {
    /// Value of the provider's `units` query parameter.
    pub fn provider_units(&self) -> &'static str {
        match self {
            UnitSystem::Celsius => "metric",
            UnitSystem::Fahrenheit => "imperial",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            UnitSystem::Celsius => "°C",
            UnitSystem::Fahrenheit => "°F",
        }
    }

    pub fn wind_label(&self) -> &'static str {
        match self {
            UnitSystem::Celsius => "km/h",
            UnitSystem::Fahrenheit => "mph",
        }
    }

    /// Short code used in persisted preferences (`c` / `f`).
    pub fn code(&self) -> &'static str {
        match self {
            UnitSystem::Celsius => "c",
            UnitSystem::Fahrenheit => "f",
        }
    }

    /// Wind speed for display, rounded.
    ///
    /// Metric responses carry m/s and are shown in km/h; imperial responses
    /// already carry mph.
    pub fn display_wind_speed(&self, provider_speed: f64) -> i64 {
        match self {
            UnitSystem::Celsius => round_half_up(provider_speed * MS_TO_KMH),
            UnitSystem::Fahrenheit => round_half_up(provider_speed),
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "c" | "celsius" | "metric" => Ok(UnitSystem::Celsius),
            "f" | "fahrenheit" | "imperial" => Ok(UnitSystem::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown unit '{value}'. Supported units: c, f."
            )),
        }
    }
}

/// Rounds halves toward positive infinity, so `-2.5` becomes `-2`.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_vocabulary() {
        assert_eq!(UnitSystem::Celsius.provider_units(), "metric");
        assert_eq!(UnitSystem::Fahrenheit.provider_units(), "imperial");
    }

    #[test]
    fn metric_wind_is_converted_to_kmh() {
        assert_eq!(UnitSystem::Celsius.display_wind_speed(3.0), 11);
        assert_eq!(UnitSystem::Celsius.display_wind_speed(0.0), 0);
    }

    #[test]
    fn imperial_wind_is_only_rounded() {
        assert_eq!(UnitSystem::Fahrenheit.display_wind_speed(6.71), 7);
        assert_eq!(UnitSystem::Fahrenheit.display_wind_speed(6.49), 6);
    }

    #[test]
    fn rounding_goes_up_on_half() {
        assert_eq!(round_half_up(15.4), 15);
        assert_eq!(round_half_up(15.5), 16);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(-2.6), -3);
    }

    #[test]
    fn parse_codes_and_names() {
        assert_eq!(UnitSystem::try_from("c").unwrap(), UnitSystem::Celsius);
        assert_eq!(UnitSystem::try_from("F").unwrap(), UnitSystem::Fahrenheit);
        assert_eq!(UnitSystem::try_from("imperial").unwrap(), UnitSystem::Fahrenheit);

        let err = UnitSystem::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit"));
    }

    #[test]
    fn code_roundtrip() {
        for unit in [UnitSystem::Celsius, UnitSystem::Fahrenheit] {
            assert_eq!(UnitSystem::try_from(unit.code()).unwrap(), unit);
        }
    }
}
