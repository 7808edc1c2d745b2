//! Core library for the `skyview` weather client.
//!
//! This crate defines:
//! - The OpenWeatherMap client (current conditions and 5-day / 3-hour forecast)
//! - Location resolution: device position, reverse geocoding, IP fallback
//! - Daily aggregation of forecast samples and the render-ready view model
//! - Configuration, persisted preferences and the application state that ties it together
//!
//! It is used by `skyview-cli`, but any front end implementing [`RenderSink`] can drive it.

pub mod aggregate;
pub mod app;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod preferences;
pub mod presentation;
pub mod provider;
pub mod units;

pub use app::{AppState, Notice, NoticeKind, Outcome, Query, RenderSink, WeatherApp};
pub use config::Config;
pub use error::WeatherError;
pub use model::{Coordinates, CurrentConditions, CurrentReport, DayForecast, ForecastSample, PlaceName};
pub use preferences::{Preferences, PreferenceStore, Theme};
pub use presentation::{WeatherIcon, WeatherView};
pub use provider::WeatherProvider;
pub use units::UnitSystem;
