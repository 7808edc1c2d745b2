//! Application state and the user-facing operations: search, use current
//! location, unit and theme toggles, and startup.
//!
//! Every operation catches its own errors and turns them into a single
//! notification on the [`RenderSink`]; the returned [`Outcome`] is for
//! adapters and tests that want to know what happened.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use crate::{
    Config, WeatherError,
    aggregate::aggregate_daily,
    location::{
        BigDataCloudGeocoder, DeviceLocator, IpInfoLocator, LocationResolver, LocationSource,
        ResolvedLocation, ResolverState,
    },
    model::{CurrentReport, ForecastSample},
    preferences::{PreferenceStore, Preferences, Theme},
    presentation::{WeatherView, build_view},
    provider::{WeatherProvider, provider_from_config},
    units::UnitSystem,
};

/// Searched when nothing has been stored yet.
pub const DEFAULT_CITY: &str = "London";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Where rendered output goes: a terminal, a window, a test recorder.
pub trait RenderSink: Send + Sync {
    fn render(&self, view: &WeatherView);

    fn notify(&self, notice: &Notice);

    /// Raised while at least one request is in flight.
    fn set_busy(&self, busy: bool);

    /// Progress text while resolving the current location; `None` clears it.
    fn location_status(&self, _status: Option<&str>) {}

    fn apply_theme(&self, _theme: Theme) {}

    fn apply_unit(&self, _unit: UnitSystem) {}
}

/// What the last successful or attempted query was, so a unit change can repeat it.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    City(String),
    Here(ResolvedLocation),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub unit: UnitSystem,
    pub theme: Theme,
    pub last_query: Option<Query>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rendered(WeatherView),
    /// Nothing to do: blank input, unchanged unit, no previous query.
    Skipped,
    /// A newer request started before this one finished; its result was dropped.
    Superseded,
    Failed(WeatherError),
}

pub struct WeatherApp {
    provider: Arc<dyn WeatherProvider>,
    resolver: LocationResolver,
    preferences: PreferenceStore,
    sink: Arc<dyn RenderSink>,
    state: Mutex<AppState>,
    generation: AtomicU64,
    in_flight: AtomicUsize,
}

impl WeatherApp {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        resolver: LocationResolver,
        preferences: PreferenceStore,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        Self {
            provider,
            resolver,
            preferences,
            sink,
            state: Mutex::new(AppState::default()),
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Wires the OpenWeatherMap provider and the public location services from config.
    /// Works without an API key; only weather fetches need one.
    pub fn from_config(
        config: &Config,
        device: Box<dyn DeviceLocator>,
        preferences: PreferenceStore,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        let provider: Arc<dyn WeatherProvider> = Arc::from(provider_from_config(config));
        let resolver = LocationResolver::new(
            device,
            Box::new(BigDataCloudGeocoder::with_url(config.reverse_geocode_url())),
            Box::new(IpInfoLocator::with_url(config.ip_geolocation_url())),
        );

        Self::new(provider, resolver, preferences, sink)
    }

    pub fn state(&self) -> AppState {
        self.state.lock().clone()
    }

    /// Reads stored preferences once and applies them without fetching anything.
    /// The stored last city becomes the query a unit change repeats.
    pub fn restore(&self) -> Preferences {
        let prefs = self.preferences.load();
        tracing::debug!(theme = %prefs.theme, unit = %prefs.unit, "loaded preferences");

        {
            let mut state = self.state.lock();
            state.theme = prefs.theme;
            state.unit = prefs.unit;
            state.last_query = prefs.last_city.clone().map(Query::City);
        }
        self.sink.apply_theme(prefs.theme);
        self.sink.apply_unit(prefs.unit);

        prefs
    }

    /// Applies stored preferences, then shows the last city (or the default one).
    pub async fn start(&self) -> Outcome {
        let prefs = self.restore();
        let city = prefs.last_city.unwrap_or_else(|| DEFAULT_CITY.to_string());
        self.search(&city).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn search(&self, city: &str) -> Outcome {
        let city = city.trim();
        if city.is_empty() {
            return Outcome::Skipped;
        }

        let ticket = self.next_ticket();
        self.run(Query::City(city.to_string()), ticket).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn use_current_location(&self) -> Outcome {
        let ticket = self.next_ticket();
        let _busy = BusyGuard::new(&self.in_flight, self.sink.as_ref());

        let sink = &self.sink;
        let resolved = self
            .resolver
            .resolve(&mut |state: &ResolverState| {
                if let Some(text) = state.status_text() {
                    sink.location_status(Some(text));
                }
            })
            .await;

        let outcome = match resolved {
            Ok(location) if self.is_current(ticket) => self.run(Query::Here(location), ticket).await,
            Ok(_) => Outcome::Superseded,
            Err(e) if self.is_current(ticket) => self.fail(e),
            Err(_) => Outcome::Superseded,
        };

        self.sink.location_status(None);
        outcome
    }

    /// Switches units and repeats the last query; a no-op if the unit is already active.
    pub async fn set_unit(&self, unit: UnitSystem) -> Outcome {
        let last_query = {
            let mut state = self.state.lock();
            if state.unit == unit {
                return Outcome::Skipped;
            }
            state.unit = unit;
            state.last_query.clone()
        };

        self.preferences.save_unit(unit);
        self.sink.apply_unit(unit);

        match last_query {
            Some(query) => {
                let ticket = self.next_ticket();
                self.run(query, ticket).await
            }
            None => Outcome::Skipped,
        }
    }

    pub fn set_theme(&self, theme: Theme) {
        self.state.lock().theme = theme;
        self.preferences.save_theme(theme);
        self.sink.apply_theme(theme);
    }

    pub fn toggle_theme(&self) -> Theme {
        let next = self.state.lock().theme.toggled();
        self.set_theme(next);
        next
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    async fn run(&self, query: Query, ticket: u64) -> Outcome {
        let _busy = BusyGuard::new(&self.in_flight, self.sink.as_ref());
        let unit = self.state.lock().unit;

        let fetched = self.fetch(&query, unit).await;

        if !self.is_current(ticket) {
            tracing::info!(ticket, "discarding response from a superseded request");
            return Outcome::Superseded;
        }

        let (report, samples) = match fetched {
            Ok(data) => data,
            Err(e) => return self.fail_with(e, failure_message(&query, e)),
        };

        let days = aggregate_daily(&samples);
        let (place, message) = match &query {
            Query::City(_) => (report.place.clone(), "Updated"),
            Query::Here(location) => (
                location.place.clone(),
                match location.source {
                    LocationSource::Device => "Updated from current location",
                    LocationSource::Ip => "Updated from IP location",
                },
            ),
        };

        let view = build_view(&report.conditions, &days, &place, unit);
        self.sink.render(&view);
        self.preferences.save_last_city(place.as_str());
        self.state.lock().last_query = Some(query);
        self.sink.notify(&Notice::success(message));

        tracing::info!(place = %place, days = days.len(), "rendered weather");
        Outcome::Rendered(view)
    }

    /// Current conditions and forecast, fetched concurrently; either failure aborts both.
    async fn fetch(
        &self,
        query: &Query,
        unit: UnitSystem,
    ) -> Result<(CurrentReport, Vec<ForecastSample>), WeatherError> {
        match query {
            Query::City(city) => {
                tokio::try_join!(
                    self.provider.current_by_name(city, unit),
                    self.provider.forecast_by_name(city, unit),
                )
            }
            Query::Here(location) => {
                tokio::try_join!(
                    self.provider.current_by_coords(location.coordinates, unit),
                    self.provider.forecast_by_coords(location.coordinates, unit),
                )
            }
        }
    }

    fn fail(&self, error: WeatherError) -> Outcome {
        self.fail_with(error, error.user_message())
    }

    fn fail_with(&self, error: WeatherError, message: &str) -> Outcome {
        if error.is_fatal() {
            tracing::error!("{error}");
        } else {
            tracing::warn!("{error}");
        }
        self.sink.notify(&Notice::error(message));
        Outcome::Failed(error)
    }
}

/// A weather fetch that fails after the location resolved is reported in
/// terms of the location flow; a bad credential keeps its own hint.
fn failure_message(query: &Query, error: WeatherError) -> &'static str {
    match query {
        Query::Here(location) if !error.is_fatal() => match location.source {
            LocationSource::Device => "Failed to get weather for current location.",
            LocationSource::Ip => WeatherError::LocationUnavailable.user_message(),
        },
        Query::Here(_) | Query::City(_) => error.user_message(),
    }
}

/// Keeps the sink's busy flag raised while any request is in flight and
/// lowers it on every exit path.
struct BusyGuard<'a> {
    in_flight: &'a AtomicUsize,
    sink: &'a dyn RenderSink,
}

impl<'a> BusyGuard<'a> {
    fn new(in_flight: &'a AtomicUsize, sink: &'a dyn RenderSink) -> Self {
        if in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            sink.set_busy(true);
        }
        Self { in_flight, sink }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.sink.set_busy(false);
        }
    }
}
