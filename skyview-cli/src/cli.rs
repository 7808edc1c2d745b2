use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{process::ExitCode, sync::Arc};

use skyview_core::{
    Config, Coordinates, Outcome, PreferenceStore, Theme, UnitSystem, WeatherApp,
    location::{DeviceLocator, FixedPosition, UnsupportedDevice},
    preferences::FileStore,
    provider::is_plausible_api_key,
};

use crate::render::TerminalSink;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyview", version, about = "Current weather and 5-day forecast")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// With no command, shows the last searched city (or London).
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key.
    Configure,

    /// Show weather for a city.
    Show {
        /// City name, optionally with country code, e.g. "Paris, FR".
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },

    /// Show weather for the current location.
    Here {
        /// Latitude reported by this device; without it the IP fallback is used.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude reported by this device.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Switch temperature unit and refresh the last location.
    Unit {
        /// "c" or "f".
        unit: String,
    },

    /// Set the theme, or toggle it when none is given.
    Theme {
        /// "dark" or "light".
        theme: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Some(Command::Configure) => {
                configure()?;
                Ok(ExitCode::SUCCESS)
            }
            Some(Command::Theme { theme }) => {
                let app = build_app(Box::new(UnsupportedDevice))?;
                app.restore();
                let theme = match theme {
                    Some(raw) => {
                        let theme = Theme::try_from(raw.as_str())?;
                        app.set_theme(theme);
                        theme
                    }
                    None => app.toggle_theme(),
                };
                println!("Theme set to {theme}.");
                Ok(ExitCode::SUCCESS)
            }
            Some(Command::Unit { unit }) => {
                let unit = UnitSystem::try_from(unit.as_str())?;
                let app = build_app(Box::new(UnsupportedDevice))?;
                app.restore();
                if app.state().unit == unit {
                    println!("Unit already set to {}.", unit.temperature_suffix());
                    return Ok(ExitCode::SUCCESS);
                }
                match app.set_unit(unit).await {
                    Outcome::Skipped => {
                        println!("Unit set to {}.", unit.temperature_suffix());
                        Ok(ExitCode::SUCCESS)
                    }
                    outcome => exit_status(outcome),
                }
            }
            Some(Command::Show { city }) => {
                let app = build_app(Box::new(UnsupportedDevice))?;
                app.restore();
                exit_status(app.search(&city.join(" ")).await)
            }
            Some(Command::Here { lat, lon }) => {
                let device: Box<dyn DeviceLocator> = match (lat, lon) {
                    (Some(lat), Some(lon)) => Box::new(FixedPosition::new(Coordinates::new(lat, lon))),
                    _ => Box::new(UnsupportedDevice),
                };
                let app = build_app(device)?;
                app.restore();
                exit_status(app.use_current_location().await)
            }
            None => {
                let app = build_app(Box::new(UnsupportedDevice))?;
                exit_status(app.start().await)
            }
        }
    }
}

fn build_app(device: Box<dyn DeviceLocator>) -> anyhow::Result<WeatherApp> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    let preferences = match FileStore::in_data_dir() {
        Ok(store) => PreferenceStore::new(Box::new(store)),
        Err(e) => {
            tracing::warn!("Preferences will not be saved: {e:#}");
            PreferenceStore::in_memory()
        }
    };

    Ok(WeatherApp::from_config(
        &config,
        device,
        preferences,
        Arc::new(TerminalSink::new()),
    ))
}

/// The notice was already printed by the sink; only the exit code is left.
fn exit_status(outcome: Outcome) -> anyhow::Result<ExitCode> {
    Ok(match outcome {
        Outcome::Failed(_) => ExitCode::FAILURE,
        Outcome::Rendered(_) | Outcome::Skipped | Outcome::Superseded => ExitCode::SUCCESS,
    })
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = inquire::Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .with_help_message("Paste just the key, not a URL")
        .prompt()
        .context("Failed to read API key")?;

    if !is_plausible_api_key(&key) {
        anyhow::bail!("That does not look like an OpenWeatherMap API key (paste only the key).");
    }

    config.set_api_key(key);
    config.save()?;

    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}
