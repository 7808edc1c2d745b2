//! Persisted user preferences: last city, theme and unit.
//!
//! The backing store may be missing, corrupt or read-only. None of that is
//! fatal: reads fall back to defaults and failed writes are only logged.

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    convert::TryFrom,
    fmt, fs,
    path::{Path, PathBuf},
};

use crate::units::UnitSystem;

pub const LAST_CITY_KEY: &str = "weather:lastCity";
pub const THEME_KEY: &str = "weather:theme";
pub const UNIT_KEY: &str = "weather:unit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Theme {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(anyhow!("Unknown theme '{value}'. Supported themes: dark, light.")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Preferences {
    pub last_city: Option<String>,
    pub theme: Theme,
    pub unit: UnitSystem,
}

/// String-valued key-value storage.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-process store; useful for tests and for running without a data dir.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A TOML table of strings on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store in the platform data directory.
    pub fn in_data_dir() -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "skyview", "skyview")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(Self::new(dirs.data_dir().join("preferences.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match self.read_raw()? {
            Some(contents) => parse_entries(&contents, &self.path),
            None => Ok(BTreeMap::new()),
        }
    }

    fn read_raw(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&self.path)
            .map(Some)
            .with_context(|| format!("Failed to read preferences file: {}", self.path.display()))
    }
}

fn parse_entries(contents: &str, path: &Path) -> Result<BTreeMap<String, String>> {
    toml::from_str(contents)
        .with_context(|| format!("Failed to parse preferences file: {}", path.display()))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock();
        // Unreadable files are left alone; only unparseable ones are replaced.
        let mut entries = match self.read_raw()? {
            Some(contents) => parse_entries(&contents, &self.path).unwrap_or_else(|e| {
                tracing::warn!("Replacing corrupt preferences file: {e:#}");
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string(&entries).context("Failed to serialize preferences to TOML")?;

        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write preferences file: {}", self.path.display()))
    }
}

/// Typed access to preferences over an unreliable [`KeyValueStore`].
#[derive(Debug)]
pub struct PreferenceStore {
    store: Box<dyn KeyValueStore>,
}

impl PreferenceStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Reads all preferences, defaulting anything absent, corrupt or unreadable.
    pub fn load(&self) -> Preferences {
        let last_city = self.read(LAST_CITY_KEY).filter(|c| !c.trim().is_empty());

        let theme = self
            .read(THEME_KEY)
            .and_then(|raw| Theme::try_from(raw.as_str()).ok())
            .unwrap_or_default();

        let unit = self
            .read(UNIT_KEY)
            .and_then(|raw| UnitSystem::try_from(raw.as_str()).ok())
            .unwrap_or_default();

        Preferences {
            last_city,
            theme,
            unit,
        }
    }

    pub fn save_last_city(&self, city: &str) {
        self.write(LAST_CITY_KEY, city);
    }

    pub fn save_theme(&self, theme: Theme) {
        self.write(THEME_KEY, theme.as_str());
    }

    pub fn save_unit(&self, unit: UnitSystem) {
        self.write(UNIT_KEY, unit.code());
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Preference store unavailable, treating {key} as unset: {e:#}");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Failed to persist preference {key}: {e:#}");
        }
    }
}
