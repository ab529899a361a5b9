//! User display preferences (temperature unit and theme) mirrored to a
//! durable key/value store.
//!
//! Values are kept under the keys `isCelsius` and `darkMode` as JSON
//! booleans. Missing or unreadable values fall back to Celsius / light.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNIT_KEY: &str = "isCelsius";
pub const THEME_KEY: &str = "darkMode";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    pub unit: TemperatureUnit,
    pub theme: Theme,
}

/// Durable string key/value storage. Values are JSON text.
pub trait PreferenceStorage: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores all keys in one JSON object file, each value as a JSON value
/// (`{"isCelsius": true}`), so the file can be edited by hand.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences file: {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse preferences file: {}", self.path.display()))
    }
}

impl PreferenceStorage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        match self.read_all() {
            Ok(mut entries) => entries.remove(key).map(|value| match value {
                Value::String(text) => text,
                other => other.to_string(),
            }),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable preferences file");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        // A corrupt file is replaced rather than blocking every later write.
        let mut entries = self.read_all().unwrap_or_default();
        let value = serde_json::from_str::<Value>(value)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        entries.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&entries)
            .context("Failed to serialize preferences to JSON")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write preferences file: {}", self.path.display()))
    }
}

/// Process-local storage, used when nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Owned preference state with write-through to its storage.
pub struct Preferences<S: PreferenceStorage> {
    storage: S,
    current: DisplayPreferences,
}

impl<S: PreferenceStorage> Preferences<S> {
    pub fn load(storage: S) -> Self {
        let is_celsius = read_flag(&storage, UNIT_KEY).unwrap_or(true);
        let dark_mode = read_flag(&storage, THEME_KEY).unwrap_or(false);

        let current = DisplayPreferences {
            unit: if is_celsius { TemperatureUnit::Celsius } else { TemperatureUnit::Fahrenheit },
            theme: if dark_mode { Theme::Dark } else { Theme::Light },
        };

        Self { storage, current }
    }

    pub fn current(&self) -> DisplayPreferences {
        self.current
    }

    pub fn toggle_unit(&mut self) -> DisplayPreferences {
        self.current.unit = self.current.unit.toggled();
        let is_celsius = self.current.unit == TemperatureUnit::Celsius;
        self.persist(UNIT_KEY, is_celsius);
        self.current
    }

    pub fn toggle_theme(&mut self) -> DisplayPreferences {
        self.current.theme = self.current.theme.toggled();
        let dark_mode = self.current.theme == Theme::Dark;
        self.persist(THEME_KEY, dark_mode);
        self.current
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&self, key: &str, flag: bool) {
        if let Err(err) = self.storage.write(key, &flag.to_string()) {
            tracing::warn!(key, error = %err, "failed to persist preference");
        }
    }
}

fn read_flag<S: PreferenceStorage>(storage: &S, key: &str) -> Option<bool> {
    let raw = storage.read(key)?;
    match serde_json::from_str::<bool>(&raw) {
        Ok(flag) => Some(flag),
        Err(_) => {
            tracing::debug!(key, raw = %raw, "unparseable preference, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_storage_is_empty() {
        let prefs = Preferences::load(MemoryStorage::new());
        assert_eq!(prefs.current(), DisplayPreferences::default());
        assert_eq!(prefs.current().unit, TemperatureUnit::Celsius);
        assert_eq!(prefs.current().theme, Theme::Light);
    }

    #[test]
    fn defaults_when_values_are_garbage() {
        let storage = MemoryStorage::new();
        storage.write(UNIT_KEY, "maybe").unwrap();
        storage.write(THEME_KEY, "{").unwrap();

        let prefs = Preferences::load(storage);
        assert_eq!(prefs.current(), DisplayPreferences::default());
    }

    #[test]
    fn loads_stored_flags() {
        let storage = MemoryStorage::new();
        storage.write(UNIT_KEY, "false").unwrap();
        storage.write(THEME_KEY, "true").unwrap();

        let prefs = Preferences::load(storage);
        assert_eq!(prefs.current().unit, TemperatureUnit::Fahrenheit);
        assert_eq!(prefs.current().theme, Theme::Dark);
    }

    #[test]
    fn toggles_are_independent_and_written_back() {
        let mut prefs = Preferences::load(MemoryStorage::new());

        let after_unit = prefs.toggle_unit();
        assert_eq!(after_unit.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(after_unit.theme, Theme::Light);
        assert_eq!(prefs.storage().read(UNIT_KEY).as_deref(), Some("false"));
        assert_eq!(prefs.storage().read(THEME_KEY), None);

        let after_theme = prefs.toggle_theme();
        assert_eq!(after_theme.theme, Theme::Dark);
        assert_eq!(prefs.storage().read(THEME_KEY).as_deref(), Some("true"));

        prefs.toggle_unit();
        assert_eq!(prefs.current().unit, TemperatureUnit::Celsius);
        assert_eq!(prefs.storage().read(UNIT_KEY).as_deref(), Some("true"));
    }

    #[test]
    fn file_storage_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut prefs = Preferences::load(FileStorage::new(&path));
        prefs.toggle_theme();
        assert!(path.exists());

        let reloaded = Preferences::load(FileStorage::new(&path));
        assert_eq!(reloaded.current().theme, Theme::Dark);
        assert_eq!(reloaded.current().unit, TemperatureUnit::Celsius);
    }

    #[test]
    fn file_storage_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "not json").unwrap();

        let mut prefs = Preferences::load(FileStorage::new(&path));
        assert_eq!(prefs.current(), DisplayPreferences::default());

        prefs.toggle_unit();
        let reloaded = Preferences::load(FileStorage::new(&path));
        assert_eq!(reloaded.current().unit, TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn file_storage_writes_json_booleans() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");

        let mut prefs = Preferences::load(FileStorage::new(&path));
        prefs.toggle_unit();
        prefs.toggle_theme();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[UNIT_KEY], Value::Bool(false));
        assert_eq!(raw[THEME_KEY], Value::Bool(true));
    }

    #[test]
    fn file_storage_reads_hand_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, r#"{ "isCelsius": false, "darkMode": true }"#).unwrap();

        let mut prefs = Preferences::load(FileStorage::new(&path));
        assert_eq!(prefs.current().unit, TemperatureUnit::Fahrenheit);
        assert_eq!(prefs.current().theme, Theme::Dark);

        prefs.toggle_theme();
        let reloaded = Preferences::load(FileStorage::new(&path));
        assert_eq!(reloaded.current().unit, TemperatureUnit::Fahrenheit);
        assert_eq!(reloaded.current().theme, Theme::Light);
        assert_eq!(reloaded.storage().path(), path.as_path());
    }
}
