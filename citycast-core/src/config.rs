use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// # base_url = "https://api.openweathermap.org/data/2.5"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// Override for the provider endpoint root.
    pub base_url: Option<String>,

    /// Key taken from the environment; never written back to disk.
    #[serde(skip)]
    env_api_key: Option<String>,
}

impl Config {
    /// Load config from disk (or defaults on first run) and apply the environment override.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_from(&Self::config_file_path()?)?;
        cfg.apply_env_api_key(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    /// Load config from a specific file, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "citycast", "citycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the display preferences file.
    pub fn preferences_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("preferences.json"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Blank values are ignored.
    pub fn apply_env_api_key(&mut self, value: Option<String>) {
        self.env_api_key = value.filter(|v| !v.trim().is_empty());
    }

    /// The environment key if set, otherwise the stored one.
    pub fn api_key(&self) -> Option<&str> {
        self.env_api_key
            .as_deref()
            .or(self.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_key() {
        let cfg = Config::default();
        assert_eq!(cfg.api_key(), None);
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn env_key_wins_over_stored_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());
        assert_eq!(cfg.api_key(), Some("FILE_KEY"));

        cfg.apply_env_api_key(Some("ENV_KEY".into()));
        assert_eq!(cfg.api_key(), Some("ENV_KEY"));

        cfg.apply_env_api_key(Some("   ".into()));
        assert_eq!(cfg.api_key(), Some("FILE_KEY"));
    }

    #[test]
    fn blank_stored_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key(String::new());
        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn save_and_load_roundtrip_skips_env_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("citycast").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());
        cfg.base_url = Some("http://localhost:9999".into());
        cfg.apply_env_api_key(Some("ENV_KEY".into()));
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key(), Some("FILE_KEY"));
        assert_eq!(loaded.base_url(), "http://localhost:9999");
        assert!(!fs::read_to_string(&path).unwrap().contains("ENV_KEY"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
