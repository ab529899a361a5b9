//! Core library for `citycast`.
//!
//! This crate defines:
//! - City-name validation and presentation formatting
//! - Abstraction over the weather provider (OpenWeather)
//! - A cache-first weather store with a published fetch state
//! - Debounced autocomplete and persisted display preferences
//!
//! It is used by `citycast-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod debounce;
pub mod error;
pub mod format;
pub mod model;
pub mod preferences;
pub mod provider;
pub mod store;
pub mod suggest;
pub mod validate;

pub use config::Config;
pub use debounce::Debouncer;
pub use error::{FetchError, ValidationError};
pub use model::{CityKey, CitySuggestion, ForecastDay, WeatherRecord};
pub use preferences::{DisplayPreferences, Preferences, TemperatureUnit, Theme};
pub use provider::{WeatherProvider, provider_from_config};
pub use store::{FetchState, WeatherStore};
pub use suggest::{Autocomplete, LookupStatus};
pub use validate::validate_city;
