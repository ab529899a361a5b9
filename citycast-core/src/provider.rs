use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;

use crate::{
    Config,
    error::FetchError,
    model::{CitySuggestion, ForecastDay, WeatherRecord},
    provider::openweather::OpenWeatherProvider,
};

pub mod openweather;

/// Forecast entries arrive every 3 hours; every 8th is roughly one per day.
pub const FORECAST_STRIDE: usize = 8;
pub const FORECAST_DAYS: usize = 5;

/// Source of weather data, keyed by city name.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city.
    async fn current(&self, city: &str) -> Result<WeatherRecord, FetchError>;

    /// Daily forecast, already sampled down to one entry per day.
    async fn forecast(&self, city: &str) -> Result<Vec<ForecastDay>, FetchError>;

    /// Autocomplete candidates for a partial city name.
    async fn find(&self, query: &str) -> Result<Vec<CitySuggestion>, FetchError>;
}

/// Keep one entry per day out of a 3-hourly list: indices 0, 8, 16, ...
pub fn sample_daily<T>(entries: Vec<T>) -> Vec<T> {
    entries
        .into_iter()
        .step_by(FORECAST_STRIDE)
        .take(FORECAST_DAYS)
        .collect()
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `citycast configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    let provider = OpenWeatherProvider::new(api_key, config.base_url())?;
    Ok(Arc::new(provider))
}
