use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::FetchError,
    model::{CitySuggestion, ForecastDay, WeatherRecord},
    provider::sample_daily,
};

use super::WeatherProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Entries requested from the 3-hourly forecast endpoint (5 days).
const FORECAST_COUNT: &str = "40";
const SUGGESTION_COUNT: &str = "5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: &str, base_url: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// GET `{base}/{endpoint}` with the shared auth/unit parameters and
    /// classify the outcome.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &str,
        extra: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        tracing::info!(endpoint, city, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .query(extra)
            .send()
            .await
            .map_err(|e| FetchError::Network { detail: e.to_string() })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::Network { detail: e.to_string() })?;

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { city: city.to_string() });
        }

        if !status.is_success() {
            tracing::warn!(endpoint, %status, body = %truncate_body(&body), "OpenWeather request failed");
            return Err(FetchError::Provider {
                status: status.as_u16(),
                detail: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Provider {
            status: status.as_u16(),
            detail: format!("Failed to parse OpenWeather {endpoint} JSON: {e}"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    #[serde(default)]
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    visibility: Option<u32>,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwFindSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwFindEntry {
    name: String,
    sys: OwFindSys,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwFindResponse {
    #[serde(default)]
    list: Vec<OwFindEntry>,
}

/// Primary condition tag, description and icon code of the first weather entry.
fn primary_condition(weather: Vec<OwWeather>) -> (String, String, String) {
    weather
        .into_iter()
        .next()
        .map(|w| (w.main, w.description, w.icon))
        .unwrap_or_else(|| ("Unknown".to_string(), "unknown".to_string(), String::new()))
}

impl From<OwCurrentResponse> for WeatherRecord {
    fn from(parsed: OwCurrentResponse) -> Self {
        let (condition, description, icon) = primary_condition(parsed.weather);

        WeatherRecord {
            city: parsed.name,
            country: parsed.sys.country,
            temperature_c: parsed.main.temp,
            feels_like_c: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            wind_speed_mps: parsed.wind.speed,
            wind_deg: parsed.wind.deg,
            visibility_m: parsed.visibility,
            sunrise: parsed.sys.sunrise,
            sunset: parsed.sys.sunset,
            observed_at: parsed.dt,
            utc_offset_secs: parsed.timezone,
            condition,
            description,
            icon,
        }
    }
}

impl From<OwForecastEntry> for ForecastDay {
    fn from(entry: OwForecastEntry) -> Self {
        let (condition, description, icon) = primary_condition(entry.weather);

        ForecastDay {
            timestamp: entry.dt,
            temperature_c: entry.main.temp,
            feels_like_c: entry.main.feels_like,
            humidity_pct: entry.main.humidity,
            pressure_hpa: entry.main.pressure,
            condition,
            description,
            icon,
            wind_speed_mps: entry.wind.speed,
            wind_deg: entry.wind.deg,
            precipitation_chance: entry.pop,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        let parsed: OwCurrentResponse = self.get_json("weather", city, &[]).await?;
        Ok(parsed.into())
    }

    async fn forecast(&self, city: &str) -> Result<Vec<ForecastDay>, FetchError> {
        let parsed: OwForecastResponse =
            self.get_json("forecast", city, &[("cnt", FORECAST_COUNT)]).await?;

        Ok(sample_daily(parsed.list).into_iter().map(ForecastDay::from).collect())
    }

    async fn find(&self, query: &str) -> Result<Vec<CitySuggestion>, FetchError> {
        let parsed: OwFindResponse = self
            .get_json(
                "find",
                query,
                &[("type", "like"), ("sort", "population"), ("cnt", SUGGESTION_COUNT)],
            )
            .await?;

        Ok(parsed
            .list
            .into_iter()
            .map(|entry| CitySuggestion {
                name: entry.name,
                country: entry.sys.country,
                state: entry.state,
            })
            .collect())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
