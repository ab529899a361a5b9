use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized city name used to index the cache and to query the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CityKey(String);

impl CityKey {
    /// Trim, collapse inner whitespace and lowercase.
    pub fn new(city: &str) -> Self {
        let joined = city.split_whitespace().collect::<Vec<_>>().join(" ");
        Self(joined.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current conditions for one city. Temperatures are Celsius, wind is m/s,
/// timestamps are epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub country: Option<String>,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed_mps: f64,
    pub wind_deg: f64,
    pub visibility_m: Option<u32>,
    pub sunrise: i64,
    pub sunset: i64,
    pub observed_at: i64,
    /// Shift of the city's local time from UTC, in seconds.
    pub utc_offset_secs: i32,
    /// Primary condition tag, e.g. "Clear" or "Rain".
    pub condition: String,
    pub description: String,
    pub icon: String,
}

impl WeatherRecord {
    pub fn display_name(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.city, country),
            None => self.city.clone(),
        }
    }
}

/// One slot of the daily forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub timestamp: i64,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub condition: String,
    pub description: String,
    pub icon: String,
    pub wind_speed_mps: f64,
    pub wind_deg: f64,
    /// Probability of precipitation, 0.0..=1.0.
    pub precipitation_chance: f64,
}

/// Autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
}

impl fmt::Display for CitySuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            Some(state) => write!(f, "{}, {}, {}", self.name, state, self.country),
            None => write!(f, "{}, {}", self.name, self.country),
        }
    }
}

/// Cities offered for quick access when nothing has been typed yet.
pub const POPULAR_CITIES: &[(&str, &str)] = &[
    ("New York", "US"),
    ("London", "GB"),
    ("Tokyo", "JP"),
    ("Paris", "FR"),
    ("Sydney", "AU"),
    ("Mumbai", "IN"),
];
