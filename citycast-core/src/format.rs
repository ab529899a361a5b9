//! Pure presentation helpers: unit conversion, compass bucketing, icon and
//! colour-band lookups, and date/time rendering.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::preferences::TemperatureUnit;

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Convert a provider temperature (Celsius) into the requested unit.
pub fn convert_temperature(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
    }
}

/// Inverse of [`convert_temperature`].
pub fn to_celsius(value: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => value,
        TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
    }
}

/// e.g. `21.5°C`
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    format!("{:.1}{}", convert_temperature(celsius, unit), unit.symbol())
}

/// Bucket a compass bearing into one of eight points, wrapping any multiple of 360.
///
/// Halfway bearings round up (22.5° is NE), for negative bearings too, so a
/// shift by a full turn never changes the result.
pub fn wind_direction(degrees: f64) -> &'static str {
    let index = (degrees / 45.0 + 0.5).floor() as i64;
    COMPASS_POINTS[index.rem_euclid(8) as usize]
}

pub fn is_day(sunrise: i64, sunset: i64, now: i64) -> bool {
    sunrise <= now && now <= sunset
}

pub fn is_day_now(sunrise: i64, sunset: i64) -> bool {
    is_day(sunrise, sunset, Utc::now().timestamp())
}

/// Colour band shared by the CSS class mapping and the terminal palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Blue400,
    Blue300,
    Green400,
    Yellow400,
    Red400,
    Gray400,
}

impl Tone {
    pub fn css_class(self) -> &'static str {
        match self {
            Tone::Blue400 => "text-blue-400",
            Tone::Blue300 => "text-blue-300",
            Tone::Green400 => "text-green-400",
            Tone::Yellow400 => "text-yellow-400",
            Tone::Red400 => "text-red-400",
            Tone::Gray400 => "text-gray-400",
        }
    }
}

/// Bands are fixed in Celsius whatever unit `value` is expressed in.
pub fn temperature_tone(value: f64, unit: TemperatureUnit) -> Tone {
    let celsius = to_celsius(value, unit);

    if celsius < 0.0 {
        Tone::Blue400
    } else if celsius < 10.0 {
        Tone::Blue300
    } else if celsius < 20.0 {
        Tone::Green400
    } else if celsius < 30.0 {
        Tone::Yellow400
    } else {
        Tone::Red400
    }
}

pub fn humidity_tone(humidity_pct: f64) -> Tone {
    if humidity_pct < 30.0 {
        Tone::Red400
    } else if humidity_pct < 60.0 {
        Tone::Yellow400
    } else {
        Tone::Green400
    }
}

pub fn wind_speed_tone(speed_mps: f64) -> Tone {
    if speed_mps < 5.0 {
        Tone::Green400
    } else if speed_mps < 15.0 {
        Tone::Yellow400
    } else {
        Tone::Red400
    }
}

/// Provider condition tags, with the dust/fog family folded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunderstorm,
    Drizzle,
    Fog,
    Squall,
    Tornado,
    Other,
}

impl Condition {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Clear" => Condition::Clear,
            "Clouds" => Condition::Clouds,
            "Rain" => Condition::Rain,
            "Snow" => Condition::Snow,
            "Thunderstorm" => Condition::Thunderstorm,
            "Drizzle" => Condition::Drizzle,
            "Mist" | "Fog" | "Smoke" | "Haze" | "Dust" | "Sand" | "Ash" => Condition::Fog,
            "Squall" => Condition::Squall,
            "Tornado" => Condition::Tornado,
            _ => Condition::Other,
        }
    }

    pub fn icon(self, is_day: bool) -> &'static str {
        match self {
            Condition::Clear if is_day => "☀️",
            Condition::Clear => "🌙",
            Condition::Clouds => "☁️",
            Condition::Rain => "🌧️",
            Condition::Snow => "❄️",
            Condition::Thunderstorm => "⛈️",
            Condition::Drizzle => "🌦️",
            Condition::Fog => "🌫️",
            Condition::Squall => "💨",
            Condition::Tornado => "🌪️",
            Condition::Other => "🌤️",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            Condition::Clear => Tone::Yellow400,
            Condition::Clouds | Condition::Fog => Tone::Gray400,
            Condition::Rain | Condition::Drizzle => Tone::Blue400,
            Condition::Snow => Tone::Blue300,
            Condition::Thunderstorm | Condition::Squall | Condition::Tornado => Tone::Red400,
            Condition::Other => Tone::Green400,
        }
    }
}

pub fn weather_icon(tag: &str, is_day: bool) -> &'static str {
    Condition::from_tag(tag).icon(is_day)
}

/// Image URL for a provider icon code such as `10d`.
pub fn icon_url(code: &str) -> String {
    format!("https://openweathermap.org/img/wn/{code}@2x.png")
}

fn local_time(epoch_secs: i64, utc_offset_secs: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(epoch_secs, 0)
        .unwrap_or_default()
        .with_timezone(&offset)
}

/// Clock time in the city's local time, e.g. `06:42 AM`.
pub fn format_time(epoch_secs: i64, utc_offset_secs: i32) -> String {
    local_time(epoch_secs, utc_offset_secs).format("%I:%M %p").to_string()
}

/// e.g. `Saturday, January 1, 2022`
pub fn format_date(epoch_secs: i64, utc_offset_secs: i32) -> String {
    local_time(epoch_secs, utc_offset_secs).format("%A, %B %-d, %Y").to_string()
}

/// e.g. `Sat, Jan 1`
pub fn format_short_date(epoch_secs: i64, utc_offset_secs: i32) -> String {
    local_time(epoch_secs, utc_offset_secs).format("%a, %b %-d").to_string()
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut out: String = first.to_uppercase().collect();
    out.push_str(&chars.as_str().to_lowercase());
    out
}

pub fn format_pressure(hpa: u32) -> String {
    format!("{hpa} hPa")
}

pub fn format_visibility(metres: u32) -> String {
    format!("{:.1} km", f64::from(metres) / 1000.0)
}

/// `None` when there is no chance of precipitation.
pub fn format_precipitation(chance: f64) -> Option<String> {
    (chance > 0.0).then(|| format!("{}% rain", (chance * 100.0).round()))
}
