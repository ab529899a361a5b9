//! Terminal rendering. Colours follow the same tone bands as the web UI
//! classes, with one palette per theme.

use std::fmt::{Display, Write};

use citycast_core::{
    CitySuggestion, DisplayPreferences, ForecastDay, Theme, WeatherRecord,
    format::{
        self, Condition, Tone, capitalize, format_date, format_precipitation, format_pressure,
        format_short_date, format_temperature, format_time, format_visibility, humidity_tone,
        temperature_tone, wind_direction, wind_speed_tone,
    },
};
use crossterm::style::{Color, Stylize, style};

fn tone_color(tone: Tone, theme: Theme) -> Color {
    match theme {
        // Darker shades stay readable on a light background.
        Theme::Light => match tone {
            Tone::Blue400 => Color::DarkBlue,
            Tone::Blue300 => Color::Blue,
            Tone::Green400 => Color::DarkGreen,
            Tone::Yellow400 => Color::DarkYellow,
            Tone::Red400 => Color::DarkRed,
            Tone::Gray400 => Color::DarkGrey,
        },
        Theme::Dark => match tone {
            Tone::Blue400 => Color::Rgb { r: 96, g: 165, b: 250 },
            Tone::Blue300 => Color::Rgb { r: 147, g: 197, b: 253 },
            Tone::Green400 => Color::Rgb { r: 74, g: 222, b: 128 },
            Tone::Yellow400 => Color::Rgb { r: 250, g: 204, b: 21 },
            Tone::Red400 => Color::Rgb { r: 248, g: 113, b: 113 },
            Tone::Gray400 => Color::Rgb { r: 156, g: 163, b: 175 },
        },
    }
}

fn paint(text: impl Display, tone: Tone, theme: Theme) -> String {
    style(text).with(tone_color(tone, theme)).to_string()
}

fn heading(text: impl Display, theme: Theme) -> String {
    match theme {
        Theme::Light => style(text).bold().to_string(),
        Theme::Dark => style(text).bold().with(Color::White).to_string(),
    }
}

fn row(out: &mut String, label: &str, value: impl Display) {
    let _ = writeln!(out, "  {label:<12}{value}");
}

/// Current conditions block. `is_day` picks the day or night icon.
pub fn current(record: &WeatherRecord, prefs: DisplayPreferences, is_day: bool) -> String {
    let theme = prefs.theme;
    let unit = prefs.unit;
    let condition = Condition::from_tag(&record.condition);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        condition.icon(is_day),
        heading(record.display_name(), theme)
    );
    let _ = writeln!(out, "  {}", format_date(record.observed_at, record.utc_offset_secs));

    let temp = format::convert_temperature(record.temperature_c, unit);
    row(
        &mut out,
        "Temperature",
        format!(
            "{} (feels like {})",
            paint(format_temperature(record.temperature_c, unit), temperature_tone(temp, unit), theme),
            format_temperature(record.feels_like_c, unit),
        ),
    );
    row(
        &mut out,
        "Conditions",
        paint(capitalize(&record.description), condition.tone(), theme),
    );
    row(
        &mut out,
        "Humidity",
        paint(
            format!("{}%", record.humidity_pct),
            humidity_tone(f64::from(record.humidity_pct)),
            theme,
        ),
    );
    row(
        &mut out,
        "Wind",
        paint(
            format!("{} m/s {}", record.wind_speed_mps, wind_direction(record.wind_deg)),
            wind_speed_tone(record.wind_speed_mps),
            theme,
        ),
    );
    row(&mut out, "Pressure", format_pressure(record.pressure_hpa));
    if let Some(visibility) = record.visibility_m {
        row(&mut out, "Visibility", format_visibility(visibility));
    }
    row(&mut out, "Sunrise", format_time(record.sunrise, record.utc_offset_secs));
    row(&mut out, "Sunset", format_time(record.sunset, record.utc_offset_secs));
    row(&mut out, "Icon", format::icon_url(&record.icon));

    out
}

/// One line per forecast day.
pub fn forecast(days: &[ForecastDay], prefs: DisplayPreferences, utc_offset_secs: i32) -> String {
    let theme = prefs.theme;
    let unit = prefs.unit;

    let mut out = String::new();
    let _ = writeln!(out, "  {}", heading("5-Day Forecast", theme));

    for day in days {
        let condition = Condition::from_tag(&day.condition);
        let temp = format::convert_temperature(day.temperature_c, unit);

        let _ = write!(
            out,
            "  {:<12}{} {}  {}  {}%  {} m/s {}",
            format_short_date(day.timestamp, utc_offset_secs),
            condition.icon(true),
            paint(format_temperature(day.temperature_c, unit), temperature_tone(temp, unit), theme),
            capitalize(&day.description),
            day.humidity_pct,
            day.wind_speed_mps,
            wind_direction(day.wind_deg),
        );
        if let Some(rain) = format_precipitation(day.precipitation_chance) {
            let _ = write!(out, "  {}", paint(rain, Tone::Blue400, theme));
        }
        out.push('\n');
    }

    out
}

pub fn suggestions(list: &[CitySuggestion]) -> String {
    let mut out = String::new();
    for (i, suggestion) in list.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, suggestion);
    }
    out
}

pub fn preferences(prefs: DisplayPreferences) -> String {
    let unit = match prefs.unit {
        citycast_core::TemperatureUnit::Celsius => "Celsius",
        citycast_core::TemperatureUnit::Fahrenheit => "Fahrenheit",
    };
    let theme = match prefs.theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    };
    format!("Temperature unit: {unit}\nTheme: {theme}")
}

pub fn error(message: impl Display, theme: Theme) -> String {
    paint(message, Tone::Red400, theme)
}
