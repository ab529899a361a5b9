use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use citycast_core::{
    Autocomplete, Config, LookupStatus, Preferences, WeatherProvider, WeatherStore,
    debounce::SUGGESTION_WINDOW,
    format::is_day_now,
    model::POPULAR_CITIES,
    preferences::FileStorage,
    provider_from_config, validate_city,
    validate::is_suggestible,
};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};

use crate::{render, server};

/// Upper bound on waiting for suggestions: debounce window plus the HTTP timeout.
const SUGGESTION_WAIT: Duration = Duration::from_secs(11);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citycast", version, about = "City weather lookup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure {
        /// Key to store; prompts when absent.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Show current weather for one or more cities.
    Show {
        /// City names, e.g. "London" "São Paulo".
        #[arg(required = true)]
        cities: Vec<String>,

        /// Also show the 5-day forecast.
        #[arg(long)]
        forecast: bool,

        /// Re-fetch every SECS seconds until interrupted.
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },

    /// Suggest city names matching a partial query.
    Suggest {
        query: String,
    },

    /// List popular cities for quick lookup.
    Popular,

    /// Print the current display preferences.
    Prefs,

    /// Switch between Celsius and Fahrenheit.
    ToggleUnit,

    /// Switch between the light and dark theme.
    ToggleTheme,

    /// Serve the weather endpoint over HTTP.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { api_key } => configure(api_key),
            Command::Show { cities, forecast, watch } => {
                let provider = load_provider()?;
                show(provider, &cities, forecast, watch).await
            }
            Command::Suggest { query } => suggest(load_provider()?, &query).await,
            Command::Popular => {
                for (name, country) in POPULAR_CITIES {
                    println!("  {name}, {country}");
                }
                Ok(())
            }
            Command::Prefs => {
                let prefs = load_preferences()?;
                println!("{}", render::preferences(prefs.current()));
                println!("Stored in {}", prefs.storage().path().display());
                Ok(())
            }
            Command::ToggleUnit => {
                let updated = load_preferences()?.toggle_unit();
                println!("{}", render::preferences(updated));
                Ok(())
            }
            Command::ToggleTheme => {
                let updated = load_preferences()?.toggle_theme();
                println!("{}", render::preferences(updated));
                Ok(())
            }
            Command::Serve { host, port } => server::serve(&host, port, load_provider()?).await,
        }
    }
}

fn load_provider() -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let config = Config::load()?;
    provider_from_config(&config)
}

fn load_preferences() -> anyhow::Result<Preferences<FileStorage>> {
    let path = Config::preferences_file_path()?;
    Ok(Preferences::load(FileStorage::new(path)))
}

fn configure(api_key: Option<String>) -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let api_key = match api_key {
        Some(key) => key,
        None => Password::new("OpenWeather API key:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
            .context("Failed to read API key")?,
    };

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key);
    config.save_to(&path)?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

async fn show(
    provider: Arc<dyn WeatherProvider>,
    cities: &[String],
    with_forecast: bool,
    watch: Option<u64>,
) -> anyhow::Result<()> {
    let prefs = load_preferences()?.current();
    let store = WeatherStore::new(provider);

    let mut failures = 0;
    for city in cities {
        if !show_one(&store, city, prefs, with_forecast, false).await {
            failures += 1;
        }
    }

    if let Some(secs) = watch {
        let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for city in cities {
                        show_one(&store, city, prefs, with_forecast, true).await;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        return Ok(());
    }

    if failures > 0 {
        bail!("{failures} of {} lookup(s) failed", cities.len());
    }
    Ok(())
}

/// Returns whether the lookup succeeded.
async fn show_one(
    store: &WeatherStore,
    city: &str,
    prefs: citycast_core::DisplayPreferences,
    with_forecast: bool,
    refresh: bool,
) -> bool {
    if let Err(reason) = validate_city(city) {
        eprintln!("{}", render::error(format!("{city}: {reason}"), prefs.theme));
        return false;
    }

    let result = if refresh { store.refresh(city).await } else { store.fetch(city).await };
    let record = match result {
        Ok(record) => record,
        Err(err) => {
            eprintln!("{}", render::error(format!("{city}: {err}"), prefs.theme));
            return false;
        }
    };

    let is_day = is_day_now(record.sunrise, record.sunset);
    println!("{}", render::current(&record, prefs, is_day));

    if with_forecast {
        match store.forecast(city).await {
            Ok(days) => println!("{}", render::forecast(&days, prefs, record.utc_offset_secs)),
            Err(_) => eprintln!("{}", render::error("Unable to load forecast data", prefs.theme)),
        }
    }

    true
}

async fn suggest(provider: Arc<dyn WeatherProvider>, query: &str) -> anyhow::Result<()> {
    if !is_suggestible(query) {
        bail!("Type at least 2 characters to get suggestions");
    }

    let autocomplete = Autocomplete::new(provider);
    let mut status = autocomplete.status();
    autocomplete.on_input(query);

    tracing::debug!(window_ms = SUGGESTION_WINDOW.as_millis() as u64, "waiting for suggestions");
    let finished = tokio::time::timeout(SUGGESTION_WAIT, async {
        status.wait_for(|s| !matches!(s, LookupStatus::Idle)).await.map(|s| s.clone())
    })
    .await;

    match finished {
        Ok(Ok(LookupStatus::Failed(err))) => bail!("{err}"),
        Ok(Ok(_)) => {}
        Ok(Err(_)) => bail!("Suggestion lookup ended unexpectedly"),
        Err(_) => bail!("Timed out waiting for suggestions"),
    }

    let list = autocomplete.current();
    if list.is_empty() {
        println!("No suggestions for \"{}\".", query.trim());
        return Ok(());
    }

    print!("{}", render::suggestions(&list));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use citycast_core::{CitySuggestion, FetchError, ForecastDay, WeatherRecord};

    #[derive(Debug)]
    struct RejectingSearch;

    #[async_trait]
    impl WeatherProvider for RejectingSearch {
        async fn current(&self, city: &str) -> Result<WeatherRecord, FetchError> {
            Err(FetchError::NotFound { city: city.to_string() })
        }

        async fn forecast(&self, _city: &str) -> Result<Vec<ForecastDay>, FetchError> {
            Ok(Vec::new())
        }

        async fn find(&self, _query: &str) -> Result<Vec<CitySuggestion>, FetchError> {
            Err(FetchError::Provider { status: 401, detail: "Invalid API key".into() })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_suggestion_lookup_returns_without_waiting() {
        let start = tokio::time::Instant::now();

        let err = suggest(Arc::new(RejectingSearch), "Berlin").await.unwrap_err();

        let expected = FetchError::Provider { status: 401, detail: "Invalid API key".into() };
        assert_eq!(err.to_string(), expected.to_string());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn suggest_rejects_short_query() {
        assert!(suggest(Arc::new(RejectingSearch), "B").await.is_err());
    }

    #[test]
    fn parses_show_with_flags() {
        let cli = Cli::try_parse_from(["citycast", "show", "London", "São Paulo", "--forecast"])
            .unwrap();
        match cli.command {
            Command::Show { cities, forecast, watch } => {
                assert_eq!(cities, vec!["London".to_string(), "São Paulo".to_string()]);
                assert!(forecast);
                assert_eq!(watch, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn show_requires_a_city() {
        assert!(Cli::try_parse_from(["citycast", "show"]).is_err());
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["citycast", "serve"]).unwrap();
        match cli.command {
            Command::Serve { host, port } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 3000);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
