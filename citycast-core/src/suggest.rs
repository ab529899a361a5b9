//! Debounced autocomplete on top of the provider's search endpoint.
//!
//! Results are not cached: each quiet period triggers at most one lookup,
//! which keeps request volume bounded without a second cache.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;

use crate::{
    debounce::Debouncer, error::FetchError, model::CitySuggestion, provider::WeatherProvider,
    validate::is_suggestible,
};

/// Outcome of the most recent lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LookupStatus {
    /// No lookup has finished since the last input.
    #[default]
    Idle,
    Done,
    Failed(FetchError),
}

#[derive(Debug)]
pub struct Autocomplete {
    provider: Arc<dyn WeatherProvider>,
    debouncer: Debouncer,
    suggestions: Arc<watch::Sender<Vec<CitySuggestion>>>,
    status: Arc<watch::Sender<LookupStatus>>,
    /// Bumped on every input; only the newest lookup may publish.
    generation: Arc<AtomicU64>,
}

impl Autocomplete {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self::with_debouncer(provider, Debouncer::default())
    }

    pub fn with_debouncer(provider: Arc<dyn WeatherProvider>, debouncer: Debouncer) -> Self {
        let (suggestions, _) = watch::channel(Vec::new());
        let (status, _) = watch::channel(LookupStatus::Idle);

        Self {
            provider,
            debouncer,
            suggestions: Arc::new(suggestions),
            status: Arc::new(status),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<CitySuggestion>> {
        self.suggestions.subscribe()
    }

    pub fn status(&self) -> watch::Receiver<LookupStatus> {
        self.status.subscribe()
    }

    pub fn current(&self) -> Vec<CitySuggestion> {
        self.suggestions.borrow().clone()
    }

    /// Feed the latest contents of the search box.
    ///
    /// Queries shorter than two characters clear the list and cancel any
    /// pending lookup; longer ones schedule a lookup after the debounce window.
    /// A lookup that finishes after newer input is discarded.
    pub fn on_input(&self, text: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !is_suggestible(text) {
            self.reset();
            return;
        }

        let query = text.trim().to_string();
        let provider = Arc::clone(&self.provider);
        let sink = Arc::clone(&self.suggestions);
        let status = Arc::clone(&self.status);
        let latest = Arc::clone(&self.generation);

        self.debouncer.schedule(async move {
            let result = provider.find(&query).await;
            let is_current = || latest.load(Ordering::SeqCst) == generation;

            match result {
                Ok(found) => {
                    let count = found.len();
                    // Checked under the channel lock so a concurrent clear wins.
                    let published = sink.send_if_modified(|list| {
                        if !is_current() {
                            return false;
                        }
                        *list = found;
                        true
                    });
                    if !published {
                        tracing::debug!(query = %query, "dropping superseded suggestions");
                        return;
                    }
                    tracing::debug!(query = %query, count, "suggestions updated");
                    status.send_if_modified(|s| is_current() && set(s, LookupStatus::Done));
                }
                Err(err) => {
                    tracing::warn!(query = %query, error = ?err, "suggestion lookup failed");
                    status.send_if_modified(|s| {
                        is_current() && set(s, LookupStatus::Failed(err))
                    });
                }
            }
        });
    }

    /// Picking a suggestion ends the session: pending lookups are dropped and
    /// the list is cleared.
    pub fn select(&self, suggestion: &CitySuggestion) -> String {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.reset();
        suggestion.name.clone()
    }

    fn reset(&self) {
        self.debouncer.cancel();
        self.suggestions.send_if_modified(|list| {
            let changed = !list.is_empty();
            list.clear();
            changed
        });
        self.status.send_if_modified(|s| {
            let changed = *s != LookupStatus::Idle;
            *s = LookupStatus::Idle;
            changed
        });
    }
}

fn set(slot: &mut LookupStatus, value: LookupStatus) -> bool {
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForecastDay, WeatherRecord};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct SearchStub {
        queries: Mutex<Vec<String>>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl WeatherProvider for SearchStub {
        async fn current(&self, city: &str) -> Result<WeatherRecord, FetchError> {
            Err(FetchError::NotFound { city: city.to_string() })
        }

        async fn forecast(&self, _city: &str) -> Result<Vec<ForecastDay>, FetchError> {
            Ok(Vec::new())
        }

        async fn find(&self, query: &str) -> Result<Vec<CitySuggestion>, FetchError> {
            self.queries.lock().push(query.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(FetchError::Network { detail: "offline".into() });
            }
            Ok(vec![CitySuggestion {
                name: format!("{query}ville"),
                country: "US".into(),
                state: None,
            }])
        }
    }

    fn autocomplete(stub: &Arc<SearchStub>) -> Autocomplete {
        Autocomplete::new(Arc::clone(stub) as Arc<dyn WeatherProvider>)
    }

    #[tokio::test(start_paused = true)]
    async fn typing_burst_triggers_one_lookup() {
        let stub = Arc::new(SearchStub::default());
        let ac = autocomplete(&stub);

        for text in ["Lo", "Lon", "Lond", "London "] {
            ac.on_input(text);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(*stub.queries.lock(), vec!["London".to_string()]);
        assert_eq!(ac.current()[0].name, "Londonville");
    }

    #[tokio::test(start_paused = true)]
    async fn short_queries_never_hit_the_network() {
        let stub = Arc::new(SearchStub::default());
        let ac = autocomplete(&stub);

        ac.on_input("L");
        ac.on_input("  L  ");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(stub.queries.lock().is_empty());
        assert!(ac.current().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shrinking_below_gate_cancels_and_clears() {
        let stub = Arc::new(SearchStub::default());
        let ac = autocomplete(&stub);

        ac.on_input("Pa");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(ac.current().len(), 1);

        ac.on_input("Par");
        ac.on_input("P");
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(*stub.queries.lock(), vec!["Pa".to_string()]);
        assert!(ac.current().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_errors_keep_previous_list() {
        let stub = Arc::new(SearchStub { fail: true, ..Default::default() });
        let ac = autocomplete(&stub);
        ac.suggestions.send_replace(vec![CitySuggestion {
            name: "Paris".into(),
            country: "FR".into(),
            state: None,
        }]);

        ac.on_input("Pari");
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(stub.queries.lock().len(), 1);
        assert_eq!(ac.current()[0].name, "Paris");
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_updates() {
        let stub = Arc::new(SearchStub::default());
        let ac = autocomplete(&stub);
        let mut rx = ac.subscribe();

        ac.on_input("Tok");
        rx.changed().await.unwrap();

        assert_eq!(rx.borrow().len(), 1);
        assert_eq!(rx.borrow()[0].name, "Tokville");
    }

    #[tokio::test(start_paused = true)]
    async fn select_clears_list_and_returns_name() {
        let stub = Arc::new(SearchStub::default());
        let ac = autocomplete(&stub);

        ac.on_input("Tok");
        tokio::time::sleep(Duration::from_millis(400)).await;
        let picked = ac.current()[0].clone();

        assert_eq!(ac.select(&picked), "Tokville");
        assert!(ac.current().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_finishing_after_input_shrinks_is_discarded() {
        let stub = Arc::new(SearchStub { delay: Some(Duration::from_secs(2)), ..Default::default() });
        let ac = autocomplete(&stub);

        ac.on_input("Pa");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(stub.queries.lock().len(), 1);

        ac.on_input("P");
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert!(ac.current().is_empty());
        assert_eq!(*ac.status().borrow(), LookupStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn older_lookup_cannot_overwrite_newer_one() {
        let stub = Arc::new(SearchStub { delay: Some(Duration::from_secs(2)), ..Default::default() });
        let ac = autocomplete(&stub);

        ac.on_input("Par");
        tokio::time::sleep(Duration::from_millis(400)).await;
        ac.on_input("Paris");
        // "Par" resolves at 2.3s, "Paris" at 2.7s.
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert!(ac.current().is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*stub.queries.lock(), vec!["Par".to_string(), "Paris".to_string()]);
        assert_eq!(ac.current()[0].name, "Parisville");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_lookup_is_reported_on_status() {
        let stub = Arc::new(SearchStub { fail: true, ..Default::default() });
        let ac = autocomplete(&stub);
        let mut status = ac.status();

        ac.on_input("Oslo");
        let seen = status
            .wait_for(|s| *s != LookupStatus::Idle)
            .await
            .unwrap()
            .clone();

        assert_eq!(seen, LookupStatus::Failed(FetchError::Network { detail: "offline".into() }));
        assert!(ac.current().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn successful_lookup_marks_status_done() {
        let stub = Arc::new(SearchStub::default());
        let ac = autocomplete(&stub);

        ac.on_input("Rome");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*ac.status().borrow(), LookupStatus::Done);

        ac.on_input("R");
        assert_eq!(*ac.status().borrow(), LookupStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_debounce_window_is_honoured() {
        let stub = Arc::new(SearchStub::default());
        let ac = Autocomplete::with_debouncer(
            Arc::clone(&stub) as Arc<dyn WeatherProvider>,
            Debouncer::new(Duration::from_millis(50)),
        );

        ac.on_input("Kyiv");
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(stub.queries.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*stub.queries.lock(), vec!["Kyiv".to_string()]);
    }
}
