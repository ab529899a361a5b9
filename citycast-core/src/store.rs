//! Cache-first fetching of current weather with a published tri-state.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use tokio::sync::{OnceCell, watch};

use crate::{
    error::FetchError,
    model::{CityKey, ForecastDay, WeatherRecord},
    provider::WeatherProvider,
};

type SharedResult = Result<Arc<WeatherRecord>, FetchError>;

/// What the view currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Pending {
        city: String,
    },
    Success(Arc<WeatherRecord>),
    Failure {
        city: String,
        reason: String,
    },
}

impl FetchState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FetchState::Pending { .. })
    }

    pub fn weather(&self) -> Option<&Arc<WeatherRecord>> {
        match self {
            FetchState::Success(record) => Some(record),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failure { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Owns the per-city cache and the published [`FetchState`].
///
/// Entries are never evicted or expired, so the cache grows with every
/// distinct city looked up during the process lifetime.
#[derive(Debug)]
pub struct WeatherStore {
    provider: Arc<dyn WeatherProvider>,
    cache: Mutex<HashMap<CityKey, Arc<WeatherRecord>>>,
    in_flight: Mutex<HashMap<CityKey, Arc<OnceCell<SharedResult>>>>,
    state: watch::Sender<FetchState>,
    /// Ticket of the most recently started request.
    latest: AtomicU64,
}

impl WeatherStore {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (state, _) = watch::channel(FetchState::Idle);

        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            state,
            latest: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    pub fn cached(&self, city: &str) -> Option<Arc<WeatherRecord>> {
        self.cache.lock().get(&CityKey::new(city)).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Cached record if present, otherwise one provider call.
    pub async fn fetch(&self, city: &str) -> SharedResult {
        let key = CityKey::new(city);
        let ticket = self.next_ticket();

        let hit = self.cache.lock().get(&key).cloned();
        if let Some(record) = hit {
            tracing::debug!(city = %key, "weather cache hit");
            self.publish(ticket, FetchState::Success(Arc::clone(&record)));
            return Ok(record);
        }

        tracing::debug!(city = %key, "weather cache miss");
        self.load(key, ticket).await
    }

    /// Always asks the provider. A failure leaves any cached entry untouched.
    pub async fn refresh(&self, city: &str) -> SharedResult {
        let key = CityKey::new(city);
        let ticket = self.next_ticket();
        self.load(key, ticket).await
    }

    /// Daily forecast, straight from the provider.
    pub async fn forecast(&self, city: &str) -> Result<Vec<ForecastDay>, FetchError> {
        let key = CityKey::new(city);
        self.provider.forecast(key.as_str()).await.inspect_err(|err| {
            tracing::warn!(city = %key, error = ?err, "forecast fetch failed");
        })
    }

    async fn load(&self, key: CityKey, ticket: u64) -> SharedResult {
        self.publish(ticket, FetchState::Pending { city: key.to_string() });

        let result = self.coalesced(&key).await;

        match &result {
            Ok(record) => self.publish(ticket, FetchState::Success(Arc::clone(record))),
            Err(err) => {
                tracing::warn!(city = %key, error = ?err, "weather fetch failed");
                self.publish(
                    ticket,
                    FetchState::Failure { city: key.to_string(), reason: err.reason() },
                );
            }
        }

        result
    }

    /// Concurrent loads of one key share a single provider call.
    ///
    /// A successful record is in the cache before the in-flight cell is
    /// released, so a later `fetch` always finds one or the other.
    async fn coalesced(&self, key: &CityKey) -> SharedResult {
        let cell = Arc::clone(self.in_flight.lock().entry(key.clone()).or_default());

        let result = cell
            .get_or_init(|| async {
                tracing::info!(city = %key, "fetching current weather");
                let result = self.provider.current(key.as_str()).await.map(Arc::new);
                if let Ok(record) = &result {
                    self.cache.lock().insert(key.clone(), Arc::clone(record));
                }
                result
            })
            .await
            .clone();

        let mut in_flight = self.in_flight.lock();
        if in_flight.get(key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            in_flight.remove(key);
        }

        result
    }

    fn next_ticket(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Only the newest request may change what is displayed.
    fn publish(&self, ticket: u64, state: FetchState) {
        if self.latest.load(Ordering::SeqCst) == ticket {
            self.state.send_replace(state);
        } else {
            tracing::debug!(ticket, "dropping superseded fetch state");
        }
    }
}
