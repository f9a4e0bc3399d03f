//! Keyed query cache
//!
//! Each key holds the last fetched (or optimistically written) value, a
//! stale flag and a generation counter bumped on every write. In-flight
//! fetches register a [`CancellationToken`]; a cancelled fetch never writes.
//! Invalidation is broadcast so observers know to refetch.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Logical resource collection, e.g. `"sources"` or `"feeds:unread"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Change notifications for subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// The key's data is stale; observers should refetch.
    Invalidated(CacheKey),
    /// The key received a new value.
    Updated(CacheKey),
}

/// Result of [`QueryCache::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    /// The fetch completed and its value was written.
    Fetched(T),
    /// The fetch was cancelled; the cache was left untouched.
    Cancelled,
}

#[derive(Debug)]
struct Entry<T> {
    value: Option<T>,
    stale: bool,
    generation: u64,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self { value: None, stale: true, generation: 0 }
    }
}

#[derive(Debug)]
struct State<T> {
    entries: HashMap<CacheKey, Entry<T>>,
    in_flight: HashMap<CacheKey, Vec<(u64, CancellationToken)>>,
    next_fetch_id: u64,
}

#[derive(Debug)]
pub struct QueryCache<T> {
    state: Mutex<State<T>>,
    events: broadcast::Sender<CacheEvent>,
}

impl<T: Clone> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> QueryCache<T> {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = State { entries: HashMap::new(), in_flight: HashMap::new(), next_fetch_id: 0 };
        Self { state: Mutex::new(state), events }
    }

    pub fn get(&self, key: &CacheKey) -> Option<T> {
        self.state.lock().entries.get(key).and_then(|entry| entry.value.clone())
    }

    /// Write a fresh value.
    pub fn set(&self, key: &CacheKey, value: T) {
        self.write(key, Some(value));
    }

    /// Write `value` verbatim, including `None` for "nothing cached".
    pub fn restore(&self, key: &CacheKey, value: Option<T>) {
        self.write(key, value);
    }

    /// Apply `update` to the cached value under a single lock acquisition.
    ///
    /// Returns the previous value. Keys without a value are left alone.
    pub fn update(&self, key: &CacheKey, update: impl FnOnce(&T) -> T) -> Option<T> {
        let previous = {
            let mut state = self.state.lock();
            let entry = state.entries.get_mut(key)?;
            let previous = entry.value.take()?;
            entry.value = Some(update(&previous));
            entry.generation += 1;
            previous
        };
        self.notify(CacheEvent::Updated(key.clone()));
        Some(previous)
    }

    /// Run `fetcher` and cache its value unless the fetch is cancelled
    /// first through [`cancel_queries`](Self::cancel_queries).
    ///
    /// # Errors
    ///
    /// The fetcher's error; the cache is not touched.
    pub async fn fetch<F, E>(&self, key: &CacheKey, fetcher: F) -> Result<FetchOutcome<T>, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let token = CancellationToken::new();
        let fetch_id = {
            let mut state = self.state.lock();
            state.next_fetch_id += 1;
            let fetch_id = state.next_fetch_id;
            state.in_flight.entry(key.clone()).or_default().push((fetch_id, token.clone()));
            fetch_id
        };

        let result = tokio::select! {
            biased;
            () = token.cancelled() => None,
            result = fetcher => Some(result),
        };

        let outcome = {
            let mut state = self.state.lock();
            if let Some(tokens) = state.in_flight.get_mut(key) {
                tokens.retain(|(id, _)| *id != fetch_id);
                if tokens.is_empty() {
                    state.in_flight.remove(key);
                }
            }
            match result {
                // Checked under the lock so a racing cancel always wins
                Some(Ok(value)) if !token.is_cancelled() => {
                    let entry = state.entries.entry(key.clone()).or_default();
                    entry.value = Some(value.clone());
                    entry.stale = false;
                    entry.generation += 1;
                    Ok(FetchOutcome::Fetched(value))
                }
                Some(Err(err)) => Err(err),
                _ => Ok(FetchOutcome::Cancelled),
            }
        };

        match &outcome {
            Ok(FetchOutcome::Fetched(_)) => self.notify(CacheEvent::Updated(key.clone())),
            Ok(FetchOutcome::Cancelled) => debug!(%key, "fetch cancelled, result discarded"),
            Err(_) => {}
        }
        outcome
    }

    /// Cancel every in-flight fetch for `key`. Returns how many were
    /// cancelled.
    pub fn cancel_queries(&self, key: &CacheKey) -> usize {
        let tokens = self.state.lock().in_flight.remove(key).unwrap_or_default();
        for (_, token) in &tokens {
            token.cancel();
        }
        if !tokens.is_empty() {
            debug!(%key, cancelled = tokens.len(), "cancelled in-flight fetches");
        }
        tokens.len()
    }

    /// Mark `key` stale and tell subscribers to refetch.
    pub fn invalidate(&self, key: &CacheKey) {
        {
            let mut state = self.state.lock();
            let entry = state.entries.entry(key.clone()).or_default();
            entry.stale = true;
            entry.generation += 1;
        }
        debug!(%key, "cache key invalidated");
        self.notify(CacheEvent::Invalidated(key.clone()));
    }

    /// Keys never fetched count as stale.
    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.state.lock().entries.get(key).map_or(true, |entry| entry.stale)
    }

    /// Number of writes and invalidations seen by `key`.
    pub fn generation(&self, key: &CacheKey) -> u64 {
        self.state.lock().entries.get(key).map_or(0, |entry| entry.generation)
    }

    pub fn in_flight(&self, key: &CacheKey) -> usize {
        self.state.lock().in_flight.get(key).map_or(0, Vec::len)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn write(&self, key: &CacheKey, value: Option<T>) {
        {
            let mut state = self.state.lock();
            let entry = state.entries.entry(key.clone()).or_default();
            entry.value = value;
            entry.stale = false;
            entry.generation += 1;
        }
        self.notify(CacheEvent::Updated(key.clone()));
    }

    fn notify(&self, event: CacheEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
