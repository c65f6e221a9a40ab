use futures::future::{BoxFuture, FutureExt, Shared};
use pairwatch_sources::SourceError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

type InFlight<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct CacheState<V, E> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    in_flight: Mutex<HashMap<String, InFlight<V, E>>>,
}

/// Keyed response cache with per-entry expiry and request de-duplication.
///
/// Expired entries are evicted lazily on lookup. While a fetch for a key is
/// running, further `cached_fetch` calls for that key await the same future
/// instead of issuing their own request. Failed fetches are never stored.
///
/// Cloning is cheap and clones share state.
pub struct TtlCache<V, E = SourceError> {
    state: Arc<CacheState<V, E>>,
    default_ttl: Duration,
}

impl<V, E> Clone for TtlCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            default_ttl: self.default_ttl,
        }
    }
}

impl<V, E> Default for TtlCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V, E> TtlCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            state: Arc::new(CacheState {
                entries: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Value for `key` if present and not expired. An expired entry is
    /// removed as a side effect.
    pub fn get_cached(&self, key: &str) -> Option<V> {
        let mut entries = self.state.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                trace!("Cache entry '{}' expired", key);
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value`, replacing any previous entry. `ttl` defaults to the
    /// cache-wide TTL.
    pub fn set_cache(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let expires_at = Instant::now() + ttl.unwrap_or(self.default_ttl);
        self.state
            .entries
            .lock()
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Return the cached value for `key`, or run `fetch` and cache its
    /// success. Concurrent callers for the same key share one fetch and all
    /// receive its result, error included.
    ///
    /// The fetch keeps running if every caller is dropped; the next caller for
    /// the key picks it up where it left off.
    pub async fn cached_fetch<F, Fut>(&self, key: &str, ttl: Option<Duration>, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        if let Some(value) = self.get_cached(key) {
            trace!("Cache hit '{}'", key);
            return Ok(value);
        }

        if let Some(pending) = self.pending(key) {
            trace!("Joining in-flight fetch '{}'", key);
            return pending.await;
        }

        // Build the future outside the lock: `fetch` is caller code.
        let candidate = Self::tracked(
            Arc::downgrade(&self.state),
            key.to_string(),
            ttl.unwrap_or(self.default_ttl),
            fetch(),
        );

        let shared = {
            let mut in_flight = self.state.in_flight.lock();
            match in_flight.get(key) {
                // Lost a race with another caller; theirs wins and ours is dropped unpolled.
                Some(existing) => existing.clone(),
                None => {
                    if let Some(value) = self.get_cached(key) {
                        return Ok(value);
                    }
                    trace!("Cache miss '{}', fetching", key);
                    in_flight.insert(key.to_string(), candidate.clone());
                    candidate
                }
            }
        };

        shared.await
    }

    fn pending(&self, key: &str) -> Option<InFlight<V, E>> {
        self.state.in_flight.lock().get(key).cloned()
    }

    fn tracked<Fut>(state: Weak<CacheState<V, E>>, key: String, ttl: Duration, fetch: Fut) -> InFlight<V, E>
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        async move {
            let result = fetch.await;
            if let Some(state) = state.upgrade() {
                if let Ok(value) = &result {
                    state.entries.lock().insert(
                        key.clone(),
                        CacheEntry {
                            value: value.clone(),
                            expires_at: Instant::now() + ttl,
                        },
                    );
                }
                state.in_flight.lock().remove(&key);
            }
            result
        }
        .boxed()
        .shared()
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.state.entries.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.state.entries.lock().clear();
    }

    /// Stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.state.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.lock().len()
    }
}
