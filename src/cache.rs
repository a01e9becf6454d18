//! Query cache service.
//!
//! Results are stored per [`QueryKey`] (operation identity plus parameters).
//! The cache never refreshes itself: entries change only through an explicit
//! fetch, `set`, `invalidate` or `clear`. Concurrent cache-first fetches of
//! the same key share a single underlying request; a refetch always goes to
//! the network.
//!
//! One cache is created at application start and handed to every query;
//! `clear` tears it down (shutdown, test teardown).

use crate::api::ApiError;
use crate::models::SearchParams;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type CachedValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, ApiError>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Languages,
    Phrase(String),
    Phrases(SearchParams),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Languages => write!(f, "[\"languages\"]"),
            Self::Phrase(id) => write!(f, "[\"phrase\", \"{}\"]", id),
            Self::Phrases(params) => write!(
                f,
                "[\"phrases\", {}]",
                serde_json::to_string(params).unwrap_or_default()
            ),
        }
    }
}

/// Whether a fetch may be answered from a stored entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Use the stored entry when present, otherwise fetch
    CacheFirst,
    /// Always start a new request. It replaces any request in flight for the
    /// key, so only the newest result is stored.
    Refetch,
}

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, CachedValue>,
    in_flight: HashMap<QueryKey, InFlight>,
    next_fetch_id: u64,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub fetches: usize,
    pub entries: usize,
}

#[derive(Default)]
pub struct QueryCache {
    state: Mutex<CacheState>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    fetches: AtomicUsize,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stored value for `key`, if present and of type `T`
    pub fn get<T: Any + Send + Sync>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let value = self.lock().entries.get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    pub fn set<T: Any + Send + Sync>(&self, key: QueryKey, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.lock().entries.insert(key, value.clone());
        value
    }

    /// Drop the stored entry for `key`; returns whether one existed
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    /// Drop every entry and forget in-flight fetches.
    ///
    /// Fetches still running complete for their waiters but are not stored.
    pub fn clear(&self) {
        let mut state = self.lock();
        debug!(
            "Clearing query cache ({} entries, {} in flight)",
            state.entries.len(),
            state.in_flight.len()
        );
        state.entries.clear();
        state.in_flight.clear();
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.lock().in_flight.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Resolve `key`. A [`FetchMode::CacheFirst`] fetch is answered by the
    /// stored entry or an in-flight request when either exists; otherwise
    /// (and always for [`FetchMode::Refetch`]) `fetcher` runs.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        mode: FetchMode,
        fetcher: F,
    ) -> Result<Arc<T>, ApiError>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (fetch_id, fetch) = {
            let mut state = self.lock();

            if mode == FetchMode::CacheFirst {
                if let Some(value) = state.entries.get(&key).cloned() {
                    if let Ok(value) = value.downcast::<T>() {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        return Ok(value);
                    }
                }
            }
            self.misses.fetch_add(1, Ordering::Relaxed);

            let joined = match mode {
                FetchMode::CacheFirst => state
                    .in_flight
                    .get(&key)
                    .map(|in_flight| (in_flight.id, in_flight.fetch.clone())),
                FetchMode::Refetch => None,
            };

            match joined {
                Some(joined) => {
                    debug!("Joining in-flight fetch for {}", key);
                    joined
                }
                None => {
                    debug!("Fetching {}", key);
                    self.fetches.fetch_add(1, Ordering::Relaxed);
                    state.next_fetch_id += 1;
                    let id = state.next_fetch_id;
                    let pending = fetcher();
                    let fetch = async move { pending.await.map(|value| Arc::new(value) as CachedValue) }
                        .boxed()
                        .shared();
                    state.in_flight.insert(
                        key.clone(),
                        InFlight {
                            id,
                            fetch: fetch.clone(),
                        },
                    );
                    (id, fetch)
                }
            }
        };

        let result = fetch.await;

        {
            let mut state = self.lock();
            let owns_fetch = state
                .in_flight
                .get(&key)
                .map_or(false, |in_flight| in_flight.id == fetch_id);
            if owns_fetch {
                state.in_flight.remove(&key);
                if let Ok(value) = &result {
                    state.entries.insert(key.clone(), value.clone());
                }
            }
        }

        result?.downcast::<T>().map_err(|_| ApiError::Decode {
            path: key.to_string(),
            message: "cached value has an unexpected type".to_string(),
        })
    }
}
