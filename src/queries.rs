//! Query hooks: one API operation each, backed by the shared [`QueryCache`].
//!
//! A query re-executes only when asked to (`refetch`) or when its key
//! changes (`switch`). Nothing refetches on its own. A query without a key
//! is inactive: it issues no request and has no data.

use crate::api::{ApiClient, ApiError};
use crate::cache::{FetchMode, QueryCache, QueryKey};
use crate::models::{Language, Phrase, SearchParams};
use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Fetcher<T> = Arc<dyn Fn(&QueryKey) -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

pub struct Query<T> {
    cache: Arc<QueryCache>,
    key: Mutex<Option<QueryKey>>,
    fetcher: Fetcher<T>,
    loading: AtomicUsize,
}

/// Marks a query as loading for as long as it is alive
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<T: Send + Sync + 'static> Query<T> {
    fn new(cache: &Arc<QueryCache>, key: Option<QueryKey>, fetcher: Fetcher<T>) -> Self {
        Self {
            cache: cache.clone(),
            key: Mutex::new(key),
            fetcher,
            loading: AtomicUsize::new(0),
        }
    }

    pub fn key(&self) -> Option<QueryKey> {
        self.key
            .lock()
            .map(|key| key.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn is_enabled(&self) -> bool {
        self.key().is_some()
    }

    /// Change the key without fetching; returns whether it changed
    pub fn set_key(&self, key: Option<QueryKey>) -> bool {
        let mut current = self.key.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current == key {
            return false;
        }
        *current = key;
        true
    }

    /// Cached payload for the current key
    pub fn data(&self) -> Option<Arc<T>> {
        self.key().and_then(|key| self.cache.get::<T>(&key))
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    /// Fetch the current key unless it is already cached
    pub async fn load(&self) -> Result<Option<Arc<T>>, ApiError> {
        self.run(self.key(), FetchMode::CacheFirst).await
    }

    /// Fetch the current key from the network
    pub async fn refetch(&self) -> Result<Option<Arc<T>>, ApiError> {
        self.run(self.key(), FetchMode::Refetch).await
    }

    /// Move to `key` and fetch exactly that key
    pub async fn switch(
        &self,
        key: Option<QueryKey>,
        mode: FetchMode,
    ) -> Result<Option<Arc<T>>, ApiError> {
        self.set_key(key.clone());
        self.run(key, mode).await
    }

    async fn run(
        &self,
        key: Option<QueryKey>,
        mode: FetchMode,
    ) -> Result<Option<Arc<T>>, ApiError> {
        let Some(key) = key else {
            return Ok(None);
        };

        let _loading = LoadingGuard::start(&self.loading);
        let fetcher = self.fetcher.clone();
        let request_key = key.clone();
        self.cache
            .fetch(key, mode, move || fetcher(&request_key))
            .await
            .map(Some)
    }
}

/// Key for the phrase-by-id query; absent or empty ids disable it
pub fn phrase_key(id: Option<&str>) -> Option<QueryKey> {
    id.filter(|id| !id.is_empty())
        .map(|id| QueryKey::Phrase(id.to_string()))
}

fn unexpected_key(key: &QueryKey) -> ApiError {
    ApiError::InvalidRequest(format!("query cannot serve key {}", key))
}

async fn fetch_languages(client: ApiClient, key: QueryKey) -> Result<Vec<Language>, ApiError> {
    match key {
        QueryKey::Languages => Ok(client.get_languages().await?.data.unwrap_or_default()),
        other => Err(unexpected_key(&other)),
    }
}

async fn fetch_phrase(client: ApiClient, key: QueryKey) -> Result<Phrase, ApiError> {
    match key {
        QueryKey::Phrase(id) => client.one(&id).await?.into_data(),
        other => Err(unexpected_key(&other)),
    }
}

async fn fetch_phrases(client: ApiClient, key: QueryKey) -> Result<Vec<Phrase>, ApiError> {
    match key {
        QueryKey::Phrases(params) => Ok(client.search(&params).await?.data.unwrap_or_default()),
        other => Err(unexpected_key(&other)),
    }
}

/// `["languages"]`
pub fn languages(client: &ApiClient, cache: &Arc<QueryCache>) -> Query<Vec<Language>> {
    let client = client.clone();
    Query::new(
        cache,
        Some(QueryKey::Languages),
        Arc::new(move |key: &QueryKey| fetch_languages(client.clone(), key.clone()).boxed()),
    )
}

/// `["phrase", id]`, inactive while `id` is absent
pub fn phrase(client: &ApiClient, cache: &Arc<QueryCache>, id: Option<&str>) -> Query<Phrase> {
    let client = client.clone();
    Query::new(
        cache,
        phrase_key(id),
        Arc::new(move |key: &QueryKey| fetch_phrase(client.clone(), key.clone()).boxed()),
    )
}

/// `["phrases", params]`
pub fn phrases(
    client: &ApiClient,
    cache: &Arc<QueryCache>,
    params: SearchParams,
) -> Query<Vec<Phrase>> {
    let client = client.clone();
    Query::new(
        cache,
        Some(QueryKey::Phrases(params)),
        Arc::new(move |key: &QueryKey| fetch_phrases(client.clone(), key.clone()).boxed()),
    )
}
