//! In-process fakes shared by the unit tests.

use async_trait::async_trait;
use pairwatch_models::{CatalogSummary, ContentDetails, Credits, ExternalIds, MediaType, TmdbId, Video, WatchProviders};
use pairwatch_sources::{
    CatalogApi, DiscoverParams, Document, DocumentStore, FieldFilter, MemoryStore, SourceError, StoredDocument,
    TrendingWindow,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn details(tmdb_id: TmdbId, media_type: MediaType, title: &str) -> ContentDetails {
    ContentDetails {
        tmdb_id,
        media_type,
        title: title.to_string(),
        overview: None,
        poster_path: Some(format!("/{}.jpg", tmdb_id)),
        backdrop_path: None,
        release_date: Some("2021-09-15".to_string()),
        runtime_minutes: None,
        number_of_seasons: None,
        genres: Vec::new(),
        vote_average: Some(7.5),
        popularity: Some(100.0),
        imdb_id: None,
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    titles: Vec<ContentDetails>,
    search_delays: HashMap<String, Duration>,
    failing_details: HashSet<(MediaType, TmdbId)>,
    detail_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movie(mut self, tmdb_id: TmdbId, title: &str) -> Self {
        self.titles.push(details(tmdb_id, MediaType::Movie, title));
        self
    }

    pub fn with_tv(mut self, tmdb_id: TmdbId, title: &str) -> Self {
        self.titles.push(details(tmdb_id, MediaType::Tv, title));
        self
    }

    pub fn with_search_delay(mut self, query: &str, delay: Duration) -> Self {
        self.search_delays.insert(query.to_lowercase(), delay);
        self
    }

    /// Detail lookups for this title and type fail with a transport error.
    pub fn with_failing_details(mut self, media_type: MediaType, tmdb_id: TmdbId) -> Self {
        self.failing_details.insert((media_type, tmdb_id));
        self
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn summary(details: &ContentDetails) -> CatalogSummary {
        CatalogSummary {
            tmdb_id: details.tmdb_id,
            media_type: details.media_type,
            title: details.title.clone(),
            overview: None,
            poster_path: details.poster_path.clone(),
            vote_average: details.vote_average,
            popularity: details.popularity,
            release_date: details.release_date.clone(),
        }
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn search(&self, query: &str, _page: u32) -> Result<Vec<CatalogSummary>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let needle = query.trim().to_lowercase();
        if let Some(delay) = self.search_delays.get(&needle) {
            tokio::time::sleep(*delay).await;
        }
        Ok(self
            .titles
            .iter()
            .filter(|d| d.title.to_lowercase().contains(&needle))
            .map(Self::summary)
            .collect())
    }

    async fn trending(&self, media_type: MediaType, _window: TrendingWindow) -> Result<Vec<CatalogSummary>, SourceError> {
        Ok(self
            .titles
            .iter()
            .filter(|d| d.media_type == media_type)
            .map(Self::summary)
            .collect())
    }

    async fn discover(&self, media_type: MediaType, _params: &DiscoverParams) -> Result<Vec<CatalogSummary>, SourceError> {
        self.trending(media_type, TrendingWindow::Week).await
    }

    async fn details(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<ContentDetails, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_details.contains(&(media_type, tmdb_id)) {
            return Err(SourceError::Http("connection reset".to_string()));
        }
        self.titles
            .iter()
            .find(|d| d.tmdb_id == tmdb_id && d.media_type == media_type)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("{} {}", media_type, tmdb_id)))
    }

    async fn watch_providers(&self, _media_type: MediaType, _tmdb_id: TmdbId) -> Result<Option<WatchProviders>, SourceError> {
        Ok(None)
    }

    async fn videos(&self, _media_type: MediaType, _tmdb_id: TmdbId) -> Result<Vec<Video>, SourceError> {
        Ok(Vec::new())
    }

    async fn credits(&self, _media_type: MediaType, _tmdb_id: TmdbId) -> Result<Credits, SourceError> {
        Ok(Credits::default())
    }

    async fn external_ids(&self, _media_type: MediaType, _tmdb_id: TmdbId) -> Result<ExternalIds, SourceError> {
        Ok(ExternalIds::default())
    }
}

/// `MemoryStore` that can be told to fail writes to a collection or queries
/// carrying a given filter, or to answer reads slowly.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    read_delay: Option<Duration>,
    failing_writes: Mutex<HashSet<String>>,
    write_budgets: Mutex<HashMap<String, usize>>,
    failing_queries: Mutex<Vec<FieldFilter>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn fail_writes_to(&self, collection: &str) {
        self.failing_writes.lock().insert(collection.to_string());
    }

    /// Let the next `writes` writes to `collection` through, then fail.
    pub fn allow_writes_to(&self, collection: &str, writes: usize) {
        self.write_budgets.lock().insert(collection.to_string(), writes);
    }

    pub fn fail_queries_with(&self, filter: FieldFilter) {
        self.failing_queries.lock().push(filter);
    }

    fn check_write(&self, collection: &str) -> Result<(), SourceError> {
        let exhausted = match self.write_budgets.lock().get_mut(collection) {
            Some(0) => true,
            Some(left) => {
                *left -= 1;
                false
            }
            None => false,
        };
        if exhausted || self.failing_writes.lock().contains(collection) {
            return Err(SourceError::Store(format!("write to {} rejected", collection)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    fn backend_name(&self) -> &str {
        "flaky"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, SourceError> {
        let doc = self.inner.get(collection, id).await;
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        doc
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), SourceError> {
        self.check_write(collection)?;
        self.inner.set(collection, id, doc).await
    }

    async fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), SourceError> {
        self.check_write(collection)?;
        self.inner.merge(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), SourceError> {
        self.check_write(collection)?;
        self.inner.delete(collection, id).await
    }

    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<StoredDocument>, SourceError> {
        let poisoned = self.failing_queries.lock().iter().any(|bad| filters.contains(bad));
        if poisoned {
            return Err(SourceError::Http("query timed out".to_string()));
        }
        self.inner.query(collection, filters).await
    }
}
