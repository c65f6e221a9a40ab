use async_trait::async_trait;
use pairwatch_models::{
    AggregatedRatings, CatalogSummary, ContentDetails, Credits, ExternalIds, MediaType, TmdbId, Video,
    WatchProviders,
};
use pairwatch_sources::{CatalogApi, DiscoverParams, RatingsApi, RatingsQuery, SourceError, TrendingWindow};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use crate::cache::TtlCache;

/// Catalog and ratings lookups behind per-endpoint response caches.
///
/// Implements `CatalogApi` itself so callers can take either the raw client or
/// this wrapper.
#[derive(Clone)]
pub struct CachedCatalog {
    catalog: Arc<dyn CatalogApi>,
    ratings: Option<Arc<dyn RatingsApi>>,
    lists: TtlCache<Vec<CatalogSummary>>,
    details: TtlCache<ContentDetails>,
    providers: TtlCache<Option<WatchProviders>>,
    videos: TtlCache<Vec<Video>>,
    credits: TtlCache<Credits>,
    external_ids: TtlCache<ExternalIds>,
    ratings_cache: TtlCache<Option<AggregatedRatings>>,
}

impl CachedCatalog {
    pub fn new(catalog: Arc<dyn CatalogApi>, ratings: Option<Arc<dyn RatingsApi>>, ttl: Duration) -> Self {
        Self {
            catalog,
            ratings,
            lists: TtlCache::new(ttl),
            details: TtlCache::new(ttl),
            providers: TtlCache::new(ttl),
            videos: TtlCache::new(ttl),
            credits: TtlCache::new(ttl),
            external_ids: TtlCache::new(ttl),
            ratings_cache: TtlCache::new(ttl),
        }
    }

    pub fn has_ratings(&self) -> bool {
        self.ratings.is_some()
    }

    /// Aggregated ratings, `Ok(None)` when no ratings service is configured or
    /// the service has no entry.
    pub async fn ratings(&self, query: &RatingsQuery) -> Result<Option<AggregatedRatings>, SourceError> {
        let Some(ratings) = self.ratings.clone() else {
            return Ok(None);
        };
        let owned = query.clone();
        self.ratings_cache
            .cached_fetch(&format!("ratings:{}", query.cache_key()), None, move || async move {
                ratings.lookup(&owned).await
            })
            .await
    }

    /// Ratings for a detailed title: by IMDb id when known, falling back to
    /// a title/year lookup.
    pub async fn ratings_for(&self, details: &ContentDetails) -> Result<Option<AggregatedRatings>, SourceError> {
        let imdb_id = match &details.imdb_id {
            Some(id) => Some(id.clone()),
            None => self
                .external_ids(details.media_type, details.tmdb_id)
                .await
                .map(|ids| ids.imdb_id)
                .unwrap_or_else(|e| {
                    debug!("No external ids for {} {}: {}", details.media_type, details.tmdb_id, e);
                    None
                }),
        };

        if let Some(id) = imdb_id {
            if let Some(found) = self.ratings(&RatingsQuery::ImdbId(id)).await? {
                return Ok(Some(found));
            }
        }
        let year = details
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok());
        self.ratings(&RatingsQuery::Title {
            title: details.title.clone(),
            year,
        })
        .await
    }

    pub fn clear(&self) {
        self.lists.clear();
        self.details.clear();
        self.providers.clear();
        self.videos.clear();
        self.credits.clear();
        self.external_ids.clear();
        self.ratings_cache.clear();
    }
}

fn keyed(kind: &str, media_type: MediaType, tmdb_id: TmdbId) -> String {
    format!("{}:{}:{}", kind, media_type, tmdb_id)
}

#[async_trait]
impl CatalogApi for CachedCatalog {
    async fn search(&self, query: &str, page: u32) -> Result<Vec<CatalogSummary>, SourceError> {
        let normalized = query.trim().to_lowercase();
        let catalog = Arc::clone(&self.catalog);
        let owned = query.trim().to_string();
        self.lists
            .cached_fetch(&format!("search:{}:{}", normalized, page), None, move || async move {
                catalog.search(&owned, page).await
            })
            .await
    }

    async fn trending(&self, media_type: MediaType, window: TrendingWindow) -> Result<Vec<CatalogSummary>, SourceError> {
        let catalog = Arc::clone(&self.catalog);
        self.lists
            .cached_fetch(
                &format!("trending:{}:{}", media_type, window.as_str()),
                None,
                move || async move { catalog.trending(media_type, window).await },
            )
            .await
    }

    async fn discover(&self, media_type: MediaType, params: &DiscoverParams) -> Result<Vec<CatalogSummary>, SourceError> {
        let pairs: Vec<String> = params
            .query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        let key = format!("discover:{}:{}", media_type, pairs.join("&"));
        let catalog = Arc::clone(&self.catalog);
        let params = params.clone();
        self.lists
            .cached_fetch(&key, None, move || async move { catalog.discover(media_type, &params).await })
            .await
    }

    async fn details(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<ContentDetails, SourceError> {
        let catalog = Arc::clone(&self.catalog);
        self.details
            .cached_fetch(&keyed("details", media_type, tmdb_id), None, move || async move {
                catalog.details(media_type, tmdb_id).await
            })
            .await
    }

    async fn watch_providers(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<Option<WatchProviders>, SourceError> {
        let catalog = Arc::clone(&self.catalog);
        self.providers
            .cached_fetch(&keyed("providers", media_type, tmdb_id), None, move || async move {
                catalog.watch_providers(media_type, tmdb_id).await
            })
            .await
    }

    async fn videos(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<Vec<Video>, SourceError> {
        let catalog = Arc::clone(&self.catalog);
        self.videos
            .cached_fetch(&keyed("videos", media_type, tmdb_id), None, move || async move {
                catalog.videos(media_type, tmdb_id).await
            })
            .await
    }

    async fn credits(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<Credits, SourceError> {
        let catalog = Arc::clone(&self.catalog);
        self.credits
            .cached_fetch(&keyed("credits", media_type, tmdb_id), None, move || async move {
                catalog.credits(media_type, tmdb_id).await
            })
            .await
    }

    async fn external_ids(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<ExternalIds, SourceError> {
        let catalog = Arc::clone(&self.catalog);
        self.external_ids
            .cached_fetch(&keyed("external_ids", media_type, tmdb_id), None, move || async move {
                catalog.external_ids(media_type, tmdb_id).await
            })
            .await
    }
}
