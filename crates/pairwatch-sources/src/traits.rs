use async_trait::async_trait;
use pairwatch_models::{
    AggregatedRatings, CatalogSummary, ContentDetails, Credits, ExternalIds, MediaType, TmdbId, Video,
    WatchProviders,
};
use serde_json::Value;
use crate::error::SourceError;

/// Top-level fields of a stored document.
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

/// Equality filter on a top-level field. Multiple filters are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field) == Some(&self.value)
    }
}

/// Document database boundary.
///
/// All durability is delegated to the implementation; callers get no
/// transactions, only single-document operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend_name(&self) -> &str;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, SourceError>;

    /// Replace the whole document.
    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), SourceError>;

    /// Shallow merge: listed fields are overwritten, others kept. Creates the
    /// document if missing.
    async fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), SourceError>;

    /// Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), SourceError>;

    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<StoredDocument>, SourceError>;

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, SourceError> {
        self.query(collection, &[]).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendingWindow {
    Day,
    Week,
}

impl TrendingWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoverParams {
    pub sort_by: Option<String>,
    pub with_genres: Vec<u32>,
    pub with_watch_providers: Vec<u32>,
    pub page: u32,
}

impl Default for DiscoverParams {
    fn default() -> Self {
        Self {
            sort_by: None,
            with_genres: Vec::new(),
            with_watch_providers: Vec::new(),
            page: 1,
        }
    }
}

impl DiscoverParams {
    /// Stable textual form used in cache keys and query strings.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.max(1).to_string())];
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by", sort_by.clone()));
        }
        if !self.with_genres.is_empty() {
            let genres: Vec<String> = self.with_genres.iter().map(|g| g.to_string()).collect();
            pairs.push(("with_genres", genres.join(",")));
        }
        if !self.with_watch_providers.is_empty() {
            let providers: Vec<String> = self.with_watch_providers.iter().map(|p| p.to_string()).collect();
            pairs.push(("with_watch_providers", providers.join("|")));
        }
        pairs
    }
}

/// Movie/TV catalog boundary (read-only).
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Multi search; results other than movies and TV shows are dropped.
    async fn search(&self, query: &str, page: u32) -> Result<Vec<CatalogSummary>, SourceError>;

    async fn trending(&self, media_type: MediaType, window: TrendingWindow) -> Result<Vec<CatalogSummary>, SourceError>;

    async fn discover(&self, media_type: MediaType, params: &DiscoverParams) -> Result<Vec<CatalogSummary>, SourceError>;

    /// `SourceError::NotFound` when the id does not exist under `media_type`.
    async fn details(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<ContentDetails, SourceError>;

    /// Offers for the configured region, `None` when the title has none there.
    async fn watch_providers(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<Option<WatchProviders>, SourceError>;

    async fn videos(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<Vec<Video>, SourceError>;

    async fn credits(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<Credits, SourceError>;

    async fn external_ids(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<ExternalIds, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RatingsQuery {
    ImdbId(String),
    Title { title: String, year: Option<u32> },
}

impl RatingsQuery {
    pub fn cache_key(&self) -> String {
        match self {
            RatingsQuery::ImdbId(id) => format!("imdb:{}", id),
            RatingsQuery::Title { title, year } => format!(
                "title:{}:{}",
                title.trim().to_lowercase(),
                year.map(|y| y.to_string()).unwrap_or_else(|| "none".to_string())
            ),
        }
    }
}

/// Ratings aggregation boundary.
#[async_trait]
pub trait RatingsApi: Send + Sync {
    /// `Ok(None)` when the aggregator has no entry for the query.
    async fn lookup(&self, query: &RatingsQuery) -> Result<Option<AggregatedRatings>, SourceError>;
}
