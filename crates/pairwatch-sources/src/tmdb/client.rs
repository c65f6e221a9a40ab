use async_trait::async_trait;
use pairwatch_config::CatalogConfig;
use pairwatch_models::{CatalogSummary, ContentDetails, Credits, ExternalIds, MediaType, TmdbId, Video, WatchProviders};
use reqwest::Client;
use std::sync::Arc;
use crate::error::SourceError;
use crate::tmdb::api::{self, TmdbEndpoint};
use crate::traits::{CatalogApi, DiscoverParams, TrendingWindow};

#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    endpoint: TmdbEndpoint,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig, api_key: String) -> Self {
        Self {
            client: Arc::new(Client::new()),
            endpoint: TmdbEndpoint {
                base_url: config.base_url.clone(),
                api_key,
                language: config.language.clone(),
                region: config.region.clone(),
            },
        }
    }

    pub fn region(&self) -> &str {
        &self.endpoint.region
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn search(&self, query: &str, page: u32) -> Result<Vec<CatalogSummary>, SourceError> {
        api::search_multi(&self.client, &self.endpoint, query, page).await
    }

    async fn trending(&self, media_type: MediaType, window: TrendingWindow) -> Result<Vec<CatalogSummary>, SourceError> {
        api::trending(&self.client, &self.endpoint, media_type, window.as_str()).await
    }

    async fn discover(&self, media_type: MediaType, params: &DiscoverParams) -> Result<Vec<CatalogSummary>, SourceError> {
        api::discover(&self.client, &self.endpoint, media_type, &params.query_pairs()).await
    }

    async fn details(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<ContentDetails, SourceError> {
        api::details(&self.client, &self.endpoint, media_type, tmdb_id).await
    }

    async fn watch_providers(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<Option<WatchProviders>, SourceError> {
        api::watch_providers(&self.client, &self.endpoint, media_type, tmdb_id).await
    }

    async fn videos(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<Vec<Video>, SourceError> {
        api::videos(&self.client, &self.endpoint, media_type, tmdb_id).await
    }

    async fn credits(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<Credits, SourceError> {
        api::credits(&self.client, &self.endpoint, media_type, tmdb_id).await
    }

    async fn external_ids(&self, media_type: MediaType, tmdb_id: TmdbId) -> Result<ExternalIds, SourceError> {
        api::external_ids(&self.client, &self.endpoint, media_type, tmdb_id).await
    }
}
