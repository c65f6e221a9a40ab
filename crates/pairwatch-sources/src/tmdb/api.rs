use pairwatch_models::{
    CastMember, CatalogSummary, ContentDetails, Credits, ExternalIds, MediaType, ProviderOffer, TmdbId, Video,
    WatchProviders,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, trace};
use crate::error::SourceError;

/// Connection settings shared by every TMDB request.
#[derive(Debug, Clone)]
pub struct TmdbEndpoint {
    pub base_url: String,
    pub api_key: String,
    pub language: String,
    pub region: String,
}

#[derive(Debug, Deserialize)]
struct Paged<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbListItem {
    id: TmdbId,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    popularity: Option<f64>,
    release_date: Option<String>,
    first_air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbDetails {
    id: TmdbId,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    runtime: Option<u32>,
    #[serde(default)]
    episode_run_time: Vec<u32>,
    number_of_seasons: Option<u32>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    vote_average: Option<f64>,
    popularity: Option<f64>,
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbProvider {
    provider_id: u64,
    provider_name: String,
    logo_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbRegionProviders {
    link: Option<String>,
    #[serde(default)]
    flatrate: Vec<TmdbProvider>,
    #[serde(default)]
    rent: Vec<TmdbProvider>,
    #[serde(default)]
    buy: Vec<TmdbProvider>,
}

#[derive(Debug, Deserialize)]
struct TmdbProvidersResponse {
    #[serde(default)]
    results: HashMap<String, TmdbRegionProviders>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideo {
    key: String,
    name: String,
    site: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    official: bool,
}

#[derive(Debug, Deserialize)]
struct TmdbCast {
    name: String,
    character: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbCrew {
    name: String,
    job: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCast>,
    #[serde(default)]
    crew: Vec<TmdbCrew>,
}

#[derive(Debug, Deserialize)]
struct TmdbExternalIds {
    imdb_id: Option<String>,
    tvdb_id: Option<u64>,
}

/// Turn a list item into a summary. `fallback` is used by typed endpoints
/// whose items carry no `media_type`; person results are dropped.
fn to_summary(item: TmdbListItem, fallback: Option<MediaType>) -> Option<CatalogSummary> {
    let media_type = match item.media_type.as_deref() {
        Some("movie") => MediaType::Movie,
        Some("tv") => MediaType::Tv,
        Some(_) => return None,
        None => fallback?,
    };
    let title = item.title.or(item.name)?;
    Some(CatalogSummary {
        tmdb_id: item.id,
        media_type,
        title,
        overview: item.overview.filter(|o| !o.is_empty()),
        poster_path: item.poster_path,
        vote_average: item.vote_average,
        popularity: item.popularity,
        release_date: item.release_date.or(item.first_air_date).filter(|d| !d.is_empty()),
    })
}

fn to_offers(providers: Vec<TmdbProvider>) -> Vec<ProviderOffer> {
    providers
        .into_iter()
        .map(|p| ProviderOffer {
            provider_id: p.provider_id,
            name: p.provider_name,
            logo_path: p.logo_path,
        })
        .collect()
}

async fn get_json<T: DeserializeOwned>(
    client: &Client,
    endpoint: &TmdbEndpoint,
    path: &str,
    extra: &[(&str, String)],
) -> Result<T, SourceError> {
    let url = format!("{}/{}", endpoint.base_url.trim_end_matches('/'), path.trim_start_matches('/'));
    let mut query: Vec<(&str, String)> = vec![
        ("api_key", endpoint.api_key.clone()),
        ("language", endpoint.language.clone()),
    ];
    query.extend(extra.iter().cloned());

    trace!("TMDB GET {}", path);
    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .query(&query)
        .send()
        .await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(SourceError::NotFound(path.to_string()));
    }
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(SourceError::Status {
            service: "tmdb",
            status: status.as_u16(),
            body: error_text,
        });
    }

    Ok(response.json().await?)
}

pub async fn search_multi(
    client: &Client,
    endpoint: &TmdbEndpoint,
    query: &str,
    page: u32,
) -> Result<Vec<CatalogSummary>, SourceError> {
    let paged: Paged<TmdbListItem> = get_json(
        client,
        endpoint,
        "search/multi",
        &[
            ("query", query.to_string()),
            ("page", page.max(1).to_string()),
            ("include_adult", "false".to_string()),
        ],
    )
    .await?;
    let results: Vec<CatalogSummary> = paged.results.into_iter().filter_map(|i| to_summary(i, None)).collect();
    debug!("TMDB search '{}' returned {} movie/tv result(s)", query, results.len());
    Ok(results)
}

pub async fn trending(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media_type: MediaType,
    window: &str,
) -> Result<Vec<CatalogSummary>, SourceError> {
    let path = format!("trending/{}/{}", media_type.as_str(), window);
    let paged: Paged<TmdbListItem> = get_json(client, endpoint, &path, &[]).await?;
    Ok(paged
        .results
        .into_iter()
        .filter_map(|i| to_summary(i, Some(media_type)))
        .collect())
}

pub async fn discover(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media_type: MediaType,
    params: &[(&str, String)],
) -> Result<Vec<CatalogSummary>, SourceError> {
    let path = format!("discover/{}", media_type.as_str());
    let mut extra = params.to_vec();
    extra.push(("watch_region", endpoint.region.clone()));
    let paged: Paged<TmdbListItem> = get_json(client, endpoint, &path, &extra).await?;
    Ok(paged
        .results
        .into_iter()
        .filter_map(|i| to_summary(i, Some(media_type)))
        .collect())
}

pub async fn details(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media_type: MediaType,
    tmdb_id: TmdbId,
) -> Result<ContentDetails, SourceError> {
    let path = format!("{}/{}", media_type.as_str(), tmdb_id);
    let raw: TmdbDetails = get_json(client, endpoint, &path, &[]).await?;
    let title = raw
        .title
        .or(raw.name)
        .ok_or_else(|| SourceError::Decode(format!("{} has no title", path)))?;
    Ok(ContentDetails {
        tmdb_id: raw.id,
        media_type,
        title,
        overview: raw.overview.filter(|o| !o.is_empty()),
        poster_path: raw.poster_path,
        backdrop_path: raw.backdrop_path,
        release_date: raw.release_date.or(raw.first_air_date).filter(|d| !d.is_empty()),
        runtime_minutes: raw.runtime.or_else(|| raw.episode_run_time.first().copied()),
        number_of_seasons: raw.number_of_seasons,
        genres: raw.genres.into_iter().map(|g| g.name).collect(),
        vote_average: raw.vote_average,
        popularity: raw.popularity,
        imdb_id: raw.imdb_id.filter(|id| !id.is_empty()),
    })
}

pub async fn watch_providers(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media_type: MediaType,
    tmdb_id: TmdbId,
) -> Result<Option<WatchProviders>, SourceError> {
    let path = format!("{}/{}/watch/providers", media_type.as_str(), tmdb_id);
    let mut raw: TmdbProvidersResponse = get_json(client, endpoint, &path, &[]).await?;
    Ok(raw.results.remove(&endpoint.region).map(|region| WatchProviders {
        region: endpoint.region.clone(),
        link: region.link,
        flatrate: to_offers(region.flatrate),
        rent: to_offers(region.rent),
        buy: to_offers(region.buy),
    }))
}

pub async fn videos(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media_type: MediaType,
    tmdb_id: TmdbId,
) -> Result<Vec<Video>, SourceError> {
    let path = format!("{}/{}/videos", media_type.as_str(), tmdb_id);
    let paged: Paged<TmdbVideo> = get_json(client, endpoint, &path, &[]).await?;
    Ok(paged
        .results
        .into_iter()
        .map(|v| Video {
            key: v.key,
            name: v.name,
            site: v.site,
            kind: v.kind,
            official: v.official,
        })
        .collect())
}

pub async fn credits(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media_type: MediaType,
    tmdb_id: TmdbId,
) -> Result<Credits, SourceError> {
    let path = format!("{}/{}/credits", media_type.as_str(), tmdb_id);
    let raw: TmdbCredits = get_json(client, endpoint, &path, &[]).await?;
    Ok(Credits {
        cast: raw
            .cast
            .into_iter()
            .map(|c| CastMember {
                name: c.name,
                character: c.character.filter(|c| !c.is_empty()),
                profile_path: c.profile_path,
            })
            .collect(),
        directors: raw
            .crew
            .into_iter()
            .filter(|c| c.job.as_deref() == Some("Director"))
            .map(|c| c.name)
            .collect(),
    })
}

pub async fn external_ids(
    client: &Client,
    endpoint: &TmdbEndpoint,
    media_type: MediaType,
    tmdb_id: TmdbId,
) -> Result<ExternalIds, SourceError> {
    let path = format!("{}/{}/external_ids", media_type.as_str(), tmdb_id);
    let raw: TmdbExternalIds = get_json(client, endpoint, &path, &[]).await?;
    Ok(ExternalIds {
        imdb_id: raw.imdb_id.filter(|id| !id.is_empty()),
        tvdb_id: raw.tvdb_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_multi_search_items_drop_people() {
        let paged: Paged<TmdbListItem> = serde_json::from_value(json!({
            "page": 1,
            "results": [
                {"id": 1399, "media_type": "tv", "name": "Game of Thrones", "first_air_date": "2011-04-17"},
                {"id": 287, "media_type": "person", "name": "Brad Pitt"},
                {"id": 603, "media_type": "movie", "title": "The Matrix", "release_date": "1999-03-30", "overview": ""}
            ]
        }))
        .unwrap();
        let summaries: Vec<CatalogSummary> = paged.results.into_iter().filter_map(|i| to_summary(i, None)).collect();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].media_type, MediaType::Tv);
        assert_eq!(summaries[0].title, "Game of Thrones");
        assert_eq!(summaries[0].release_date.as_deref(), Some("2011-04-17"));
        assert_eq!(summaries[1].tmdb_id, 603);
        assert!(summaries[1].overview.is_none());
    }

    #[test]
    fn test_typed_endpoints_use_fallback_media_type() {
        let item: TmdbListItem = serde_json::from_value(json!({"id": 76479, "name": "The Boys"})).unwrap();
        let summary = to_summary(item, Some(MediaType::Tv)).unwrap();
        assert_eq!(summary.media_type, MediaType::Tv);

        let untyped: TmdbListItem = serde_json::from_value(json!({"id": 1, "title": "x"})).unwrap();
        assert!(to_summary(untyped, None).is_none());
    }
}
