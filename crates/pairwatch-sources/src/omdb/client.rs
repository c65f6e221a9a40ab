use async_trait::async_trait;
use pairwatch_config::RatingsConfig;
use pairwatch_models::AggregatedRatings;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, trace};
use crate::error::SourceError;
use crate::traits::{RatingsApi, RatingsQuery};

#[derive(Debug, Deserialize)]
struct OmdbRating {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    imdb_votes: Option<String>,
    #[serde(rename = "Metascore")]
    metascore: Option<String>,
    #[serde(rename = "Ratings", default)]
    ratings: Vec<OmdbRating>,
}

/// OMDb reports missing values as "N/A".
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && *v != "N/A")
}

fn parse_ratings(raw: OmdbResponse) -> Option<AggregatedRatings> {
    if !raw.response.eq_ignore_ascii_case("true") {
        debug!("OMDb has no entry: {}", raw.error.as_deref().unwrap_or("unknown error"));
        return None;
    }

    let rotten_tomatoes = raw
        .ratings
        .iter()
        .find(|r| r.source == "Rotten Tomatoes")
        .and_then(|r| r.value.trim_end_matches('%').parse().ok());
    let metacritic = present(raw.metascore.as_deref())
        .and_then(|m| m.parse().ok())
        .or_else(|| {
            raw.ratings
                .iter()
                .find(|r| r.source == "Metacritic")
                .and_then(|r| r.value.split('/').next())
                .and_then(|m| m.parse().ok())
        });

    Some(AggregatedRatings {
        imdb_rating: present(raw.imdb_rating.as_deref()).and_then(|r| r.parse().ok()),
        imdb_votes: present(raw.imdb_votes.as_deref()).and_then(|v| v.replace(',', "").parse().ok()),
        rotten_tomatoes,
        metacritic,
    })
}

#[derive(Clone)]
pub struct OmdbClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(config: &RatingsConfig, api_key: String) -> Self {
        Self {
            client: Arc::new(Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl RatingsApi for OmdbClient {
    async fn lookup(&self, query: &RatingsQuery) -> Result<Option<AggregatedRatings>, SourceError> {
        let mut params = vec![("apikey", self.api_key.clone())];
        match query {
            RatingsQuery::ImdbId(id) => params.push(("i", id.clone())),
            RatingsQuery::Title { title, year } => {
                params.push(("t", title.clone()));
                if let Some(year) = year {
                    params.push(("y", year.to_string()));
                }
            }
        }

        trace!("OMDb lookup {}", query.cache_key());
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                service: "omdb",
                status: status.as_u16(),
                body: error_text,
            });
        }

        let raw: OmdbResponse = response.json().await?;
        Ok(parse_ratings(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_response() {
        let raw: OmdbResponse = serde_json::from_value(json!({
            "Title": "The Matrix",
            "imdbRating": "8.7",
            "imdbVotes": "2,034,012",
            "Metascore": "73",
            "Ratings": [
                {"Source": "Internet Movie Database", "Value": "8.7/10"},
                {"Source": "Rotten Tomatoes", "Value": "83%"},
                {"Source": "Metacritic", "Value": "73/100"}
            ],
            "Response": "True"
        }))
        .unwrap();

        let ratings = parse_ratings(raw).unwrap();
        assert_eq!(ratings.imdb_rating, Some(8.7));
        assert_eq!(ratings.imdb_votes, Some(2_034_012));
        assert_eq!(ratings.rotten_tomatoes, Some(83));
        assert_eq!(ratings.metacritic, Some(73));
    }

    #[test]
    fn test_not_available_values_and_missing_entry() {
        let sparse: OmdbResponse = serde_json::from_value(json!({
            "imdbRating": "N/A",
            "Metascore": "N/A",
            "Ratings": [],
            "Response": "True"
        }))
        .unwrap();
        assert_eq!(parse_ratings(sparse).unwrap(), AggregatedRatings::default());

        let missing: OmdbResponse =
            serde_json::from_value(json!({"Response": "False", "Error": "Movie not found!"})).unwrap();
        assert!(parse_ratings(missing).is_none());
    }
}
